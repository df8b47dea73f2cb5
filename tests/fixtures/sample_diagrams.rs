// Helper functions to build editing sessions with various diagrams

#![allow(dead_code)]

use uml_graph_editor::{
    Classifier, ClassifierKind, Diagram, DiagramKind, EditorContext, ElementId, LinkKind,
    LinkProperties, Rectangle, SelectionController,
};

/// Fresh session editing one empty diagram of the given kind
pub fn session(kind: DiagramKind) -> (SelectionController, EditorContext) {
    let ctx = EditorContext::new();
    let controller = SelectionController::new(Diagram::new("test", kind), &ctx.config);
    (controller, ctx)
}

/// Add a node for a new classifier at a column of a simple grid
pub fn add(
    controller: &mut SelectionController,
    ctx: &mut EditorContext,
    kind: ClassifierKind,
    name: &str,
    column: u32,
) -> ElementId {
    let x = column as f32 * 200.0;
    controller
        .add_node(ctx, Classifier::new(kind, name), Rectangle::new(x, 0.0, 120.0, 60.0))
        .unwrap()
}

pub fn connect(
    controller: &mut SelectionController,
    ctx: &mut EditorContext,
    kind: LinkKind,
    source: ElementId,
    target: ElementId,
) -> ElementId {
    controller
        .add_link(ctx, kind, source, target, LinkProperties::default())
        .unwrap()
}

/// Classes "A" and "B" joined by an Association
pub fn two_associated_classes() -> (SelectionController, EditorContext, ElementId, ElementId, ElementId) {
    let (mut controller, mut ctx) = session(DiagramKind::Class);
    let a = add(&mut controller, &mut ctx, ClassifierKind::Class, "A", 0);
    let b = add(&mut controller, &mut ctx, ClassifierKind::Class, "B", 1);
    let link = connect(&mut controller, &mut ctx, LinkKind::Association, a, b);
    (controller, ctx, a, b, link)
}

/// Generalization A -> B plus an unconnected class C
pub fn generalization_with_spare_class(
) -> (SelectionController, EditorContext, [ElementId; 3], ElementId) {
    let (mut controller, mut ctx) = session(DiagramKind::Class);
    let a = add(&mut controller, &mut ctx, ClassifierKind::Class, "A", 0);
    let b = add(&mut controller, &mut ctx, ClassifierKind::Class, "B", 1);
    let c = add(&mut controller, &mut ctx, ClassifierKind::Class, "C", 2);
    let link = connect(&mut controller, &mut ctx, LinkKind::Generalization, a, b);
    (controller, ctx, [a, b, c], link)
}

/// Class "A" taking part in seven relationships: two associations, two
/// aggregations, two generalizations and one association class
pub fn class_with_seven_relationships() -> (SelectionController, EditorContext, ElementId, Vec<ElementId>) {
    let (mut controller, mut ctx) = session(DiagramKind::Class);
    let a = add(&mut controller, &mut ctx, ClassifierKind::Class, "A", 0);
    let partners: Vec<ElementId> = (1..=7)
        .map(|i| add(&mut controller, &mut ctx, ClassifierKind::Class, &format!("P{i}"), i))
        .collect();

    let links = vec![
        connect(&mut controller, &mut ctx, LinkKind::Association, a, partners[0]),
        connect(&mut controller, &mut ctx, LinkKind::Association, partners[1], a),
        connect(&mut controller, &mut ctx, LinkKind::Aggregation, a, partners[2]),
        connect(&mut controller, &mut ctx, LinkKind::Aggregation, partners[3], a),
        connect(&mut controller, &mut ctx, LinkKind::Generalization, a, partners[4]),
        connect(&mut controller, &mut ctx, LinkKind::Generalization, partners[5], a),
        connect(&mut controller, &mut ctx, LinkKind::AssociationClass, a, partners[6]),
    ];
    (controller, ctx, a, links)
}

/// Activity with actions Pay -> Ship and a spare action Notify
pub fn action_with_outgoing_flow() -> (SelectionController, EditorContext, [ElementId; 3]) {
    let (mut controller, mut ctx) = session(DiagramKind::Activity);
    let pay = add(&mut controller, &mut ctx, ClassifierKind::Action, "Pay", 0);
    let ship = add(&mut controller, &mut ctx, ClassifierKind::Action, "Ship", 1);
    let notify = add(&mut controller, &mut ctx, ClassifierKind::Action, "Notify", 2);
    connect(&mut controller, &mut ctx, LinkKind::ControlFlow, pay, ship);
    (controller, ctx, [pay, ship, notify])
}
