mod fixtures;

use fixtures::sample_diagrams::*;
use pretty_assertions::assert_eq;
use uml_graph_editor::{
    Classifier, ClassifierKind, Diagram, DiagramKind, Endpoint, LinkKind, Rectangle, Repository,
    SelectionController,
};

#[test]
fn test_reconnect_undo_restores_exact_link() {
    let (mut controller, mut ctx, [a, b, c], link) = generalization_with_spare_class();
    let original = controller.model().link(link).unwrap().clone();
    let relationship = original.relationship().id;

    let replacement = controller
        .reconnect(&mut ctx, link, Endpoint::Source, c)
        .unwrap();
    let new_link = controller.model().link(replacement).unwrap().clone();
    assert_ne!(new_link.relationship().id, relationship);
    assert!(ctx.repository.relationship(relationship).is_none());

    controller.undo(&mut ctx).unwrap();
    assert_eq!(controller.model().link(link), Some(&original));
    assert!(!controller.model().contains(replacement));
    assert_eq!(
        ctx.repository.relationship(relationship),
        Some(original.relationship())
    );
    assert_eq!(controller.model().links_of(a), &[link]);
    assert_eq!(controller.model().links_of(b), &[link]);
    assert!(controller.model().links_of(c).is_empty());

    controller.redo(&mut ctx).unwrap();
    assert_eq!(controller.model().link(replacement), Some(&new_link));
    assert!(!controller.model().contains(link));
    assert!(ctx.repository.relationship(new_link.relationship().id).is_some());
}

#[test]
fn test_reconnect_again_after_undo_and_redo() {
    let (mut controller, mut ctx, [a, b, c], link) = generalization_with_spare_class();
    let d = add(&mut controller, &mut ctx, ClassifierKind::Class, "D", 3);

    let first = controller
        .reconnect(&mut ctx, link, Endpoint::Target, c)
        .unwrap();
    controller.undo(&mut ctx).unwrap();
    controller.redo(&mut ctx).unwrap();

    let second = controller
        .reconnect(&mut ctx, first, Endpoint::Target, d)
        .unwrap();
    let model = controller.model();
    let reconnected = model.link(second).unwrap();
    assert_eq!(reconnected.source(), a);
    assert_eq!(reconnected.target(), d);
    assert!(model.links_of(b).is_empty());
    assert!(model.links_of(c).is_empty());

    let class_a = model.node(a).unwrap().classifier;
    let class_d = model.node(d).unwrap().classifier;
    assert_eq!(ctx.repository.superclasses_of(class_a), vec![class_d]);
}

#[test]
fn test_delete_closure_takes_links_notes_and_contents() {
    let (mut controller, mut ctx) = session(DiagramKind::UseCase);
    let system = add(&mut controller, &mut ctx, ClassifierKind::System, "Shop", 0);
    let checkout = controller
        .add_nested_node(
            &mut ctx,
            system,
            Classifier::new(ClassifierKind::UseCase, "Checkout"),
            Rectangle::new(20.0, 20.0, 80.0, 30.0),
        )
        .unwrap();
    let clerk = add(&mut controller, &mut ctx, ClassifierKind::Actor, "Clerk", 2);
    let manager = add(&mut controller, &mut ctx, ClassifierKind::Actor, "Manager", 3);
    connect(&mut controller, &mut ctx, LinkKind::UcAssociation, clerk, checkout);
    connect(&mut controller, &mut ctx, LinkKind::UcAssociation, manager, checkout);
    for text in ["main flow", "needs login"] {
        controller
            .add_note(&mut ctx, text, Rectangle::new(0.0, 300.0, 60.0, 30.0), Some(checkout))
            .unwrap();
    }
    let free_note = controller
        .add_note(&mut ctx, "todo", Rectangle::new(0.0, 400.0, 60.0, 30.0), None)
        .unwrap();

    let before = controller.model().snapshot();
    let repository_before = ctx.repository.clone();

    // 1 node + 2 links + 2 notes, plus the system that holds it
    controller.add_element_to_selection(system).unwrap();
    assert_eq!(controller.delete_selected(&mut ctx).unwrap(), 6);
    assert_eq!(controller.model().top_level_ids().len(), 3);
    assert!(controller.model().contains(free_note));
    assert_eq!(ctx.repository.relationship_count(), 0);
    assert!(controller.model().check_integrity().is_consistent());

    controller.undo(&mut ctx).unwrap();
    assert_eq!(controller.model().snapshot(), before);
    assert_eq!(ctx.repository, repository_before);

    controller.redo(&mut ctx).unwrap();
    assert_eq!(controller.model().top_level_ids().len(), 3);
}

#[test]
fn test_pasted_nodes_share_classifiers() {
    let (mut controller, mut ctx, a, _, _) = two_associated_classes();
    let classifier = controller.model().node(a).unwrap().classifier;

    controller.add_element_to_selection(a).unwrap();
    controller.copy_selected(&mut ctx).unwrap();
    let pasted = controller.paste_clipboard(&mut ctx).unwrap();
    assert_eq!(pasted.len(), 1);

    let copy = controller.model().node(pasted[0]).unwrap();
    assert_eq!(copy.classifier, classifier);
    assert_eq!(ctx.repository.usage_count(classifier), 2);
    assert_eq!(controller.model().nodes_for_classifier(classifier).len(), 2);

    controller
        .rename_classifier(&mut ctx, classifier, "Order")
        .unwrap();
    assert_eq!(ctx.repository.classifier(classifier).unwrap().name, "Order");
}

#[test]
fn test_each_paste_is_its_own_undo_step() {
    let (mut controller, mut ctx, a, _, _) = two_associated_classes();
    let history = controller.undo_manager().undo_len();
    let origin = controller.model().node(a).unwrap().bounds;

    controller.add_element_to_selection(a).unwrap();
    controller.copy_selected(&mut ctx).unwrap();
    let mut copies = Vec::new();
    for _ in 0..3 {
        copies.extend(controller.paste_clipboard(&mut ctx).unwrap());
    }
    assert_eq!(controller.undo_manager().undo_len(), history + 3);

    let offsets: Vec<f32> = copies
        .iter()
        .map(|id| controller.model().node(*id).unwrap().bounds.x - origin.x)
        .collect();
    assert_eq!(offsets, vec![20.0, 40.0, 60.0]);

    for expected in [2, 1, 0] {
        controller.undo(&mut ctx).unwrap();
        let remaining = copies
            .iter()
            .filter(|id| controller.model().contains(**id))
            .count();
        assert_eq!(remaining, expected);
    }
}

#[test]
fn test_undo_all_then_redo_all() {
    let (mut controller, mut ctx, a, links) = class_with_seven_relationships();
    controller
        .add_note(&mut ctx, "core", Rectangle::new(0.0, 200.0, 60.0, 30.0), Some(a))
        .unwrap();
    controller.add_element_to_selection(a).unwrap();
    controller.copy_selected(&mut ctx).unwrap();
    controller.paste_clipboard(&mut ctx).unwrap();
    controller.clear_selected();
    controller.add_element_to_selection(links[0]).unwrap();
    controller.delete_selected(&mut ctx).unwrap();

    let final_model = controller.model().snapshot();
    let final_repository = ctx.repository.clone();

    let mut steps = 0;
    while controller.can_undo() {
        controller.undo(&mut ctx).unwrap();
        steps += 1;
    }
    assert!(controller.model().is_empty());
    assert_eq!(ctx.repository.classifier_count(), 0);
    assert_eq!(ctx.repository.relationship_count(), 0);

    while controller.can_redo() {
        controller.redo(&mut ctx).unwrap();
        steps -= 1;
    }
    assert_eq!(steps, 0);
    assert_eq!(controller.model().snapshot(), final_model);
    assert_eq!(ctx.repository, final_repository);
}

#[test]
fn test_classifier_shared_across_diagrams_survives_undo() {
    let (mut first, mut ctx) = session(DiagramKind::Class);
    let mut second =
        SelectionController::new(Diagram::new("second", DiagramKind::Class), &ctx.config);

    let a = add(&mut first, &mut ctx, ClassifierKind::Class, "A", 0);
    let classifier = first.model().node(a).unwrap().classifier;
    let view = second
        .add_node_for(&mut ctx, classifier, Rectangle::new(0.0, 0.0, 120.0, 60.0))
        .unwrap();
    assert_eq!(ctx.repository.usage_count(classifier), 2);

    // Undoing the add in the first diagram keeps the classifier for the second
    first.undo(&mut ctx).unwrap();
    assert!(!first.model().contains(a));
    assert_eq!(ctx.repository.usage_count(classifier), 1);
    assert!(ctx.repository.classifier(classifier).is_some());
    assert!(second.model().check_integrity().is_consistent());

    first.redo(&mut ctx).unwrap();
    assert_eq!(ctx.repository.usage_count(classifier), 2);

    // Deleting the second view last removes the classifier; re-adding a view
    // elsewhere before redoing that delete keeps it alive
    second.add_element_to_selection(view).unwrap();
    second.delete_selected(&mut ctx).unwrap();
    first.add_element_to_selection(a).unwrap();
    first.delete_selected(&mut ctx).unwrap();
    assert!(ctx.repository.classifier(classifier).is_none());

    second.undo(&mut ctx).unwrap();
    assert_eq!(ctx.repository.usage_count(classifier), 1);
    first.undo(&mut ctx).unwrap();
    assert_eq!(ctx.repository.usage_count(classifier), 2);

    first.redo(&mut ctx).unwrap();
    assert_eq!(ctx.repository.usage_count(classifier), 1);
    assert!(ctx.repository.classifier(classifier).is_some());
    assert!(second.model().contains(view));
}
