use pretty_assertions::assert_eq;
use proptest::prelude::*;
use proptest::sample::select;
use uml_graph_editor::{
    CentralRepository, Classifier, ClassifierKind, Diagram, DiagramKind, Edit, Endpoint, Link,
    LinkKind, LinkProperties, Node, ReconnectLinkEdit, Rectangle, Repository,
};

const KINDS: [ClassifierKind; 15] = [
    ClassifierKind::Class,
    ClassifierKind::Interface,
    ClassifierKind::ConceptualClass,
    ClassifierKind::Actor,
    ClassifierKind::UseCase,
    ClassifierKind::System,
    ClassifierKind::Action,
    ClassifierKind::Initial,
    ClassifierKind::ActivityFinal,
    ClassifierKind::FlowFinal,
    ClassifierKind::Decision,
    ClassifierKind::Merge,
    ClassifierKind::Fork,
    ClassifierKind::Join,
    ClassifierKind::Activity,
];

const CLASS_LINKS: [LinkKind; 6] = [
    LinkKind::Association,
    LinkKind::Aggregation,
    LinkKind::AssociationClass,
    LinkKind::Generalization,
    LinkKind::Dependency,
    LinkKind::Realization,
];

fn node(kind: ClassifierKind) -> Node {
    Node::new(&Classifier::new(kind, ""), Rectangle::new(0.0, 0.0, 100.0, 50.0))
}

/// The endpoint rules written out kind by kind
fn table_allows(
    kind: LinkKind,
    source: ClassifierKind,
    target: ClassifierKind,
    same_node: bool,
) -> bool {
    use ClassifierKind::*;

    let classifier = |k: ClassifierKind| matches!(k, Class | Interface | ConceptualClass);
    let flow_node = |k: ClassifierKind| {
        matches!(
            k,
            Action | Initial | ActivityFinal | FlowFinal | Decision | Merge | Fork | Join
        )
    };

    match kind {
        LinkKind::Association
        | LinkKind::Aggregation
        | LinkKind::AssociationClass
        | LinkKind::Dependency => classifier(source) && classifier(target),
        LinkKind::Generalization => classifier(source) && source == target && !same_node,
        LinkKind::Realization => source == Class && target == Interface,
        LinkKind::UcAssociation => source == Actor && target == UseCase,
        LinkKind::UcInclude | LinkKind::UcExtend => {
            source == UseCase && target == UseCase && !same_node
        }
        LinkKind::UcGeneralization => {
            matches!(source, Actor | UseCase) && source == target && !same_node
        }
        LinkKind::ControlFlow => {
            flow_node(source)
                && flow_node(target)
                && !matches!(source, ActivityFinal | FlowFinal)
                && target != Initial
                && !same_node
        }
    }
}

fn endpoint() -> impl Strategy<Value = Endpoint> {
    prop_oneof![Just(Endpoint::Source), Just(Endpoint::Target)]
}

proptest! {
    #[test]
    fn can_reconnect_is_pure_and_follows_rule_table(
        kind in select(LinkKind::ALL.to_vec()),
        source_kind in select(KINDS.to_vec()),
        target_kind in select(KINDS.to_vec()),
        candidate_kind in select(KINDS.to_vec()),
        end in endpoint(),
        onto_other_end in any::<bool>(),
    ) {
        let source = node(source_kind);
        let target = node(target_kind);
        let link = Link::connect(kind, &source, &target, LinkProperties::default());
        let before = link.clone();

        let candidate = if onto_other_end {
            match end {
                Endpoint::Source => target.clone(),
                Endpoint::Target => source.clone(),
            }
        } else {
            node(candidate_kind)
        };

        let first = link.can_reconnect(end, &candidate);
        let second = link.can_reconnect(end, &candidate);
        prop_assert_eq!(first, second);
        prop_assert_eq!(&link, &before);

        let expected = match end {
            Endpoint::Source => table_allows(kind, candidate.kind, target_kind, onto_other_end),
            Endpoint::Target => table_allows(kind, source_kind, candidate.kind, onto_other_end),
        };
        prop_assert_eq!(first, expected);
    }

    #[test]
    fn reconnect_edit_is_all_or_nothing(
        kind in select(CLASS_LINKS.to_vec()),
        kinds in proptest::collection::vec(
            prop_oneof![Just(ClassifierKind::Class), Just(ClassifierKind::Interface)],
            3,
        ),
        end in endpoint(),
    ) {
        let mut diagram = Diagram::new("props", DiagramKind::Class);
        let mut repo = CentralRepository::new();
        let mut ids = Vec::new();
        for classifier_kind in &kinds {
            let classifier = Classifier::new(*classifier_kind, "");
            let node = Node::new(&classifier, Rectangle::new(0.0, 0.0, 100.0, 50.0));
            repo.add_classifier(classifier).unwrap();
            repo.retain(node.classifier).unwrap();
            ids.push(node.id);
            diagram.add_graphical_element(node).unwrap();
        }

        let link = Link::connect(
            kind,
            diagram.node(ids[0]).unwrap(),
            diagram.node(ids[1]).unwrap(),
            LinkProperties::default(),
        );
        let link_id = link.id;
        repo.add_relationship(link.relationship().clone());
        diagram.add_graphical_element(link).unwrap();

        let snapshot = diagram.snapshot();
        let registry = repo.clone();
        let allowed = diagram.link(link_id).unwrap().can_reconnect(end, diagram.node(ids[2]).unwrap());

        match ReconnectLinkEdit::perform(&mut diagram, &mut repo, link_id, end, ids[2]) {
            Ok(edit) => {
                prop_assert!(allowed);
                let edit = Edit::ReconnectLink(edit);
                edit.undo(&mut diagram, &mut repo).unwrap();
                prop_assert_eq!(diagram.snapshot(), snapshot);
                prop_assert_eq!(&repo, &registry);
            }
            Err(_) => {
                prop_assert!(!allowed);
                prop_assert_eq!(diagram.snapshot(), snapshot);
                prop_assert_eq!(&repo, &registry);
            }
        }
    }
}

#[test]
fn reconnect_onto_same_node_is_refused() {
    let source = node(ClassifierKind::Class);
    let target = node(ClassifierKind::Interface);
    let link = Link::connect(LinkKind::Realization, &source, &target, LinkProperties::default());

    assert!(!link.can_reconnect(Endpoint::Target, &source));
    assert_eq!(
        link.check_reconnect(Endpoint::Target, &source).unwrap_err().to_string(),
        "Realization cannot connect these elements: the target must be an Interface"
    );
}
