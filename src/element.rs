use crate::{
    Classifier, ClassifierId, ClassifierKind, EditResult, ElementId, LinkKind, LinkProperties,
    Point, Rectangle, Relationship,
};
use serde::{Deserialize, Serialize};

/// One end of a link
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Source,
    Target,
}

impl Endpoint {
    pub fn opposite(self) -> Self {
        match self {
            Endpoint::Source => Endpoint::Target,
            Endpoint::Target => Endpoint::Source,
        }
    }
}

/// A graphical element wrapping exactly one classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: ElementId,

    /// Shared domain entity (owned by the repository)
    pub classifier: ClassifierId,

    /// Kind of the wrapped classifier, fixed for the node's lifetime
    pub kind: ClassifierKind,

    /// Position and size on the canvas (pixels)
    pub bounds: Rectangle,

    /// Nested elements, in drawing order (containers only)
    pub contents: Vec<ElementId>,
}

impl Node {
    /// Create a new node for a classifier
    pub fn new(classifier: &Classifier, bounds: Rectangle) -> Self {
        Self {
            id: ElementId::new(),
            classifier: classifier.id,
            kind: classifier.kind,
            bounds,
            contents: Vec::new(),
        }
    }

    /// Graphical copy sharing this node's classifier.
    ///
    /// The copy gets a fresh identity and no nested elements; nested content
    /// is cloned separately by the caller.
    pub fn duplicate(&self, dx: f32, dy: f32) -> Self {
        Self {
            id: ElementId::new(),
            classifier: self.classifier,
            kind: self.kind,
            bounds: self.bounds.translated(dx, dy),
            contents: Vec::new(),
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }
}

/// A binary typed relationship between two nodes.
///
/// Endpoints never change after construction; reconnection builds a new
/// link through [`Link::create_with_new_endpoints`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub id: ElementId,
    source: ElementId,
    target: ElementId,
    source_kind: ClassifierKind,
    target_kind: ClassifierKind,
    relationship: Relationship,
}

impl Link {
    /// Connect two nodes with a fresh relationship of the given kind.
    ///
    /// No rule checking happens here; see [`crate::Diagram::check_new_link`].
    pub fn connect(kind: LinkKind, source: &Node, target: &Node, properties: LinkProperties) -> Self {
        let relationship = Relationship::new(kind, source.classifier, target.classifier, properties);
        Self::over(relationship, source, target)
    }

    fn over(relationship: Relationship, source: &Node, target: &Node) -> Self {
        Self {
            id: ElementId::new(),
            source: source.id,
            target: target.id,
            source_kind: source.kind,
            target_kind: target.kind,
            relationship,
        }
    }

    pub fn kind(&self) -> LinkKind {
        self.relationship.kind
    }

    pub fn source(&self) -> ElementId {
        self.source
    }

    pub fn target(&self) -> ElementId {
        self.target
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> ElementId {
        match endpoint {
            Endpoint::Source => self.source,
            Endpoint::Target => self.target,
        }
    }

    pub fn endpoint_kind(&self, endpoint: Endpoint) -> ClassifierKind {
        match endpoint {
            Endpoint::Source => self.source_kind,
            Endpoint::Target => self.target_kind,
        }
    }

    pub fn relationship(&self) -> &Relationship {
        &self.relationship
    }

    pub fn properties(&self) -> &LinkProperties {
        &self.relationship.properties
    }

    /// Check if this link touches a given node
    pub fn involves(&self, node: ElementId) -> bool {
        self.source == node || self.target == node
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Validate substituting `candidate` at one end, without touching anything
    pub fn check_reconnect(&self, endpoint: Endpoint, candidate: &Node) -> EditResult<()> {
        let (source_kind, target_kind, same_node) = match endpoint {
            Endpoint::Source => (candidate.kind, self.target_kind, candidate.id == self.target),
            Endpoint::Target => (self.source_kind, candidate.kind, candidate.id == self.source),
        };
        self.kind().check_endpoints(source_kind, target_kind, same_node)
    }

    /// Whether `candidate` may replace the node at `endpoint`. Pure.
    pub fn can_reconnect(&self, endpoint: Endpoint, candidate: &Node) -> bool {
        self.check_reconnect(endpoint, candidate).is_ok()
    }

    /// Build the replacement link with `candidate` at `endpoint`.
    ///
    /// Returns the rule violation and leaves `self` untouched when the
    /// substitution is illegal. `other` must be the node currently at the
    /// opposite end.
    pub fn reconnect(&self, endpoint: Endpoint, candidate: &Node, other: &Node) -> EditResult<Link> {
        self.check_reconnect(endpoint, candidate)?;
        Ok(match endpoint {
            Endpoint::Source => self.create_with_new_endpoints(candidate, other),
            Endpoint::Target => self.create_with_new_endpoints(other, candidate),
        })
    }

    pub fn reconnect_source(&self, candidate: &Node, target: &Node) -> EditResult<Link> {
        self.reconnect(Endpoint::Source, candidate, target)
    }

    pub fn reconnect_target(&self, source: &Node, candidate: &Node) -> EditResult<Link> {
        self.reconnect(Endpoint::Target, candidate, source)
    }

    /// New link (and new relationship) over the given nodes, keeping every
    /// decorative property of this one.
    pub fn create_with_new_endpoints(&self, source: &Node, target: &Node) -> Link {
        let relationship = self
            .relationship
            .with_endpoints(source.classifier, target.classifier);
        Self::over(relationship, source, target)
    }

    /// Anchor points on the outline of the source and target nodes
    pub fn anchors(source_bounds: &Rectangle, target_bounds: &Rectangle) -> (Point, Point) {
        let source_anchor = source_bounds.boundary_point_towards(target_bounds.center());
        let target_anchor = target_bounds.boundary_point_towards(source_bounds.center());
        (source_anchor, target_anchor)
    }

    /// Which endpoint anchor (if any) lies within `tolerance` of `point`.
    ///
    /// When both anchors qualify the closer one wins, the source on a tie.
    pub fn endpoint_at_point(
        point: Point,
        source_bounds: &Rectangle,
        target_bounds: &Rectangle,
        tolerance: f32,
    ) -> Option<Endpoint> {
        let (source_anchor, target_anchor) = Self::anchors(source_bounds, target_bounds);
        let to_source = point.distance_to(source_anchor);
        let to_target = point.distance_to(target_anchor);

        match (to_source <= tolerance, to_target <= tolerance) {
            (true, true) if to_target < to_source => Some(Endpoint::Target),
            (true, _) => Some(Endpoint::Source),
            (false, true) => Some(Endpoint::Target),
            (false, false) => None,
        }
    }
}

/// Free-text annotation, optionally anchored to a node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: ElementId,
    pub text: String,
    pub bounds: Rectangle,
    pub anchor: Option<ElementId>,
}

impl Note {
    pub fn new(text: impl Into<String>, bounds: Rectangle, anchor: Option<ElementId>) -> Self {
        Self {
            id: ElementId::new(),
            text: text.into(),
            bounds,
            anchor,
        }
    }
}

/// Anything that can be placed on a diagram
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GraphicalElement {
    Node(Node),
    Link(Link),
    Note(Note),
}

impl GraphicalElement {
    pub fn id(&self) -> ElementId {
        match self {
            GraphicalElement::Node(node) => node.id,
            GraphicalElement::Link(link) => link.id,
            GraphicalElement::Note(note) => note.id,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            GraphicalElement::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            GraphicalElement::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_note(&self) -> Option<&Note> {
        match self {
            GraphicalElement::Note(note) => Some(note),
            _ => None,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, GraphicalElement::Link(_))
    }

    /// Bounds of nodes and notes; links have no own geometry
    pub fn bounds(&self) -> Option<Rectangle> {
        match self {
            GraphicalElement::Node(node) => Some(node.bounds),
            GraphicalElement::Note(note) => Some(note.bounds),
            GraphicalElement::Link(_) => None,
        }
    }

    pub(crate) fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            GraphicalElement::Node(node) => node.bounds = node.bounds.translated(dx, dy),
            GraphicalElement::Note(note) => note.bounds = note.bounds.translated(dx, dy),
            GraphicalElement::Link(_) => {}
        }
    }
}

impl From<Node> for GraphicalElement {
    fn from(node: Node) -> Self {
        GraphicalElement::Node(node)
    }
}

impl From<Link> for GraphicalElement {
    fn from(link: Link) -> Self {
        GraphicalElement::Link(link)
    }
}

impl From<Note> for GraphicalElement {
    fn from(note: Note) -> Self {
        GraphicalElement::Note(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, EditError, Role};
    use assert_matches::assert_matches;

    fn node(kind: ClassifierKind, name: &str, x: f32) -> Node {
        Node::new(&Classifier::new(kind, name), Rectangle::new(x, 0.0, 100.0, 50.0))
    }

    #[test]
    fn test_node_duplicate_shares_classifier() {
        let original = node(ClassifierKind::Class, "A", 0.0);
        let copy = original.duplicate(20.0, 20.0);

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.classifier, original.classifier);
        assert_eq!(copy.bounds, Rectangle::new(20.0, 20.0, 100.0, 50.0));
    }

    #[test]
    fn test_reconnect_builds_new_link_with_same_properties() {
        let a = node(ClassifierKind::Class, "A", 0.0);
        let b = node(ClassifierKind::Class, "B", 200.0);
        let c = node(ClassifierKind::Class, "C", 400.0);

        let mut props = LinkProperties::named("uses");
        props.direction = Direction::SourceToTarget;
        props.target_role = Role::new("b", "1..*");
        let link = Link::connect(LinkKind::Association, &a, &b, props.clone());

        let moved = link.reconnect_source(&c, &b).unwrap();
        assert_ne!(moved.id, link.id);
        assert_ne!(moved.relationship().id, link.relationship().id);
        assert_eq!(moved.source(), c.id);
        assert_eq!(moved.target(), b.id);
        assert_eq!(moved.relationship().source, c.classifier);
        assert_eq!(moved.properties(), &props);

        // The original is untouched
        assert_eq!(link.source(), a.id);
        assert_eq!(link.relationship().source, a.classifier);
    }

    #[test]
    fn test_reconnect_rejects_incompatible_node() {
        let class = node(ClassifierKind::Class, "A", 0.0);
        let iface = node(ClassifierKind::Interface, "I1", 200.0);
        let other_class = node(ClassifierKind::Class, "B", 400.0);
        let link = Link::connect(LinkKind::Realization, &class, &iface, LinkProperties::default());

        assert!(!link.can_reconnect(Endpoint::Target, &other_class));
        assert_matches!(
            link.reconnect_target(&class, &other_class),
            Err(EditError::IncompatibleEndpoint { .. })
        );
    }

    #[test]
    fn test_endpoint_hit_testing() {
        let source = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let target = Rectangle::new(300.0, 0.0, 100.0, 100.0);

        assert_eq!(
            Link::endpoint_at_point(Point::new(102.0, 50.0), &source, &target, 8.0),
            Some(Endpoint::Source)
        );
        assert_eq!(
            Link::endpoint_at_point(Point::new(297.0, 52.0), &source, &target, 8.0),
            Some(Endpoint::Target)
        );
        assert_eq!(
            Link::endpoint_at_point(Point::new(200.0, 50.0), &source, &target, 8.0),
            None
        );
    }
}
