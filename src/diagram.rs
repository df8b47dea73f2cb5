use crate::compatibility::check_flow_limits;
use crate::{
    ClassifierId, DiagramKind, EditError, EditResult, ElementId, Endpoint, GraphicalElement, Link,
    LinkKind, ModelChange, ModelEvent, Node, Note, Point, Rectangle,
};
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Where an element sits in the diagram's structure.
///
/// Recorded on removal so that undo puts the element back exactly where it
/// was.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Placement {
    /// Top-level element at the given ordering slot
    TopLevel { slot: u64 },

    /// Element nested in a container at the given index of its contents
    Nested { container: ElementId, index: usize },
}

/// The graphical model of one diagram.
///
/// Every element (top-level or nested) lives in an arena keyed by id. The
/// top-level drawing order is a slot map, nested elements are listed in
/// their container's `contents`, and an incidence index maps each node to
/// the links touching it.
#[derive(Debug, Clone)]
pub struct Diagram {
    name: String,
    kind: DiagramKind,

    /// All elements indexed by ID
    elements: HashMap<ElementId, GraphicalElement>,

    /// Top-level drawing order
    order: BTreeMap<u64, ElementId>,
    slots: HashMap<ElementId, u64>,
    next_slot: u64,

    /// Nested element -> its container
    parents: HashMap<ElementId, ElementId>,

    /// Node -> links touching it
    incident: HashMap<ElementId, Vec<ElementId>>,

    /// Node -> notes anchored to it
    anchored: HashMap<ElementId, Vec<ElementId>>,

    /// Change notifications not yet drained by observers
    events: Vec<ModelEvent>,
}

impl Diagram {
    /// Create a new empty diagram
    pub fn new(name: impl Into<String>, kind: DiagramKind) -> Self {
        Self {
            name: name.into(),
            kind,
            elements: HashMap::new(),
            order: BTreeMap::new(),
            slots: HashMap::new(),
            next_slot: 0,
            parents: HashMap::new(),
            incident: HashMap::new(),
            anchored: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    // ========== Structural Mutation ==========

    /// Append an element at the top level
    pub fn add_graphical_element(
        &mut self,
        element: impl Into<GraphicalElement>,
    ) -> EditResult<Placement> {
        let placement = Placement::TopLevel {
            slot: self.next_slot,
        };
        self.insert_element(placement, element.into())?;
        Ok(placement)
    }

    /// Append a node to the end of a container's contents
    pub fn add_nested_element(
        &mut self,
        container: ElementId,
        element: impl Into<GraphicalElement>,
    ) -> EditResult<Placement> {
        let index = self.require_node(container)?.contents.len();
        let placement = Placement::Nested { container, index };
        self.insert_element(placement, element.into())?;
        Ok(placement)
    }

    /// Insert an element at an explicit placement.
    ///
    /// Nodes must arrive without nested contents; nested elements are
    /// inserted one by one after their container.
    pub fn insert_element(
        &mut self,
        placement: Placement,
        element: GraphicalElement,
    ) -> EditResult<()> {
        self.validate_insert(placement, &element)?;

        let id = element.id();
        let container = match placement {
            Placement::TopLevel { slot } => {
                self.order.insert(slot, id);
                self.slots.insert(id, slot);
                self.next_slot = self.next_slot.max(slot + 1);
                None
            }
            Placement::Nested { container, index } => {
                if let Some(GraphicalElement::Node(parent)) = self.elements.get_mut(&container) {
                    parent.contents.insert(index, id);
                }
                self.parents.insert(id, container);
                Some(container)
            }
        };

        match &element {
            GraphicalElement::Link(link) => {
                self.incident.entry(link.source()).or_default().push(id);
                if !link.is_self_loop() {
                    self.incident.entry(link.target()).or_default().push(id);
                }
            }
            GraphicalElement::Note(note) => {
                if let Some(anchor) = note.anchor {
                    self.anchored.entry(anchor).or_default().push(id);
                }
            }
            GraphicalElement::Node(_) => {}
        }

        self.elements.insert(id, element);
        trace!(element:% = id; "element inserted");
        self.log_event(ModelChange::ElementAdded { id, container });

        Ok(())
    }

    fn validate_insert(&self, placement: Placement, element: &GraphicalElement) -> EditResult<()> {
        let id = element.id();
        if self.elements.contains_key(&id) {
            return Err(EditError::DuplicateElement(id));
        }

        match element {
            GraphicalElement::Node(node) => {
                if !self.kind.allows_node(node.kind) {
                    return Err(EditError::NodeKindNotAllowed {
                        kind: node.kind,
                        diagram: self.kind,
                    });
                }
                if !node.contents.is_empty() {
                    return Err(EditError::InvalidContainment {
                        container: id,
                        reason: "nested elements must be inserted individually",
                    });
                }
            }
            GraphicalElement::Link(link) => {
                if !link.kind().allowed_in(self.kind) {
                    return Err(EditError::LinkKindNotAllowed {
                        kind: link.kind(),
                        diagram: self.kind,
                    });
                }
                self.require_node(link.source())?;
                self.require_node(link.target())?;
            }
            GraphicalElement::Note(note) => {
                if let Some(anchor) = note.anchor {
                    self.require_node(anchor)?;
                }
            }
        }

        match placement {
            Placement::TopLevel { slot } => {
                if self.order.contains_key(&slot) {
                    return Err(EditError::PositionTaken(slot));
                }
            }
            Placement::Nested { container, index } => {
                let parent = self.require_node(container)?;
                let child = element.as_node().ok_or(EditError::InvalidContainment {
                    container,
                    reason: "only nodes can be nested",
                })?;
                if child.id == container {
                    return Err(EditError::InvalidContainment {
                        container,
                        reason: "a container cannot contain itself",
                    });
                }
                if !parent.kind.can_contain(child.kind) {
                    return Err(EditError::InvalidContainment {
                        container,
                        reason: "this container does not accept that kind of element",
                    });
                }
                if index > parent.contents.len() {
                    return Err(EditError::InvalidContainment {
                        container,
                        reason: "position is out of range",
                    });
                }
            }
        }

        Ok(())
    }

    /// Remove a single element that nothing else depends on.
    ///
    /// Fails with [`EditError::WouldDangle`] while links, anchored notes or
    /// nested elements still refer to it; computing the full delete closure
    /// is the controller's job.
    pub fn remove_graphical_element(
        &mut self,
        id: ElementId,
    ) -> EditResult<(Placement, GraphicalElement)> {
        let element = self.elements.get(&id).ok_or(EditError::UnknownElement(id))?;

        let has_links = self.incident.get(&id).is_some_and(|links| !links.is_empty());
        let has_notes = self.anchored.get(&id).is_some_and(|notes| !notes.is_empty());
        let has_contents = element.as_node().is_some_and(|node| !node.contents.is_empty());
        if has_links || has_notes || has_contents {
            return Err(EditError::WouldDangle(id));
        }

        let placement = match self.parents.remove(&id) {
            Some(container) => {
                let mut index = 0;
                if let Some(GraphicalElement::Node(parent)) = self.elements.get_mut(&container) {
                    index = parent.contents.iter().position(|c| *c == id).unwrap_or(0);
                    parent.contents.retain(|c| *c != id);
                }
                Placement::Nested { container, index }
            }
            None => {
                let slot = self.slots.remove(&id).unwrap_or_default();
                self.order.remove(&slot);
                Placement::TopLevel { slot }
            }
        };

        let element = match self.elements.remove(&id) {
            Some(element) => element,
            None => return Err(EditError::UnknownElement(id)),
        };

        match &element {
            GraphicalElement::Link(link) => {
                for end in [link.source(), link.target()] {
                    Self::unindex(&mut self.incident, end, id);
                }
            }
            GraphicalElement::Note(note) => {
                if let Some(anchor) = note.anchor {
                    Self::unindex(&mut self.anchored, anchor, id);
                }
            }
            GraphicalElement::Node(_) => {}
        }
        self.incident.remove(&id);
        self.anchored.remove(&id);

        trace!(element:% = id; "element removed");
        let container = match placement {
            Placement::Nested { container, .. } => Some(container),
            Placement::TopLevel { .. } => None,
        };
        self.log_event(ModelChange::ElementRemoved { id, container });

        Ok((placement, element))
    }

    fn unindex(index: &mut HashMap<ElementId, Vec<ElementId>>, key: ElementId, id: ElementId) {
        if let Some(entries) = index.get_mut(&key) {
            entries.retain(|e| *e != id);
            if entries.is_empty() {
                index.remove(&key);
            }
        }
    }

    /// Move a node or note (with everything nested in it) by a delta
    pub fn move_graphical_element(&mut self, id: ElementId, dx: f32, dy: f32) -> EditResult<()> {
        if !self.elements.contains_key(&id) {
            return Err(EditError::UnknownElement(id));
        }

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(element) = self.elements.get_mut(&current) {
                element.translate(dx, dy);
                if let GraphicalElement::Node(node) = element {
                    pending.extend(node.contents.iter().copied());
                }
            }
        }

        self.log_event(ModelChange::ElementMoved { id, dx, dy });
        Ok(())
    }

    /// Put one node or note at exact bounds; nested elements stay where they are
    pub fn set_bounds(&mut self, id: ElementId, bounds: Rectangle) -> EditResult<()> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(EditError::UnknownElement(id))?;
        let current = match element {
            GraphicalElement::Node(node) => &mut node.bounds,
            GraphicalElement::Note(note) => &mut note.bounds,
            GraphicalElement::Link(_) => return Err(EditError::NotANode(id)),
        };
        let (dx, dy) = (bounds.x - current.x, bounds.y - current.y);
        *current = bounds;

        self.log_event(ModelChange::ElementMoved { id, dx, dy });
        Ok(())
    }

    // ========== Queries ==========

    /// Top-level elements in drawing order
    pub fn graphical_elements(&self) -> impl Iterator<Item = &GraphicalElement> + '_ {
        self.order.values().filter_map(|id| self.elements.get(id))
    }

    /// Slot the next top-level element will be appended at
    pub fn next_slot(&self) -> u64 {
        self.next_slot
    }

    pub fn top_level_ids(&self) -> Vec<ElementId> {
        self.order.values().copied().collect()
    }

    /// Every element, nested ones included, in no particular order
    pub fn all_elements(&self) -> impl Iterator<Item = &GraphicalElement> + '_ {
        self.elements.values()
    }

    /// Number of top-level elements
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of elements including nested ones
    pub fn total_len(&self) -> usize {
        self.elements.len()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn element(&self, id: ElementId) -> Option<&GraphicalElement> {
        self.elements.get(&id)
    }

    pub fn node(&self, id: ElementId) -> Option<&Node> {
        self.elements.get(&id).and_then(GraphicalElement::as_node)
    }

    pub fn link(&self, id: ElementId) -> Option<&Link> {
        self.elements.get(&id).and_then(GraphicalElement::as_link)
    }

    pub fn note(&self, id: ElementId) -> Option<&Note> {
        self.elements.get(&id).and_then(GraphicalElement::as_note)
    }

    pub fn require_node(&self, id: ElementId) -> EditResult<&Node> {
        match self.elements.get(&id) {
            Some(GraphicalElement::Node(node)) => Ok(node),
            Some(_) => Err(EditError::NotANode(id)),
            None => Err(EditError::UnknownElement(id)),
        }
    }

    pub fn require_link(&self, id: ElementId) -> EditResult<&Link> {
        match self.elements.get(&id) {
            Some(GraphicalElement::Link(link)) => Ok(link),
            Some(_) => Err(EditError::NotALink(id)),
            None => Err(EditError::UnknownElement(id)),
        }
    }

    /// Top-level links in drawing order
    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.graphical_elements().filter_map(GraphicalElement::as_link)
    }

    /// All nodes, nested ones included
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.elements.values().filter_map(GraphicalElement::as_node)
    }

    /// Nodes wrapping the given classifier
    pub fn nodes_for_classifier(&self, classifier: ClassifierId) -> Vec<ElementId> {
        self.nodes()
            .filter(|node| node.classifier == classifier)
            .map(|node| node.id)
            .collect()
    }

    /// Links touching a node, in the order they were attached
    pub fn links_of(&self, node: ElementId) -> &[ElementId] {
        self.incident.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Notes anchored to a node
    pub fn notes_anchored_to(&self, id: ElementId) -> &[ElementId] {
        self.anchored.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn container_of(&self, id: ElementId) -> Option<ElementId> {
        self.parents.get(&id).copied()
    }

    pub fn contents(&self, id: ElementId) -> &[ElementId] {
        self.node(id).map(|node| node.contents.as_slice()).unwrap_or(&[])
    }

    pub fn placement_of(&self, id: ElementId) -> Option<Placement> {
        if let Some(container) = self.parents.get(&id) {
            let index = self.contents(*container).iter().position(|c| *c == id)?;
            return Some(Placement::Nested {
                container: *container,
                index,
            });
        }
        self.slots.get(&id).map(|slot| Placement::TopLevel { slot: *slot })
    }

    /// The element and everything nested in it, children before parents
    pub fn subtree_post_order(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect_post_order(id, &mut out);
        out
    }

    fn collect_post_order(&self, id: ElementId, out: &mut Vec<ElementId>) {
        for child in self.contents(id) {
            self.collect_post_order(*child, out);
        }
        out.push(id);
    }

    /// Whether `ancestor` contains `id`, directly or transitively
    pub fn is_nested_within(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut current = self.parents.get(&id);
        while let Some(parent) = current {
            if *parent == ancestor {
                return true;
            }
            current = self.parents.get(parent);
        }
        false
    }

    // ========== Hit Testing ==========

    /// Innermost node under a point, topmost first
    pub fn node_at(&self, point: Point) -> Option<ElementId> {
        self.order
            .values()
            .rev()
            .find_map(|id| self.innermost_node_at(*id, point))
    }

    fn innermost_node_at(&self, id: ElementId, point: Point) -> Option<ElementId> {
        let node = self.node(id)?;
        if !node.bounds.contains_point(point) {
            return None;
        }
        node.contents
            .iter()
            .rev()
            .find_map(|child| self.innermost_node_at(*child, point))
            .or(Some(id))
    }

    /// Which end of a link, if any, lies within `tolerance` of a point
    pub fn endpoint_at_point(
        &self,
        link: ElementId,
        point: Point,
        tolerance: f32,
    ) -> EditResult<Option<Endpoint>> {
        let link = self.require_link(link)?;
        let source = self.require_node(link.source())?;
        let target = self.require_node(link.target())?;
        Ok(Link::endpoint_at_point(
            point,
            &source.bounds,
            &target.bounds,
            tolerance,
        ))
    }

    // ========== Link Rules ==========

    fn count_flows(&self, node: ElementId, endpoint: Endpoint, excluding: Option<ElementId>) -> usize {
        self.links_of(node)
            .iter()
            .filter(|id| Some(**id) != excluding)
            .filter_map(|id| self.link(*id))
            .filter(|link| link.kind() == LinkKind::ControlFlow && link.endpoint(endpoint) == node)
            .count()
    }

    /// Validate drawing a new link of `kind` from `source` to `target`
    pub fn check_new_link(
        &self,
        kind: LinkKind,
        source: ElementId,
        target: ElementId,
    ) -> EditResult<()> {
        let source_node = self.require_node(source)?;
        let target_node = self.require_node(target)?;

        if !kind.allowed_in(self.kind) {
            return Err(EditError::LinkKindNotAllowed {
                kind,
                diagram: self.kind,
            });
        }

        kind.check_endpoints(source_node.kind, target_node.kind, source == target)?;

        let duplicate = self.links().any(|link| {
            link.relationship()
                .duplicates(kind, source_node.classifier, target_node.classifier)
        });
        if duplicate {
            return Err(EditError::DuplicateLink);
        }

        if kind == LinkKind::ControlFlow {
            check_flow_limits(
                source_node.kind,
                self.count_flows(source, Endpoint::Source, None),
                target_node.kind,
                self.count_flows(target, Endpoint::Target, None),
            )?;
        }

        Ok(())
    }

    /// Validate moving one end of an existing link onto `candidate`.
    ///
    /// Applies the link-kind rule table plus the diagram's flow limits, where
    /// the link itself does not count against either end.
    pub fn check_reconnect(
        &self,
        link: ElementId,
        endpoint: Endpoint,
        candidate: ElementId,
    ) -> EditResult<()> {
        let link = self.require_link(link)?;
        let candidate_node = self.require_node(candidate)?;
        link.check_reconnect(endpoint, candidate_node)?;

        if link.kind() == LinkKind::ControlFlow {
            let (source, target) = match endpoint {
                Endpoint::Source => (candidate_node, self.require_node(link.target())?),
                Endpoint::Target => (self.require_node(link.source())?, candidate_node),
            };
            check_flow_limits(
                source.kind,
                self.count_flows(source.id, Endpoint::Source, Some(link.id)),
                target.kind,
                self.count_flows(target.id, Endpoint::Target, Some(link.id)),
            )?;
        }

        Ok(())
    }

    // ========== Event Logging ==========

    fn log_event(&mut self, change: ModelChange) {
        self.events.push(ModelEvent::new(change));
    }

    /// Get all pending events
    pub fn events(&self) -> &[ModelEvent] {
        &self.events
    }

    /// Hand pending events to an observer and forget them
    pub fn drain_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Clear event log
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}
