//! Interprets user gestures on one diagram as model edits.
//!
//! The [`SelectionController`] is the only path through which a diagram and
//! the shared repository change: each gesture validates first, commits as a
//! whole or not at all, and posts exactly one [`Edit`] per undoable step.

use crate::{
    Classifier, ClassifierId, ClipboardNode, DeleteClosureEdit, Diagram, Edit, EditError,
    EditResult, EditorConfig, EditorContext, ElementId, Endpoint, GraphicalElement, Insertion,
    Link, LinkKind, LinkProperties, ModelEvent, MoveEdit, Node, Note, PlacedElement, Placement,
    Point, Rectangle, ReconnectLinkEdit, RenameClassifierEdit, Repository, UndoManager,
};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Where the controller is in its interaction cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    ElementsSelected,
    DraggingEndpoint,
}

/// An endpoint drag in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDrag {
    pub link: ElementId,
    pub endpoint: Endpoint,

    /// Node under the pointer that would accept the endpoint, if any
    pub potential_target: Option<ElementId>,
}

/// Gesture interpreter owning one diagram and its undo history
#[derive(Debug, Clone)]
pub struct SelectionController {
    model: Diagram,
    undo: UndoManager,
    selected: HashSet<ElementId>,
    drag: Option<EndpointDrag>,
    endpoint_tolerance: f32,
}

impl SelectionController {
    pub fn new(model: Diagram, config: &EditorConfig) -> Self {
        Self {
            model,
            undo: UndoManager::with_max_depth(config.max_undo_depth),
            selected: HashSet::new(),
            drag: None,
            endpoint_tolerance: config.endpoint_tolerance,
        }
    }

    pub fn model(&self) -> &Diagram {
        &self.model
    }

    /// Hand pending change notifications to an observer
    pub fn drain_events(&mut self) -> Vec<ModelEvent> {
        self.model.drain_events()
    }

    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo
    }

    pub fn state(&self) -> InteractionState {
        if self.drag.is_some() {
            InteractionState::DraggingEndpoint
        } else if !self.selected.is_empty() {
            InteractionState::ElementsSelected
        } else {
            InteractionState::Idle
        }
    }

    pub fn drag(&self) -> Option<&EndpointDrag> {
        self.drag.as_ref()
    }

    // ========== Selection ==========

    pub fn selected(&self) -> &HashSet<ElementId> {
        &self.selected
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selected.contains(&id)
    }

    pub fn add_element_to_selection(&mut self, id: ElementId) -> EditResult<()> {
        if !self.model.contains(id) {
            return Err(EditError::UnknownElement(id));
        }
        self.selected.insert(id);
        Ok(())
    }

    pub fn remove_element_from_selection(&mut self, id: ElementId) -> bool {
        self.selected.remove(&id)
    }

    /// Select every top-level element
    pub fn select_all(&mut self) {
        self.selected = self.model.top_level_ids().into_iter().collect();
    }

    pub fn clear_selected(&mut self) {
        self.selected.clear();
    }

    /// Selected elements in drawing order, containers before their contents
    fn ordered_selection(&self) -> Vec<ElementId> {
        let mut ordered = Vec::with_capacity(self.selected.len());
        let mut pending: Vec<ElementId> = self.model.top_level_ids().into_iter().rev().collect();
        while let Some(id) = pending.pop() {
            if self.selected.contains(&id) {
                ordered.push(id);
            }
            pending.extend(self.model.contents(id).iter().rev().copied());
        }
        ordered
    }

    fn has_selected_ancestor(&self, id: ElementId) -> bool {
        let mut current = self.model.container_of(id);
        while let Some(container) = current {
            if self.selected.contains(&container) {
                return true;
            }
            current = self.model.container_of(container);
        }
        false
    }

    // ========== Adding Elements ==========

    fn insert<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
        placed: PlacedElement,
        created: Vec<Classifier>,
    ) -> EditResult<ElementId> {
        let id = placed.id();
        let edit = Edit::AddElement(Insertion::new(vec![placed], created));
        edit.apply(&mut self.model, &mut ctx.repository)?;
        self.undo.post_edit(edit);
        Ok(id)
    }

    fn top_level_slot(&self) -> Placement {
        Placement::TopLevel {
            slot: self.model.next_slot(),
        }
    }

    /// Add a node for a classifier, registering the classifier if it is new
    pub fn add_node<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
        classifier: Classifier,
        bounds: Rectangle,
    ) -> EditResult<ElementId> {
        let node = Node::new(&classifier, bounds);
        let created = Self::unregistered(&ctx.repository, classifier);
        let placement = self.top_level_slot();
        self.insert(ctx, PlacedElement::new(placement, node), created)
    }

    /// Add another view of a classifier that is already registered
    pub fn add_node_for<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
        classifier: ClassifierId,
        bounds: Rectangle,
    ) -> EditResult<ElementId> {
        let node = ctx
            .repository
            .classifier(classifier)
            .map(|c| Node::new(c, bounds))
            .ok_or(EditError::UnknownClassifier(classifier))?;
        let placement = self.top_level_slot();
        self.insert(ctx, PlacedElement::new(placement, node), Vec::new())
    }

    /// Add a node at the end of a container's contents
    pub fn add_nested_node<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
        container: ElementId,
        classifier: Classifier,
        bounds: Rectangle,
    ) -> EditResult<ElementId> {
        let index = self.model.require_node(container)?.contents.len();
        let node = Node::new(&classifier, bounds);
        let created = Self::unregistered(&ctx.repository, classifier);
        self.insert(
            ctx,
            PlacedElement::new(Placement::Nested { container, index }, node),
            created,
        )
    }

    fn unregistered(repo: &dyn Repository, classifier: Classifier) -> Vec<Classifier> {
        if repo.classifier(classifier.id).is_some() {
            Vec::new()
        } else {
            vec![classifier]
        }
    }

    /// Draw a new link between two nodes.
    ///
    /// Rejections (rule table, duplicates, flow limits) leave everything
    /// untouched and carry the reason to show the user.
    pub fn add_link<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
        kind: LinkKind,
        source: ElementId,
        target: ElementId,
        properties: LinkProperties,
    ) -> EditResult<ElementId> {
        if let Err(err) = self.model.check_new_link(kind, source, target) {
            debug!(kind:% = kind; "link rejected: {err}");
            return Err(err);
        }

        let link = Link::connect(
            kind,
            self.model.require_node(source)?,
            self.model.require_node(target)?,
            properties,
        );
        let placement = self.top_level_slot();
        self.insert(ctx, PlacedElement::new(placement, link), Vec::new())
    }

    pub fn add_note<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
        text: &str,
        bounds: Rectangle,
        anchor: Option<ElementId>,
    ) -> EditResult<ElementId> {
        let note = Note::new(text, bounds, anchor);
        let placement = self.top_level_slot();
        self.insert(ctx, PlacedElement::new(placement, note), Vec::new())
    }

    // ========== Editing ==========

    /// Move the selected nodes and notes by a delta as one edit
    pub fn move_selected(&mut self, dx: f32, dy: f32) -> EditResult<()> {
        let ids: Vec<ElementId> = self
            .ordered_selection()
            .into_iter()
            .filter(|id| self.model.element(*id).is_some_and(|e| !e.is_link()))
            .filter(|id| !self.has_selected_ancestor(*id))
            .collect();
        if ids.is_empty() {
            return Err(EditError::EmptySelection);
        }

        let edit = MoveEdit::perform(&mut self.model, ids, dx, dy)?;
        self.undo.post_edit(Edit::Move(edit));
        Ok(())
    }

    pub fn rename_classifier<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
        classifier: ClassifierId,
        name: &str,
    ) -> EditResult<()> {
        let edit = RenameClassifierEdit::perform(&mut ctx.repository, classifier, name)?;
        self.undo.post_edit(Edit::RenameClassifier(edit));
        Ok(())
    }

    // ========== Deletion ==========

    /// Everything that must go when the selection is deleted, in a removal
    /// order that never leaves a dangling reference: links, then notes, then
    /// nodes with nested ones before their containers.
    pub fn delete_closure(&self) -> Vec<ElementId> {
        let mut nodes: Vec<ElementId> = Vec::new();
        let mut links: Vec<ElementId> = Vec::new();
        let mut notes: Vec<ElementId> = Vec::new();
        let mut seen: HashSet<ElementId> = HashSet::new();

        for id in self.ordered_selection() {
            match self.model.element(id) {
                Some(GraphicalElement::Node(_)) => {
                    for nested in self.model.subtree_post_order(id) {
                        if seen.insert(nested) {
                            nodes.push(nested);
                        }
                    }
                }
                Some(GraphicalElement::Link(_)) => {
                    if seen.insert(id) {
                        links.push(id);
                    }
                }
                Some(GraphicalElement::Note(_)) => {
                    if seen.insert(id) {
                        notes.push(id);
                    }
                }
                None => {}
            }
        }

        for node in &nodes {
            for link in self.model.links_of(*node) {
                if seen.insert(*link) {
                    links.push(*link);
                }
            }
            for note in self.model.notes_anchored_to(*node) {
                if seen.insert(*note) {
                    notes.push(*note);
                }
            }
        }

        links.into_iter().chain(notes).chain(nodes).collect()
    }

    /// Delete the selection and its closure as one edit, returning the
    /// number of elements removed
    pub fn delete_selected<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
    ) -> EditResult<usize> {
        if self.selected.is_empty() {
            return Err(EditError::EmptySelection);
        }

        let closure = self.delete_closure();
        let edit = DeleteClosureEdit::perform(&mut self.model, &mut ctx.repository, &closure)?;
        let removed = edit.removed.len();

        self.selected.clear();
        self.undo.post_edit(Edit::DeleteClosure(edit));
        Ok(removed)
    }

    // ========== Copy & Paste ==========

    fn clipboard_node(&self, id: ElementId) -> Option<ClipboardNode> {
        let node = self.model.node(id)?;
        let children = node
            .contents
            .iter()
            .filter_map(|child| self.clipboard_node(*child))
            .collect();
        Some(ClipboardNode {
            node: node.clone(),
            children,
        })
    }

    /// Copy the selection into the shared clipboard.
    ///
    /// Selected nodes come with everything nested in them. A link is copied
    /// only when both of its ends were copied. Returns the number of
    /// top-level entries.
    pub fn copy_selected<R: Repository>(&self, ctx: &mut EditorContext<R>) -> EditResult<usize> {
        let ordered = self.ordered_selection();
        if ordered.is_empty() {
            return Err(EditError::EmptySelection);
        }

        let nodes: Vec<ClipboardNode> = ordered
            .iter()
            .filter(|id| !self.has_selected_ancestor(**id))
            .filter_map(|id| self.clipboard_node(*id))
            .collect();

        let mut copied: HashSet<ElementId> = HashSet::new();
        let mut classifiers: Vec<Classifier> = Vec::new();
        let mut pending: Vec<&ClipboardNode> = nodes.iter().collect();
        while let Some(entry) = pending.pop() {
            copied.insert(entry.node.id);
            if !classifiers.iter().any(|c| c.id == entry.node.classifier) {
                if let Some(classifier) = ctx.repository.classifier(entry.node.classifier) {
                    classifiers.push(classifier.clone());
                }
            }
            pending.extend(entry.children.iter());
        }

        let links = self
            .model
            .links()
            .filter(|link| copied.contains(&link.source()) && copied.contains(&link.target()))
            .cloned()
            .collect();

        let notes = ordered
            .iter()
            .filter_map(|id| self.model.note(*id))
            .cloned()
            .collect();

        ctx.clipboard.set_contents(nodes, links, notes, classifiers);
        debug!(entries = ctx.clipboard.len(); "selection copied");
        Ok(ctx.clipboard.len())
    }

    /// Paste the clipboard, one edit per top-level element.
    ///
    /// Pasted nodes share their classifiers with the originals; a classifier
    /// deleted since the copy is registered again. The pasted top-level
    /// elements become the selection and are returned.
    pub fn paste_clipboard<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
    ) -> EditResult<Vec<ElementId>> {
        if ctx.clipboard.is_empty() {
            return Err(EditError::EmptyClipboard);
        }

        let groups = ctx.clipboard.instantiate(ctx.config.paste_offset);
        let mut restored: HashSet<ClassifierId> = HashSet::new();
        let mut applied: Vec<Edit> = Vec::with_capacity(groups.len());

        for group in groups {
            let mut elements = Vec::with_capacity(group.len());
            let mut created = Vec::new();
            let mut child_counts: HashMap<ElementId, usize> = HashMap::new();
            let slot = self.model.next_slot();

            for pasted in group {
                let placement = match pasted.container {
                    None => Placement::TopLevel { slot },
                    Some(container) => {
                        let index = child_counts.entry(container).or_insert(0);
                        let placement = Placement::Nested {
                            container,
                            index: *index,
                        };
                        *index += 1;
                        placement
                    }
                };

                if let GraphicalElement::Node(node) = &pasted.element {
                    let missing = ctx.repository.classifier(node.classifier).is_none();
                    if missing && restored.insert(node.classifier) {
                        if let Some(classifier) = ctx.clipboard.classifier(node.classifier) {
                            created.push(classifier.clone());
                        }
                    }
                }
                elements.push(PlacedElement::new(placement, pasted.element));
            }

            let edit = Edit::PasteElement(Insertion::new(elements, created));
            if let Err(err) = edit.apply(&mut self.model, &mut ctx.repository) {
                for done in applied.iter().rev() {
                    if done.undo(&mut self.model, &mut ctx.repository).is_err() {
                        warn!("rollback of a partial paste failed");
                    }
                }
                debug!("paste rejected: {err}");
                return Err(err);
            }
            applied.push(edit);
        }

        let pasted: Vec<ElementId> = applied
            .iter()
            .filter_map(|edit| match edit {
                Edit::PasteElement(insertion) => insertion.root(),
                _ => None,
            })
            .collect();

        self.selected = pasted.iter().copied().collect();
        for edit in applied {
            self.undo.post_edit(edit);
        }
        Ok(pasted)
    }

    // ========== Reconnection ==========

    /// Move one end of a link onto another node as one edit, returning the
    /// id of the replacement link
    pub fn reconnect<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
        link: ElementId,
        endpoint: Endpoint,
        candidate: ElementId,
    ) -> EditResult<ElementId> {
        let edit = ReconnectLinkEdit::perform(
            &mut self.model,
            &mut ctx.repository,
            link,
            endpoint,
            candidate,
        )?;
        let new_id = edit.new_link.id;

        if self.selected.remove(&link) {
            self.selected.insert(new_id);
        }
        self.undo.post_edit(Edit::ReconnectLink(edit));
        Ok(new_id)
    }

    /// Grab the end of `link` under the pointer, if there is one
    pub fn begin_endpoint_drag(
        &mut self,
        link: ElementId,
        point: Point,
    ) -> EditResult<Option<Endpoint>> {
        let endpoint = self
            .model
            .endpoint_at_point(link, point, self.endpoint_tolerance)?;
        self.drag = endpoint.map(|endpoint| EndpointDrag {
            link,
            endpoint,
            potential_target: None,
        });
        Ok(endpoint)
    }

    /// Track the pointer, returning the node that would accept the endpoint
    pub fn update_endpoint_drag(&mut self, point: Point) -> EditResult<Option<ElementId>> {
        let drag = self.drag.ok_or(EditError::NoDragInProgress)?;
        let potential_target = self.model.node_at(point).filter(|candidate| {
            self.model
                .link(drag.link)
                .is_some_and(|link| link.endpoint(drag.endpoint) != *candidate)
                && self
                    .model
                    .check_reconnect(drag.link, drag.endpoint, *candidate)
                    .is_ok()
        });

        if let Some(drag) = self.drag.as_mut() {
            drag.potential_target = potential_target;
        }
        Ok(potential_target)
    }

    /// Drop the dragged endpoint at `(x, y)`.
    ///
    /// The drag ends either way. When the spot holds no acceptable node the
    /// drag is abandoned without touching the model or the history.
    pub fn complete_endpoint_drag<R: Repository>(
        &mut self,
        ctx: &mut EditorContext<R>,
        x: f32,
        y: f32,
    ) -> EditResult<ElementId> {
        let drag = self.drag.take().ok_or(EditError::NoDragInProgress)?;
        let Some(candidate) = self.model.node_at(Point::new(x, y)) else {
            debug!(link:% = drag.link; "endpoint drag abandoned: no node under pointer");
            return Err(EditError::NoTargetNode);
        };

        self.reconnect(ctx, drag.link, drag.endpoint, candidate)
            .inspect_err(|err| debug!(link:% = drag.link; "endpoint drag abandoned: {err}"))
    }

    /// Abandon the drag in flight (Escape); returns whether there was one
    pub fn cancel_endpoint_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    // ========== History ==========

    /// Undo the latest edit, returning its description
    pub fn undo<R: Repository>(&mut self, ctx: &mut EditorContext<R>) -> EditResult<&'static str> {
        self.drag = None;
        let description = self.undo.undo(&mut self.model, &mut ctx.repository)?;
        self.prune_selection();
        Ok(description)
    }

    pub fn redo<R: Repository>(&mut self, ctx: &mut EditorContext<R>) -> EditResult<&'static str> {
        self.drag = None;
        let description = self.undo.redo(&mut self.model, &mut ctx.repository)?;
        self.prune_selection();
        Ok(description)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    fn prune_selection(&mut self) {
        let model = &self.model;
        self.selected.retain(|id| model.contains(*id));
    }
}
