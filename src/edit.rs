//! Reversible units of mutation.
//!
//! Every edit is an immutable record of the exact element instances it
//! inserted or removed, together with the structural [`Placement`] each one
//! occupied. Undo and redo replay those records, so redo brings back the very
//! same ids rather than rebuilt equivalents.

use crate::{
    Classifier, ClassifierId, Diagram, EditError, EditResult, ElementId, Endpoint,
    GraphicalElement, Link, Placement, Rectangle, Repository,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// An element together with the place it occupies in the diagram
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedElement {
    pub placement: Placement,
    pub element: GraphicalElement,
}

impl PlacedElement {
    pub fn new(placement: Placement, element: impl Into<GraphicalElement>) -> Self {
        Self {
            placement,
            element: element.into(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.element.id()
    }
}

/// One recorded mutation on the undo/redo stacks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Edit {
    AddElement(Insertion),
    DeleteClosure(DeleteClosureEdit),
    ReconnectLink(ReconnectLinkEdit),
    /// One pasted top-level element with everything nested in it
    PasteElement(Insertion),
    Move(MoveEdit),
    RenameClassifier(RenameClassifierEdit),
}

impl Edit {
    /// Short name for undo/redo menu labels
    pub fn description(&self) -> &'static str {
        match self {
            Edit::AddElement(_) => "Add",
            Edit::DeleteClosure(_) => "Delete",
            Edit::ReconnectLink(_) => "Reconnect",
            Edit::PasteElement(_) => "Paste",
            Edit::Move(_) => "Move",
            Edit::RenameClassifier(_) => "Rename",
        }
    }

    /// Apply the forward mutation to a state where it was undone
    pub fn apply(&self, model: &mut Diagram, repo: &mut dyn Repository) -> EditResult<()> {
        match self {
            Edit::AddElement(insertion) | Edit::PasteElement(insertion) => {
                insertion.apply(model, repo)
            }
            Edit::DeleteClosure(edit) => edit.apply(model, repo),
            Edit::ReconnectLink(edit) => edit.apply(model, repo),
            Edit::Move(edit) => edit.apply(model),
            Edit::RenameClassifier(edit) => edit.apply(repo),
        }
    }

    pub fn undo(&self, model: &mut Diagram, repo: &mut dyn Repository) -> EditResult<()> {
        match self {
            Edit::AddElement(insertion) | Edit::PasteElement(insertion) => {
                insertion.revert(model, repo)
            }
            Edit::DeleteClosure(edit) => edit.revert(model, repo),
            Edit::ReconnectLink(edit) => edit.revert(model, repo),
            Edit::Move(edit) => edit.revert(model),
            Edit::RenameClassifier(edit) => edit.revert(repo),
        }
    }

    pub fn redo(&self, model: &mut Diagram, repo: &mut dyn Repository) -> EditResult<()> {
        self.apply(model, repo)
    }

    /// Elements that exist in the model once this edit is applied
    pub fn created_elements(&self) -> Vec<ElementId> {
        match self {
            Edit::AddElement(insertion) | Edit::PasteElement(insertion) => {
                insertion.elements.iter().map(PlacedElement::id).collect()
            }
            Edit::ReconnectLink(edit) => vec![edit.new_link.id],
            Edit::DeleteClosure(_) | Edit::Move(_) | Edit::RenameClassifier(_) => Vec::new(),
        }
    }
}

// ========== Shared Helpers ==========

/// Insert each element at its recorded placement, all or nothing
fn insert_all(model: &mut Diagram, elements: &[PlacedElement]) -> EditResult<()> {
    for (done, placed) in elements.iter().enumerate() {
        if let Err(err) = model.insert_element(placed.placement, placed.element.clone()) {
            for inserted in elements[..done].iter().rev() {
                if model.remove_graphical_element(inserted.id()).is_err() {
                    warn!(element:% = inserted.id(); "rollback could not remove element");
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

/// Remove the given elements in order, all or nothing
fn remove_all(model: &mut Diagram, ids: &[ElementId]) -> EditResult<Vec<PlacedElement>> {
    let mut removed: Vec<PlacedElement> = Vec::with_capacity(ids.len());
    for id in ids {
        match model.remove_graphical_element(*id) {
            Ok((placement, element)) => removed.push(PlacedElement { placement, element }),
            Err(err) => {
                for placed in removed.iter().rev() {
                    if model
                        .insert_element(placed.placement, placed.element.clone())
                        .is_err()
                    {
                        warn!(element:% = placed.id(); "rollback could not restore element");
                    }
                }
                return Err(err);
            }
        }
    }
    Ok(removed)
}

/// Add the classifiers the repository is missing, all or nothing, returning
/// the ones actually added
fn add_classifiers(
    repo: &mut dyn Repository,
    classifiers: &[Classifier],
) -> EditResult<Vec<Classifier>> {
    let mut added: Vec<Classifier> = Vec::new();
    for classifier in classifiers {
        if repo.classifier(classifier.id).is_some() {
            continue;
        }
        if let Err(err) = repo.add_classifier(classifier.clone()) {
            remove_classifiers(repo, &added);
            return Err(err);
        }
        added.push(classifier.clone());
    }
    Ok(added)
}

/// Remove classifiers no node wraps any more, in any diagram
fn remove_classifiers(repo: &mut dyn Repository, classifiers: &[Classifier]) {
    for classifier in classifiers.iter().rev() {
        if repo.usage_count(classifier.id) == 0 {
            repo.remove_classifier(classifier.id);
        }
    }
}

fn require_classifiers(repo: &dyn Repository, elements: &[PlacedElement]) -> EditResult<()> {
    for placed in elements {
        if let GraphicalElement::Node(node) = &placed.element {
            if repo.classifier(node.classifier).is_none() {
                return Err(EditError::UnknownClassifier(node.classifier));
            }
        }
    }
    Ok(())
}

/// Record the domain side of an element entering the diagram
fn register(repo: &mut dyn Repository, element: &GraphicalElement) -> EditResult<()> {
    match element {
        GraphicalElement::Node(node) => {
            repo.retain(node.classifier)?;
        }
        GraphicalElement::Link(link) => repo.add_relationship(link.relationship().clone()),
        GraphicalElement::Note(_) => {}
    }
    Ok(())
}

/// Record the domain side of an element leaving the diagram
fn unregister(repo: &mut dyn Repository, element: &GraphicalElement) {
    match element {
        GraphicalElement::Node(node) => {
            if repo.release(node.classifier).is_err() {
                warn!(classifier:% = node.classifier; "released a classifier the repository does not know");
            }
        }
        GraphicalElement::Link(link) => {
            repo.remove_relationship(link.relationship().id);
        }
        GraphicalElement::Note(_) => {}
    }
}

// ========== Insertion (add / paste) ==========

/// Elements entering the diagram together, plus the classifiers that had to
/// be registered for them.
///
/// Elements are listed parents first; nested elements name their container
/// in their placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insertion {
    pub elements: Vec<PlacedElement>,
    pub created_classifiers: Vec<Classifier>,
}

impl Insertion {
    pub fn new(elements: Vec<PlacedElement>, created_classifiers: Vec<Classifier>) -> Self {
        Self {
            elements,
            created_classifiers,
        }
    }

    /// Ids of the elements, parents first
    pub fn ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(PlacedElement::id).collect()
    }

    /// Id of the outermost element
    pub fn root(&self) -> Option<ElementId> {
        self.elements.first().map(PlacedElement::id)
    }

    fn apply(&self, model: &mut Diagram, repo: &mut dyn Repository) -> EditResult<()> {
        let added = add_classifiers(repo, &self.created_classifiers)?;

        let inserted = require_classifiers(repo, &self.elements)
            .and_then(|()| insert_all(model, &self.elements));
        if let Err(err) = inserted {
            remove_classifiers(repo, &added);
            return Err(err);
        }

        for placed in &self.elements {
            register(repo, &placed.element)?;
        }
        Ok(())
    }

    fn revert(&self, model: &mut Diagram, repo: &mut dyn Repository) -> EditResult<()> {
        let ids: Vec<ElementId> = self.ids().into_iter().rev().collect();
        remove_all(model, &ids)?;

        for placed in self.elements.iter().rev() {
            unregister(repo, &placed.element);
        }
        remove_classifiers(repo, &self.created_classifiers);
        Ok(())
    }
}

// ========== Delete Closure ==========

/// Everything removed by one delete gesture
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteClosureEdit {
    /// Removed elements in removal order
    pub removed: Vec<PlacedElement>,

    /// Classifiers wrapped by the removed nodes, as they were before the delete.
    /// Those left without any node in any diagram leave the repository.
    pub classifiers: Vec<Classifier>,
}

impl DeleteClosureEdit {
    /// Remove `ids` in order and record what went away.
    ///
    /// Links and anchored notes must come before the nodes they refer to,
    /// nested elements before their containers.
    pub fn perform(
        model: &mut Diagram,
        repo: &mut dyn Repository,
        ids: &[ElementId],
    ) -> EditResult<Self> {
        let removed = remove_all(model, ids)?;

        let mut classifiers: Vec<Classifier> = Vec::new();
        for node in removed.iter().filter_map(|placed| placed.element.as_node()) {
            if classifiers.iter().any(|c| c.id == node.classifier) {
                continue;
            }
            if let Some(classifier) = repo.classifier(node.classifier) {
                classifiers.push(classifier.clone());
            }
        }

        for placed in &removed {
            unregister(repo, &placed.element);
        }
        remove_classifiers(repo, &classifiers);

        debug!(elements = removed.len(), classifiers = classifiers.len(); "delete closure removed");
        Ok(Self {
            removed,
            classifiers,
        })
    }

    pub fn ids(&self) -> Vec<ElementId> {
        self.removed.iter().map(PlacedElement::id).collect()
    }

    fn apply(&self, model: &mut Diagram, repo: &mut dyn Repository) -> EditResult<()> {
        remove_all(model, &self.ids())?;
        for placed in &self.removed {
            unregister(repo, &placed.element);
        }
        remove_classifiers(repo, &self.classifiers);
        Ok(())
    }

    fn revert(&self, model: &mut Diagram, repo: &mut dyn Repository) -> EditResult<()> {
        let added = add_classifiers(repo, &self.classifiers)?;

        let restore: Vec<PlacedElement> = self.removed.iter().rev().cloned().collect();
        if let Err(err) = insert_all(model, &restore) {
            remove_classifiers(repo, &added);
            return Err(err);
        }

        for placed in &restore {
            register(repo, &placed.element)?;
        }
        Ok(())
    }
}

// ========== Reconnection ==========

/// Replacement of a link by a new one with one endpoint substituted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconnectLinkEdit {
    pub old_link: Link,
    pub new_link: Link,
    pub endpoint: Endpoint,
}

impl ReconnectLinkEdit {
    /// Validate and commit moving `endpoint` of `link` onto `candidate`.
    ///
    /// On any rule violation the model is left untouched.
    pub fn perform(
        model: &mut Diagram,
        repo: &mut dyn Repository,
        link: ElementId,
        endpoint: Endpoint,
        candidate: ElementId,
    ) -> EditResult<Self> {
        let old_link = model.require_link(link)?.clone();
        if old_link.endpoint(endpoint) == candidate {
            return Err(EditError::SameEndpoint);
        }
        model.check_reconnect(link, endpoint, candidate)?;

        let candidate_node = model.require_node(candidate)?;
        let other = model.require_node(old_link.endpoint(endpoint.opposite()))?;
        let new_link = old_link.reconnect(endpoint, candidate_node, other)?;

        let edit = Self {
            old_link,
            new_link,
            endpoint,
        };
        edit.apply(model, repo)?;
        Ok(edit)
    }

    fn apply(&self, model: &mut Diagram, repo: &mut dyn Repository) -> EditResult<()> {
        Self::swap(model, repo, &self.old_link, &self.new_link)
    }

    fn revert(&self, model: &mut Diagram, repo: &mut dyn Repository) -> EditResult<()> {
        Self::swap(model, repo, &self.new_link, &self.old_link)
    }

    /// Put `incoming` where `outgoing` is, keeping its drawing position
    fn swap(
        model: &mut Diagram,
        repo: &mut dyn Repository,
        outgoing: &Link,
        incoming: &Link,
    ) -> EditResult<()> {
        let (placement, removed) = model.remove_graphical_element(outgoing.id)?;
        if let Err(err) = model.insert_element(placement, incoming.clone().into()) {
            if model.insert_element(placement, removed).is_err() {
                warn!(element:% = outgoing.id; "rollback could not restore link");
            }
            return Err(err);
        }

        repo.remove_relationship(outgoing.relationship().id);
        repo.add_relationship(incoming.relationship().clone());
        Ok(())
    }
}

// ========== Move ==========

/// Exact bounds of one element on both sides of a move
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundsChange {
    pub id: ElementId,
    pub before: Rectangle,
    pub after: Rectangle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveEdit {
    pub ids: Vec<ElementId>,
    pub dx: f32,
    pub dy: f32,

    /// Every moved element, nested ones included
    pub changes: Vec<BoundsChange>,
}

impl MoveEdit {
    pub fn perform(model: &mut Diagram, ids: Vec<ElementId>, dx: f32, dy: f32) -> EditResult<Self> {
        if let Some(missing) = ids.iter().find(|id| !model.contains(**id)) {
            return Err(EditError::UnknownElement(*missing));
        }

        let moved: Vec<ElementId> = ids
            .iter()
            .flat_map(|id| model.subtree_post_order(*id))
            .collect();
        let before: Vec<(ElementId, Rectangle)> = moved
            .iter()
            .filter_map(|id| Some((*id, model.element(*id)?.bounds()?)))
            .collect();

        for id in &ids {
            model.move_graphical_element(*id, dx, dy)?;
        }

        let changes = before
            .into_iter()
            .filter_map(|(id, before)| {
                let after = model.element(id)?.bounds()?;
                Some(BoundsChange { id, before, after })
            })
            .collect();
        Ok(Self {
            ids,
            dx,
            dy,
            changes,
        })
    }

    fn apply(&self, model: &mut Diagram) -> EditResult<()> {
        for change in &self.changes {
            model.set_bounds(change.id, change.after)?;
        }
        Ok(())
    }

    fn revert(&self, model: &mut Diagram) -> EditResult<()> {
        for change in self.changes.iter().rev() {
            model.set_bounds(change.id, change.before)?;
        }
        Ok(())
    }
}

// ========== Rename ==========

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenameClassifierEdit {
    pub classifier: ClassifierId,
    pub old_name: String,
    pub new_name: String,
}

impl RenameClassifierEdit {
    pub fn perform(
        repo: &mut dyn Repository,
        classifier: ClassifierId,
        name: &str,
    ) -> EditResult<Self> {
        let old_name = repo.rename_classifier(classifier, name)?;
        Ok(Self {
            classifier,
            old_name,
            new_name: name.to_string(),
        })
    }

    fn apply(&self, repo: &mut dyn Repository) -> EditResult<()> {
        repo.rename_classifier(self.classifier, &self.new_name)?;
        Ok(())
    }

    fn revert(&self, repo: &mut dyn Repository) -> EditResult<()> {
        repo.rename_classifier(self.classifier, &self.old_name)?;
        Ok(())
    }
}
