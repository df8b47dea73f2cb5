//! Name-uniqueness registry for classifiers and relationships.
//!
//! The editing engine only talks to the [`Repository`] trait; the
//! [`CentralRepository`] is the in-memory implementation used by the
//! default [`crate::EditorContext`].

use crate::{
    Classifier, ClassifierId, ClassifierKind, EditError, EditResult, LinkKind, Relationship,
    RelationshipId,
};
use std::collections::HashMap;

/// Domain-side collaborator shared by every diagram of a session
pub trait Repository {
    /// Register a classifier. Non-empty names must be unique per kind.
    fn add_classifier(&mut self, classifier: Classifier) -> EditResult<ClassifierId>;

    /// Unregister a classifier, returning it as it was stored
    fn remove_classifier(&mut self, id: ClassifierId) -> Option<Classifier>;

    fn classifier(&self, id: ClassifierId) -> Option<&Classifier>;

    /// Mutable access for property edits that do not touch the name
    fn classifier_mut(&mut self, id: ClassifierId) -> Option<&mut Classifier>;

    fn find_classifier(&self, kind: ClassifierKind, name: &str) -> Option<ClassifierId>;

    /// Rename a classifier, returning the previous name
    fn rename_classifier(&mut self, id: ClassifierId, name: &str) -> EditResult<String>;

    /// Record one more graphical node wrapping the classifier
    fn retain(&mut self, id: ClassifierId) -> EditResult<usize>;

    /// Record one node fewer; returns the remaining count
    fn release(&mut self, id: ClassifierId) -> EditResult<usize>;

    fn usage_count(&self, id: ClassifierId) -> usize;

    fn add_relationship(&mut self, relationship: Relationship);

    fn remove_relationship(&mut self, id: RelationshipId) -> Option<Relationship>;

    fn relationship(&self, id: RelationshipId) -> Option<&Relationship>;

    /// Relationships in which the classifier takes part
    fn relationships_of(&self, classifier: ClassifierId) -> Vec<&Relationship>;
}

#[derive(Debug, Clone, PartialEq)]
struct ClassifierEntry {
    classifier: Classifier,
    uses: usize,
}

/// In-memory repository
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CentralRepository {
    classifiers: HashMap<ClassifierId, ClassifierEntry>,
    names: HashMap<(ClassifierKind, String), ClassifierId>,
    relationships: HashMap<RelationshipId, Relationship>,
}

impl CentralRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classifier_count(&self) -> usize {
        self.classifiers.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// General classifiers of `classifier` according to its generalizations
    pub fn superclasses_of(&self, classifier: ClassifierId) -> Vec<ClassifierId> {
        self.relationships
            .values()
            .filter(|r| {
                matches!(r.kind, LinkKind::Generalization | LinkKind::UcGeneralization)
                    && r.starts_from(classifier)
            })
            .map(|r| r.target)
            .collect()
    }

    fn name_key(kind: ClassifierKind, name: &str) -> Option<(ClassifierKind, String)> {
        if name.is_empty() {
            None
        } else {
            Some((kind, name.to_string()))
        }
    }
}

impl Repository for CentralRepository {
    fn add_classifier(&mut self, classifier: Classifier) -> EditResult<ClassifierId> {
        let id = classifier.id;
        if let Some(key) = Self::name_key(classifier.kind, &classifier.name) {
            if self.names.get(&key).is_some_and(|owner| *owner != id) {
                return Err(EditError::DuplicateName {
                    kind: classifier.kind,
                    name: classifier.name,
                });
            }
            self.names.insert(key, id);
        }
        self.classifiers
            .entry(id)
            .or_insert(ClassifierEntry { classifier, uses: 0 });
        Ok(id)
    }

    fn remove_classifier(&mut self, id: ClassifierId) -> Option<Classifier> {
        let entry = self.classifiers.remove(&id)?;
        if let Some(key) = Self::name_key(entry.classifier.kind, &entry.classifier.name) {
            self.names.remove(&key);
        }
        Some(entry.classifier)
    }

    fn classifier(&self, id: ClassifierId) -> Option<&Classifier> {
        self.classifiers.get(&id).map(|entry| &entry.classifier)
    }

    fn classifier_mut(&mut self, id: ClassifierId) -> Option<&mut Classifier> {
        self.classifiers.get_mut(&id).map(|entry| &mut entry.classifier)
    }

    fn find_classifier(&self, kind: ClassifierKind, name: &str) -> Option<ClassifierId> {
        self.names.get(&(kind, name.to_string())).copied()
    }

    fn rename_classifier(&mut self, id: ClassifierId, name: &str) -> EditResult<String> {
        let entry = self
            .classifiers
            .get(&id)
            .ok_or(EditError::UnknownClassifier(id))?;
        let kind = entry.classifier.kind;

        if let Some(key) = Self::name_key(kind, name) {
            if self.names.get(&key).is_some_and(|owner| *owner != id) {
                return Err(EditError::DuplicateName {
                    kind,
                    name: name.to_string(),
                });
            }
        }

        let Some(entry) = self.classifiers.get_mut(&id) else {
            return Err(EditError::UnknownClassifier(id));
        };
        let old = std::mem::replace(&mut entry.classifier.name, name.to_string());
        if let Some(key) = Self::name_key(kind, &old) {
            self.names.remove(&key);
        }
        if let Some(key) = Self::name_key(kind, name) {
            self.names.insert(key, id);
        }
        Ok(old)
    }

    fn retain(&mut self, id: ClassifierId) -> EditResult<usize> {
        let entry = self
            .classifiers
            .get_mut(&id)
            .ok_or(EditError::UnknownClassifier(id))?;
        entry.uses += 1;
        Ok(entry.uses)
    }

    fn release(&mut self, id: ClassifierId) -> EditResult<usize> {
        let entry = self
            .classifiers
            .get_mut(&id)
            .ok_or(EditError::UnknownClassifier(id))?;
        entry.uses = entry.uses.saturating_sub(1);
        Ok(entry.uses)
    }

    fn usage_count(&self, id: ClassifierId) -> usize {
        self.classifiers.get(&id).map_or(0, |entry| entry.uses)
    }

    fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.insert(relationship.id, relationship);
    }

    fn remove_relationship(&mut self, id: RelationshipId) -> Option<Relationship> {
        self.relationships.remove(&id)
    }

    fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(&id)
    }

    fn relationships_of(&self, classifier: ClassifierId) -> Vec<&Relationship> {
        self.relationships
            .values()
            .filter(|r| r.involves(classifier))
            .collect()
    }
}
