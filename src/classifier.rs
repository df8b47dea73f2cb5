use crate::ClassifierId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of domain entity a node stands for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ClassifierKind {
    // Class diagrams
    Class,
    Interface,
    ConceptualClass,

    // Use case diagrams
    Actor,
    UseCase,
    System,

    // Activity diagrams
    Action,
    Initial,
    ActivityFinal,
    FlowFinal,
    Decision,
    Merge,
    Fork,
    Join,
    Activity,
}

impl ClassifierKind {
    /// Class-like kinds that take part in structural relationships
    pub fn is_class_like(self) -> bool {
        matches!(
            self,
            ClassifierKind::Class | ClassifierKind::Interface | ClassifierKind::ConceptualClass
        )
    }

    /// Kinds that may appear on an activity diagram
    pub fn is_activity_node(self) -> bool {
        matches!(
            self,
            ClassifierKind::Action
                | ClassifierKind::Initial
                | ClassifierKind::ActivityFinal
                | ClassifierKind::FlowFinal
                | ClassifierKind::Decision
                | ClassifierKind::Merge
                | ClassifierKind::Fork
                | ClassifierKind::Join
                | ClassifierKind::Activity
        )
    }

    pub fn is_final(self) -> bool {
        matches!(self, ClassifierKind::ActivityFinal | ClassifierKind::FlowFinal)
    }

    /// Whether nodes of this kind hold nested elements
    pub fn is_container(self) -> bool {
        matches!(self, ClassifierKind::System | ClassifierKind::Activity)
    }

    /// Whether a node of this kind may directly contain a node of `child` kind
    pub fn can_contain(self, child: ClassifierKind) -> bool {
        match self {
            ClassifierKind::System => {
                matches!(child, ClassifierKind::UseCase | ClassifierKind::System)
            }
            ClassifierKind::Activity => child.is_activity_node(),
            _ => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ClassifierKind::Class => "Class",
            ClassifierKind::Interface => "Interface",
            ClassifierKind::ConceptualClass => "Conceptual class",
            ClassifierKind::Actor => "Actor",
            ClassifierKind::UseCase => "Use case",
            ClassifierKind::System => "System",
            ClassifierKind::Action => "Action node",
            ClassifierKind::Initial => "Initial node",
            ClassifierKind::ActivityFinal => "Activity final node",
            ClassifierKind::FlowFinal => "Flow final node",
            ClassifierKind::Decision => "Decision node",
            ClassifierKind::Merge => "Merge node",
            ClassifierKind::Fork => "Fork node",
            ClassifierKind::Join => "Join node",
            ClassifierKind::Activity => "Activity node",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named domain entity that nodes wrap.
///
/// Classifiers live in the repository; several nodes (including pasted
/// copies) may refer to the same one, so edits made through any of them are
/// visible through all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classifier {
    pub id: ClassifierId,
    pub kind: ClassifierKind,
    pub name: String,
    pub stereotype: Option<String>,
    pub attributes: Vec<String>,
    pub operations: Vec<String>,
}

impl Classifier {
    pub fn new(kind: ClassifierKind, name: impl Into<String>) -> Self {
        Self {
            id: ClassifierId::new(),
            kind,
            name: name.into(),
            stereotype: None,
            attributes: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operations.push(operation.into());
        self
    }

    pub fn with_stereotype(mut self, stereotype: impl Into<String>) -> Self {
        self.stereotype = Some(stereotype.into());
        self
    }
}

/// Diagram type; decides which node and link kinds may be placed on it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    /// Design class diagram
    Class,
    /// Conceptual (domain) class diagram
    Conceptual,
    UseCase,
    Activity,
}

impl DiagramKind {
    pub fn allows_node(self, kind: ClassifierKind) -> bool {
        match self {
            DiagramKind::Class => {
                matches!(kind, ClassifierKind::Class | ClassifierKind::Interface)
            }
            DiagramKind::Conceptual => kind == ClassifierKind::ConceptualClass,
            DiagramKind::UseCase => matches!(
                kind,
                ClassifierKind::Actor | ClassifierKind::UseCase | ClassifierKind::System
            ),
            DiagramKind::Activity => kind.is_activity_node(),
        }
    }
}
