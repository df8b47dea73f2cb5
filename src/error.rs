use crate::{ClassifierId, ClassifierKind, DiagramKind, ElementId, LinkKind};
use thiserror::Error;

/// Failure of an editing operation.
///
/// Validation failures leave the model untouched; the `Display` text is the
/// reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("{kind} cannot connect these elements: {reason}")]
    IncompatibleEndpoint { kind: LinkKind, reason: &'static str },

    #[error("A {0} cannot connect an element to itself")]
    SelfLoop(LinkKind),

    #[error("Interfaces and Classes cannot participate in Generalizations with each other!")]
    MixedGeneralization,

    #[error("The link between these two classifiers already exists!")]
    DuplicateLink,

    #[error("{0}")]
    FlowLimit(String),

    #[error("{kind} links are not allowed on a {diagram:?} diagram")]
    LinkKindNotAllowed { kind: LinkKind, diagram: DiagramKind },

    #[error("{kind} elements are not allowed on a {diagram:?} diagram")]
    NodeKindNotAllowed {
        kind: ClassifierKind,
        diagram: DiagramKind,
    },

    #[error("Element not found: {0}")]
    UnknownElement(ElementId),

    #[error("Classifier not found: {0}")]
    UnknownClassifier(ClassifierId),

    #[error("Element {0} is not a node")]
    NotANode(ElementId),

    #[error("Element {0} is not a link")]
    NotALink(ElementId),

    #[error("Element {0} is already part of the diagram")]
    DuplicateElement(ElementId),

    #[error("Diagram position {0} is already taken")]
    PositionTaken(u64),

    #[error("Cannot nest into {container}: {reason}")]
    InvalidContainment {
        container: ElementId,
        reason: &'static str,
    },

    #[error("Element {0} still has links, notes or nested elements attached")]
    WouldDangle(ElementId),

    #[error("A {kind} named '{name}' already exists")]
    DuplicateName { kind: ClassifierKind, name: String },

    #[error("No valid node under the pointer")]
    NoTargetNode,

    #[error("The link is already connected to that node")]
    SameEndpoint,

    #[error("No endpoint drag in progress")]
    NoDragInProgress,

    #[error("Nothing is selected")]
    EmptySelection,

    #[error("The clipboard is empty")]
    EmptyClipboard,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

pub type EditResult<T> = std::result::Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_dialog_text() {
        assert_eq!(
            EditError::DuplicateLink.to_string(),
            "The link between these two classifiers already exists!"
        );
        assert_eq!(
            EditError::MixedGeneralization.to_string(),
            "Interfaces and Classes cannot participate in Generalizations with each other!"
        );
    }

    #[test]
    fn test_incompatible_message_names_kind() {
        let err = EditError::IncompatibleEndpoint {
            kind: LinkKind::Realization,
            reason: "the target must be an Interface",
        };
        assert_eq!(
            err.to_string(),
            "Realization cannot connect these elements: the target must be an Interface"
        );
    }
}
