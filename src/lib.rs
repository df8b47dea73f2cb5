// UML Graph Editor - Core Library

pub mod classifier;
pub mod clipboard;
pub mod compatibility;
pub mod config;
pub mod context;
pub mod diagram;
pub mod edit;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod ids;
pub mod integrity;
pub mod relationship;
pub mod repository;
pub mod selection;
pub mod snapshot;
pub mod undo;

// Re-export main types for convenience
pub use classifier::{Classifier, ClassifierKind, DiagramKind};
pub use clipboard::{Clipboard, ClipboardNode, PastedElement};
pub use compatibility::{check_flow_limits, FlowLimit, FlowLimits};
pub use config::EditorConfig;
pub use context::EditorContext;
pub use diagram::{Diagram, Placement};
pub use edit::{
    BoundsChange, DeleteClosureEdit, Edit, Insertion, MoveEdit, PlacedElement, ReconnectLinkEdit,
    RenameClassifierEdit,
};
pub use element::{Endpoint, GraphicalElement, Link, Node, Note};
pub use error::{EditError, EditResult};
pub use event::{ModelChange, ModelEvent};
pub use geometry::{Point, Rectangle};
pub use ids::{ClassifierId, ElementId, RelationshipId};
pub use integrity::{
    IntegrityChecker, IntegrityIssue, IntegrityIssueType, IntegrityReport, IntegritySeverity,
};
pub use relationship::{Direction, LinkKind, LinkProperties, Relationship, Role};
pub use repository::{CentralRepository, Repository};
pub use selection::{EndpointDrag, InteractionState, SelectionController};
pub use snapshot::DiagramSnapshot;
pub use undo::UndoManager;
