use crate::ElementId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A model change notification with timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEvent {
    pub timestamp: DateTime<Utc>,
    pub change: ModelChange,
}

impl ModelEvent {
    /// Create a new event with the current timestamp
    pub fn new(change: ModelChange) -> Self {
        Self {
            timestamp: Utc::now(),
            change,
        }
    }
}

/// Structural changes observers (views, model trees) react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelChange {
    ElementAdded {
        id: ElementId,
        /// Container the element was nested into, if any
        container: Option<ElementId>,
    },

    ElementRemoved {
        id: ElementId,
        container: Option<ElementId>,
    },

    ElementMoved {
        id: ElementId,
        dx: f32,
        dy: f32,
    },
}

impl ModelChange {
    pub fn element(&self) -> ElementId {
        match self {
            ModelChange::ElementAdded { id, .. }
            | ModelChange::ElementRemoved { id, .. }
            | ModelChange::ElementMoved { id, .. } => *id,
        }
    }
}
