use crate::{Diagram, DiagramKind, EditResult, ElementId, GraphicalElement, PlacedElement};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Serializable form of a diagram.
///
/// Entries are stored in an order that can be replayed into an empty
/// diagram: nodes (containers before their contents), then links, then
/// notes. Each entry keeps its exact placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramSnapshot {
    pub name: String,
    pub kind: DiagramKind,
    pub entries: Vec<PlacedElement>,
}

impl DiagramSnapshot {
    pub fn from_diagram(diagram: &Diagram) -> Self {
        let mut nodes = Vec::new();
        let mut links = Vec::new();
        let mut notes = Vec::new();

        let mut pending: Vec<ElementId> = diagram.top_level_ids().into_iter().rev().collect();
        while let Some(id) = pending.pop() {
            let (Some(element), Some(placement)) = (diagram.element(id), diagram.placement_of(id))
            else {
                continue;
            };
            let entry = PlacedElement::new(placement, snapshot_element(element));
            match element {
                GraphicalElement::Node(node) => {
                    nodes.push(entry);
                    pending.extend(node.contents.iter().rev().copied());
                }
                GraphicalElement::Link(_) => links.push(entry),
                GraphicalElement::Note(_) => notes.push(entry),
            }
        }

        Self {
            name: diagram.name().to_string(),
            kind: diagram.kind(),
            entries: nodes.into_iter().chain(links).chain(notes).collect(),
        }
    }

    /// Rebuild the diagram, with every element at its recorded placement
    pub fn to_diagram(&self) -> EditResult<Diagram> {
        let mut diagram = Diagram::new(self.name.clone(), self.kind);
        for entry in &self.entries {
            diagram.insert_element(entry.placement, entry.element.clone())?;
        }
        diagram.clear_events();
        Ok(diagram)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .with_context(|| format!("Failed to serialize diagram: {}", self.name))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse diagram snapshot")
    }
}

/// Nested contents are rebuilt from the nested entries themselves
fn snapshot_element(element: &GraphicalElement) -> GraphicalElement {
    match element {
        GraphicalElement::Node(node) => {
            let mut node = node.clone();
            node.contents.clear();
            GraphicalElement::Node(node)
        }
        other => other.clone(),
    }
}

impl Diagram {
    pub fn snapshot(&self) -> DiagramSnapshot {
        DiagramSnapshot::from_diagram(self)
    }

    pub fn from_snapshot(snapshot: &DiagramSnapshot) -> EditResult<Self> {
        snapshot.to_diagram()
    }
}
