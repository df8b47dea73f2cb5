use crate::{Classifier, ClassifierId, ElementId, GraphicalElement, Link, Node, Note};
use std::collections::HashMap;

/// A copied node together with the nodes nested in it
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardNode {
    pub node: Node,
    pub children: Vec<ClipboardNode>,
}

impl ClipboardNode {
    fn visit<'a>(&'a self, out: &mut Vec<&'a Node>) {
        out.push(&self.node);
        for child in &self.children {
            child.visit(out);
        }
    }
}

/// A fresh element produced by pasting, with the (fresh) container it goes into
#[derive(Debug, Clone, PartialEq)]
pub struct PastedElement {
    pub container: Option<ElementId>,
    pub element: GraphicalElement,
}

/// Copied sub-graph awaiting paste.
///
/// Holds snapshots of the copied nodes, the links whose both ends were
/// copied, the copied notes and the classifiers the nodes wrap. The same
/// contents can be pasted any number of times; each paste is displaced a
/// little further.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    nodes: Vec<ClipboardNode>,
    links: Vec<Link>,
    notes: Vec<Note>,
    classifiers: HashMap<ClassifierId, Classifier>,
    paste_count: u32,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the clipboard contents
    pub fn set_contents(
        &mut self,
        nodes: Vec<ClipboardNode>,
        links: Vec<Link>,
        notes: Vec<Note>,
        classifiers: Vec<Classifier>,
    ) {
        self.nodes = nodes;
        self.links = links;
        self.notes = notes;
        self.classifiers = classifiers.into_iter().map(|c| (c.id, c)).collect();
        self.paste_count = 0;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty() && self.notes.is_empty()
    }

    /// Number of top-level entries; each becomes one paste edit
    pub fn len(&self) -> usize {
        self.nodes.len() + self.links.len() + self.notes.len()
    }

    pub fn nodes(&self) -> &[ClipboardNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Snapshot of a copied node's classifier
    pub fn classifier(&self, id: ClassifierId) -> Option<&Classifier> {
        self.classifiers.get(&id)
    }

    /// Every copied node, nested ones included
    pub fn all_nodes(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        for entry in &self.nodes {
            entry.visit(&mut out);
        }
        out
    }

    /// Build fresh elements for one paste, one group per top-level entry.
    ///
    /// Groups come nodes first, then links, then notes, so every reference
    /// points at an element pasted earlier. Within a group containers
    /// precede their contents. Nodes keep their classifier; links get fresh
    /// relationships carrying the original properties.
    pub fn instantiate(&mut self, offset: (f32, f32)) -> Vec<Vec<PastedElement>> {
        self.paste_count += 1;
        let dx = offset.0 * self.paste_count as f32;
        let dy = offset.1 * self.paste_count as f32;

        let mut fresh: HashMap<ElementId, Node> = HashMap::new();
        let mut groups = Vec::with_capacity(self.len());

        for entry in &self.nodes {
            let mut group = Vec::new();
            Self::instantiate_node(entry, None, dx, dy, &mut fresh, &mut group);
            groups.push(group);
        }

        for link in &self.links {
            let (Some(source), Some(target)) = (fresh.get(&link.source()), fresh.get(&link.target()))
            else {
                continue;
            };
            groups.push(vec![PastedElement {
                container: None,
                element: link.create_with_new_endpoints(source, target).into(),
            }]);
        }

        for note in &self.notes {
            let copy = Note::new(
                note.text.clone(),
                note.bounds.translated(dx, dy),
                note.anchor
                    .and_then(|anchor| fresh.get(&anchor))
                    .map(|node| node.id),
            );
            groups.push(vec![PastedElement {
                container: None,
                element: copy.into(),
            }]);
        }

        groups
    }

    fn instantiate_node(
        entry: &ClipboardNode,
        container: Option<ElementId>,
        dx: f32,
        dy: f32,
        fresh: &mut HashMap<ElementId, Node>,
        group: &mut Vec<PastedElement>,
    ) {
        let copy = entry.node.duplicate(dx, dy);
        let id = copy.id;
        fresh.insert(entry.node.id, copy.clone());
        group.push(PastedElement {
            container,
            element: copy.into(),
        });

        for child in &entry.children {
            Self::instantiate_node(child, Some(id), dx, dy, fresh, group);
        }
    }
}
