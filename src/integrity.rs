use crate::{Diagram, ElementId, GraphicalElement, Link, Repository};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Integrity issue severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegritySeverity {
    Warning, // Domain registry out of step with the diagram
    Error,   // Broken reference inside the diagram
}

/// Types of integrity issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrityIssueType {
    DanglingEndpoint,
    DanglingAnchor,
    StaleIncidence,
    MultipleContainers,
    ContainmentCycle,
    MissingClassifier,
    UnregisteredRelationship,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityIssue {
    pub severity: IntegritySeverity,
    pub message: String,
    pub affected_elements: Vec<ElementId>,
    pub issue_type: IntegrityIssueType,
}

/// Outcome of an integrity check
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn add_issue(&mut self, issue: IntegrityIssue) {
        self.issues.push(issue);
    }

    fn error(&mut self, issue_type: IntegrityIssueType, message: String, affected: Vec<ElementId>) {
        self.add_issue(IntegrityIssue {
            severity: IntegritySeverity::Error,
            message,
            affected_elements: affected,
            issue_type,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == IntegritySeverity::Error)
    }

    /// No issue of any severity
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn of_type(&self, issue_type: IntegrityIssueType) -> Vec<&IntegrityIssue> {
        self.issues
            .iter()
            .filter(|i| i.issue_type == issue_type)
            .collect()
    }

    /// Elements mentioned by any issue, with the worst severity seen for each
    pub fn elements_with_issues(&self) -> HashMap<ElementId, IntegritySeverity> {
        let mut elements = HashMap::new();
        for issue in &self.issues {
            for id in &issue.affected_elements {
                elements
                    .entry(*id)
                    .and_modify(|severity: &mut IntegritySeverity| {
                        if issue.severity == IntegritySeverity::Error {
                            *severity = IntegritySeverity::Error;
                        }
                    })
                    .or_insert(issue.severity);
            }
        }
        elements
    }
}

/// Referential-integrity checker for diagrams
pub struct IntegrityChecker;

impl IntegrityChecker {
    /// Check the diagram's internal references
    pub fn check(diagram: &Diagram) -> IntegrityReport {
        let mut report = IntegrityReport::new();

        for element in diagram.all_elements() {
            match element {
                GraphicalElement::Link(link) => Self::check_link(diagram, link, &mut report),
                GraphicalElement::Note(note) => {
                    if let Some(anchor) = note.anchor {
                        if diagram.node(anchor).is_none() {
                            report.error(
                                IntegrityIssueType::DanglingAnchor,
                                format!("Note {} is anchored to missing node {}", note.id, anchor),
                                vec![note.id],
                            );
                        }
                    }
                }
                GraphicalElement::Node(node) => {
                    for link in diagram.links_of(node.id) {
                        let touches = diagram.link(*link).is_some_and(|l| l.involves(node.id));
                        if !touches {
                            report.error(
                                IntegrityIssueType::StaleIncidence,
                                format!("Node {} lists link {} which does not touch it", node.id, link),
                                vec![node.id, *link],
                            );
                        }
                    }
                }
            }
        }

        Self::check_containment(diagram, &mut report);
        report
    }

    /// Check the diagram and its agreement with the domain repository
    pub fn check_with_repository(diagram: &Diagram, repo: &dyn Repository) -> IntegrityReport {
        let mut report = Self::check(diagram);

        for node in diagram.nodes() {
            if repo.classifier(node.classifier).is_none() {
                report.error(
                    IntegrityIssueType::MissingClassifier,
                    format!("Node {} wraps unknown classifier {}", node.id, node.classifier),
                    vec![node.id],
                );
            }
        }

        for link in diagram.links() {
            if repo.relationship(link.relationship().id).is_none() {
                report.add_issue(IntegrityIssue {
                    severity: IntegritySeverity::Warning,
                    message: format!("Relationship of link {} is not registered", link.id),
                    affected_elements: vec![link.id],
                    issue_type: IntegrityIssueType::UnregisteredRelationship,
                });
            }
        }

        report
    }

    fn check_link(diagram: &Diagram, link: &Link, report: &mut IntegrityReport) {
        for end in [link.source(), link.target()] {
            if diagram.node(end).is_none() {
                report.error(
                    IntegrityIssueType::DanglingEndpoint,
                    format!("Link {} points at missing node {}", link.id, end),
                    vec![link.id],
                );
            } else if !diagram.links_of(end).contains(&link.id) {
                report.error(
                    IntegrityIssueType::StaleIncidence,
                    format!("Node {} does not list its link {}", end, link.id),
                    vec![end, link.id],
                );
            }
        }
    }

    fn check_containment(diagram: &Diagram, report: &mut IntegrityReport) {
        let mut containers: HashMap<ElementId, Vec<ElementId>> = HashMap::new();
        for node in diagram.nodes() {
            for child in &node.contents {
                containers.entry(*child).or_default().push(node.id);
            }
        }

        for (child, parents) in &containers {
            if parents.len() > 1 {
                let mut affected = vec![*child];
                affected.extend(parents.iter().copied());
                report.error(
                    IntegrityIssueType::MultipleContainers,
                    format!("Element {} is nested in {} containers", child, parents.len()),
                    affected,
                );
            }
        }

        let mut visited = HashSet::new();
        let mut stack = HashSet::new();
        for node in diagram.nodes() {
            let mut cycle = Vec::new();
            if !visited.contains(&node.id)
                && Self::dfs_detect_cycle(diagram, node.id, &mut visited, &mut stack, &mut cycle)
            {
                report.error(
                    IntegrityIssueType::ContainmentCycle,
                    format!("Containment cycle involving {} elements", cycle.len()),
                    cycle,
                );
                return;
            }
        }
    }

    /// DFS over containment edges
    fn dfs_detect_cycle(
        diagram: &Diagram,
        id: ElementId,
        visited: &mut HashSet<ElementId>,
        stack: &mut HashSet<ElementId>,
        cycle: &mut Vec<ElementId>,
    ) -> bool {
        visited.insert(id);
        stack.insert(id);

        for child in diagram.contents(id) {
            if !visited.contains(child) {
                if Self::dfs_detect_cycle(diagram, *child, visited, stack, cycle) {
                    cycle.push(id);
                    return true;
                }
            } else if stack.contains(child) {
                cycle.push(id);
                cycle.push(*child);
                return true;
            }
        }

        stack.remove(&id);
        false
    }
}

impl Diagram {
    pub fn check_integrity(&self) -> IntegrityReport {
        IntegrityChecker::check(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CentralRepository, Classifier, ClassifierKind, DiagramKind, LinkKind, LinkProperties,
        Node, Note, Rectangle,
    };

    fn populated() -> (Diagram, CentralRepository) {
        let mut diagram = Diagram::new("uc", DiagramKind::UseCase);
        let mut repo = CentralRepository::new();

        let actor = Classifier::new(ClassifierKind::Actor, "Clerk");
        let system = Classifier::new(ClassifierKind::System, "Shop");
        let use_case = Classifier::new(ClassifierKind::UseCase, "Checkout");
        let actor_node = Node::new(&actor, Rectangle::new(0.0, 0.0, 50.0, 80.0));
        let system_node = Node::new(&system, Rectangle::new(100.0, 0.0, 300.0, 300.0));
        let use_case_node = Node::new(&use_case, Rectangle::new(150.0, 50.0, 100.0, 40.0));
        for classifier in [actor, system, use_case] {
            repo.add_classifier(classifier).unwrap();
        }

        let link = Link::connect(
            LinkKind::UcAssociation,
            &actor_node,
            &use_case_node,
            LinkProperties::default(),
        );
        let note = Note::new("main flow", Rectangle::new(0.0, 200.0, 80.0, 40.0), Some(actor_node.id));
        let system_id = system_node.id;

        diagram.add_graphical_element(actor_node).unwrap();
        diagram.add_graphical_element(system_node).unwrap();
        diagram.add_nested_element(system_id, use_case_node).unwrap();
        diagram.add_graphical_element(note).unwrap();
        repo.add_relationship(link.relationship().clone());
        diagram.add_graphical_element(link).unwrap();

        (diagram, repo)
    }

    #[test]
    fn test_consistent_diagram() {
        let (diagram, repo) = populated();
        assert!(diagram.check_integrity().is_consistent());
        assert!(IntegrityChecker::check_with_repository(&diagram, &repo).is_consistent());
    }

    #[test]
    fn test_repository_drift_reported() {
        let (diagram, mut repo) = populated();
        let link = diagram.links().next().unwrap();
        repo.remove_relationship(link.relationship().id);
        let actor = repo
            .find_classifier(ClassifierKind::Actor, "Clerk")
            .unwrap();
        repo.remove_classifier(actor);

        let report = IntegrityChecker::check_with_repository(&diagram, &repo);
        assert!(report.has_errors());
        assert_eq!(report.of_type(IntegrityIssueType::MissingClassifier).len(), 1);
        assert_eq!(report.of_type(IntegrityIssueType::UnregisteredRelationship).len(), 1);

        let flagged = report.elements_with_issues();
        assert_eq!(flagged.get(&link.id), Some(&IntegritySeverity::Warning));
    }
}
