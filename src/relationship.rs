use crate::{ClassifierId, DiagramKind, RelationshipId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of binary relationship a link stands for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Association,
    /// Aggregation; composition is `LinkProperties::composite`
    Aggregation,
    AssociationClass,
    Generalization,
    Dependency,
    Realization,
    UcAssociation,
    UcInclude,
    UcExtend,
    UcGeneralization,
    ControlFlow,
}

impl LinkKind {
    pub const ALL: [LinkKind; 11] = [
        LinkKind::Association,
        LinkKind::Aggregation,
        LinkKind::AssociationClass,
        LinkKind::Generalization,
        LinkKind::Dependency,
        LinkKind::Realization,
        LinkKind::UcAssociation,
        LinkKind::UcInclude,
        LinkKind::UcExtend,
        LinkKind::UcGeneralization,
        LinkKind::ControlFlow,
    ];

    /// Whether links of this kind may be drawn on a diagram of the given kind
    pub fn allowed_in(self, diagram: DiagramKind) -> bool {
        match diagram {
            DiagramKind::Class => matches!(
                self,
                LinkKind::Association
                    | LinkKind::Aggregation
                    | LinkKind::AssociationClass
                    | LinkKind::Generalization
                    | LinkKind::Dependency
                    | LinkKind::Realization
            ),
            DiagramKind::Conceptual => matches!(
                self,
                LinkKind::Association
                    | LinkKind::Aggregation
                    | LinkKind::AssociationClass
                    | LinkKind::Generalization
            ),
            DiagramKind::UseCase => matches!(
                self,
                LinkKind::UcAssociation
                    | LinkKind::UcInclude
                    | LinkKind::UcExtend
                    | LinkKind::UcGeneralization
            ),
            DiagramKind::Activity => self == LinkKind::ControlFlow,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LinkKind::Association => "Association",
            LinkKind::Aggregation => "Aggregation",
            LinkKind::AssociationClass => "Association class",
            LinkKind::Generalization => "Generalization",
            LinkKind::Dependency => "Dependency",
            LinkKind::Realization => "Realization",
            LinkKind::UcAssociation => "Use case association",
            LinkKind::UcInclude => "Include",
            LinkKind::UcExtend => "Extend",
            LinkKind::UcGeneralization => "Use case generalization",
            LinkKind::ControlFlow => "Control flow",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Navigability of an association
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Unspecified,
    SourceToTarget,
    TargetToSource,
    Bidirectional,
}

/// Role played by one end of a relationship
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Role {
    pub name: Option<String>,
    pub multiplicity: Option<String>,
}

impl Role {
    pub fn new(name: impl Into<String>, multiplicity: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            multiplicity: Some(multiplicity.into()),
        }
    }
}

/// Decorative properties carried over on reconnection and paste
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LinkProperties {
    pub name: Option<String>,
    pub stereotype: Option<String>,
    pub direction: Direction,
    pub source_role: Role,
    pub target_role: Role,
    /// Aggregation drawn as composition
    pub composite: bool,
    /// Extension points of an extend relationship
    pub extension_points: Vec<String>,
    /// Attributes of an association class
    pub attributes: Vec<String>,
    /// Guard of a control flow
    pub guard: Option<String>,
}

impl LinkProperties {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Domain relationship object backing a link.
///
/// Relationships are never edited in place: reconnection and paste build a
/// fresh relationship with a new id via [`Relationship::with_endpoints`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub id: RelationshipId,
    pub kind: LinkKind,

    /// Source classifier (for generalizations, the specialised one)
    pub source: ClassifierId,

    /// Target classifier (for generalizations, the general one)
    pub target: ClassifierId,

    pub properties: LinkProperties,
}

impl Relationship {
    /// Create a new relationship
    pub fn new(
        kind: LinkKind,
        source: ClassifierId,
        target: ClassifierId,
        properties: LinkProperties,
    ) -> Self {
        Self {
            id: RelationshipId::new(),
            kind,
            source,
            target,
            properties,
        }
    }

    /// Copy of this relationship between other classifiers, with a fresh id
    pub fn with_endpoints(&self, source: ClassifierId, target: ClassifierId) -> Self {
        Self::new(self.kind, source, target, self.properties.clone())
    }

    /// Check if this relationship involves a given classifier
    pub fn involves(&self, classifier: ClassifierId) -> bool {
        self.source == classifier || self.target == classifier
    }

    /// Check if this relationship starts from a given classifier
    pub fn starts_from(&self, classifier: ClassifierId) -> bool {
        self.source == classifier
    }

    /// Check if this relationship ends at a given classifier
    pub fn ends_at(&self, classifier: ClassifierId) -> bool {
        self.target == classifier
    }

    /// Same kind between the same ordered pair of classifiers
    pub fn duplicates(&self, kind: LinkKind, source: ClassifierId, target: ClassifierId) -> bool {
        self.kind == kind && self.source == source && self.target == target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_direction() {
        let a = ClassifierId::new();
        let b = ClassifierId::new();
        let other = ClassifierId::new();
        let rel = Relationship::new(LinkKind::Association, a, b, LinkProperties::default());

        assert!(rel.involves(a));
        assert!(rel.involves(b));
        assert!(!rel.involves(other));

        assert!(rel.starts_from(a));
        assert!(!rel.starts_from(b));
        assert!(rel.ends_at(b));
        assert!(!rel.ends_at(a));
    }

    #[test]
    fn test_with_endpoints_keeps_properties() {
        let a = ClassifierId::new();
        let b = ClassifierId::new();
        let c = ClassifierId::new();
        let mut props = LinkProperties::named("owns");
        props.source_role = Role::new("owner", "1");
        props.target_role = Role::new("items", "0..*");
        props.direction = Direction::SourceToTarget;
        props.composite = true;

        let rel = Relationship::new(LinkKind::Aggregation, a, b, props.clone());
        let moved = rel.with_endpoints(c, b);

        assert_ne!(moved.id, rel.id);
        assert_eq!(moved.kind, LinkKind::Aggregation);
        assert_eq!(moved.source, c);
        assert_eq!(moved.target, b);
        assert_eq!(moved.properties, props);
    }

    #[test]
    fn test_kinds_per_diagram() {
        assert!(LinkKind::Realization.allowed_in(DiagramKind::Class));
        assert!(!LinkKind::Realization.allowed_in(DiagramKind::Conceptual));
        assert!(LinkKind::UcExtend.allowed_in(DiagramKind::UseCase));
        assert!(!LinkKind::Association.allowed_in(DiagramKind::UseCase));
        assert!(LinkKind::ControlFlow.allowed_in(DiagramKind::Activity));
    }
}
