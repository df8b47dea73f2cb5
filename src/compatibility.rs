//! Endpoint compatibility rules per link kind.
//!
//! Every rule here is a pure function of classifier kinds; nothing in this
//! module reads or writes a diagram. Diagram-dependent checks (duplicates,
//! flow fan-in/out counts) are layered on top by [`crate::Diagram`].

use crate::{ClassifierKind, EditError, EditResult, LinkKind};

impl LinkKind {
    /// Whether a link of this kind may join a node to itself
    pub fn allows_self_loop(self) -> bool {
        matches!(
            self,
            LinkKind::Association
                | LinkKind::Aggregation
                | LinkKind::AssociationClass
                | LinkKind::Dependency
        )
    }

    /// Check a (source, target) pair of classifier kinds against the rule table.
    ///
    /// `same_node` is true when both ends would be the same node.
    pub fn check_endpoints(
        self,
        source: ClassifierKind,
        target: ClassifierKind,
        same_node: bool,
    ) -> EditResult<()> {
        let incompatible = |reason| EditError::IncompatibleEndpoint { kind: self, reason };

        match self {
            LinkKind::Association
            | LinkKind::Aggregation
            | LinkKind::AssociationClass
            | LinkKind::Dependency => {
                if !source.is_class_like() {
                    return Err(incompatible("the source must be a class or interface"));
                }
                if !target.is_class_like() {
                    return Err(incompatible("the target must be a class or interface"));
                }
            }
            LinkKind::Generalization => {
                if !source.is_class_like() || !target.is_class_like() {
                    return Err(incompatible("both ends must be classes or interfaces"));
                }
                if source != target {
                    let mixes_class_and_interface = matches!(
                        (source, target),
                        (ClassifierKind::Class, ClassifierKind::Interface)
                            | (ClassifierKind::Interface, ClassifierKind::Class)
                    );
                    if mixes_class_and_interface {
                        return Err(EditError::MixedGeneralization);
                    }
                    return Err(incompatible("both ends must be the same kind of classifier"));
                }
            }
            LinkKind::Realization => {
                if source != ClassifierKind::Class {
                    return Err(incompatible("the source must be a Class"));
                }
                if target != ClassifierKind::Interface {
                    return Err(incompatible("the target must be an Interface"));
                }
            }
            LinkKind::UcAssociation => {
                if source != ClassifierKind::Actor {
                    return Err(incompatible("the source must be an Actor"));
                }
                if target != ClassifierKind::UseCase {
                    return Err(incompatible("the target must be a Use case"));
                }
            }
            LinkKind::UcInclude | LinkKind::UcExtend => {
                if source != ClassifierKind::UseCase || target != ClassifierKind::UseCase {
                    return Err(incompatible("both ends must be Use cases"));
                }
            }
            LinkKind::UcGeneralization => {
                if !matches!(source, ClassifierKind::Actor | ClassifierKind::UseCase) {
                    return Err(incompatible("the source must be an Actor or a Use case"));
                }
                if target != source {
                    return Err(incompatible("Actors and Use cases cannot be mixed"));
                }
            }
            LinkKind::ControlFlow => {
                let flow_node = |k: ClassifierKind| k.is_activity_node() && !k.is_container();
                if !flow_node(source) || !flow_node(target) {
                    return Err(incompatible("both ends must be activity nodes"));
                }
                if source.is_final() {
                    return Err(incompatible("a final node cannot have outgoing flows"));
                }
                if target == ClassifierKind::Initial {
                    return Err(incompatible("an initial node cannot have incoming flows"));
                }
            }
        }

        if same_node && !self.allows_self_loop() {
            return Err(EditError::SelfLoop(self));
        }

        Ok(())
    }

    /// Boolean form of [`LinkKind::check_endpoints`]
    pub fn accepts(self, source: ClassifierKind, target: ClassifierKind, same_node: bool) -> bool {
        self.check_endpoints(source, target, same_node).is_ok()
    }
}

/// Upper bound on control flows at one side of an activity node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowLimit {
    pub max: usize,
    /// Node kind the user should insert instead
    pub alternative: ClassifierKind,
}

/// Control-flow fan-in/out bounds for a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowLimits {
    pub incoming: Option<FlowLimit>,
    pub outgoing: Option<FlowLimit>,
}

impl ClassifierKind {
    pub fn flow_limits(self) -> FlowLimits {
        let one = |alternative| Some(FlowLimit { max: 1, alternative });
        match self {
            ClassifierKind::Action => FlowLimits {
                incoming: one(ClassifierKind::Merge),
                outgoing: one(ClassifierKind::Fork),
            },
            ClassifierKind::Initial | ClassifierKind::Merge | ClassifierKind::Join => FlowLimits {
                incoming: None,
                outgoing: one(ClassifierKind::Fork),
            },
            ClassifierKind::Decision => FlowLimits {
                incoming: one(ClassifierKind::Merge),
                outgoing: None,
            },
            ClassifierKind::Fork => FlowLimits {
                incoming: one(ClassifierKind::Join),
                outgoing: None,
            },
            _ => FlowLimits::default(),
        }
    }
}

fn with_article(label: &str) -> String {
    let article = match label.chars().next() {
        Some('A' | 'E' | 'I' | 'O' | 'U') => "An",
        _ => "A",
    };
    format!("{} {}", article, label)
}

/// Reject a new control flow that would exceed a fan-out or fan-in bound.
///
/// `existing_outgoing` counts flows already leaving the source node and
/// `existing_incoming` flows already entering the target node, both
/// excluding the flow being added or reconnected.
pub fn check_flow_limits(
    source: ClassifierKind,
    existing_outgoing: usize,
    target: ClassifierKind,
    existing_incoming: usize,
) -> EditResult<()> {
    if let Some(limit) = source.flow_limits().outgoing {
        if existing_outgoing >= limit.max {
            return Err(EditError::FlowLimit(format!(
                "{} can have at most one outgoing control flow. Use a {} to split the flow.",
                with_article(source.label()),
                limit.alternative.label()
            )));
        }
    }

    if let Some(limit) = target.flow_limits().incoming {
        if existing_incoming >= limit.max {
            return Err(EditError::FlowLimit(format!(
                "{} can have at most one incoming control flow. Use a {} to combine flows.",
                with_article(target.label()),
                limit.alternative.label()
            )));
        }
    }

    Ok(())
}
