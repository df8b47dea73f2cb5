use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Declares a typed identifier backed by a ULID.
macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Allocate a fresh identifier
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Wrap an existing ULID (useful for testing and deserialization)
            pub fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            pub fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ulid_id!(
    /// Identity of a graphical element (node, link or note) in a diagram
    ElementId
);

ulid_id!(
    /// Identity of a domain classifier held by the repository
    ClassifierId
);

ulid_id!(
    /// Identity of a domain relationship object
    RelationshipId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = ElementId::new();
        let b = ElementId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_serializes_as_plain_ulid() {
        let ulid = Ulid::new();
        let id = ClassifierId::from_ulid(ulid);

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", ulid));

        let back: ClassifierId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert_eq!(back.as_ulid(), ulid);
    }
}
