//! Opaque identifier types used across the allocation engine.
//!
//! All entities are identified by opaque 128-bit identifiers (`Uuid`),
//! newtype-wrapped per entity kind so node, edge, and run identifiers can
//! never be mixed up at a call site.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
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

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(NodeId, "Identifier of a node (product/resource/shared/...).");
uuid_id!(EdgeId, "Identifier of an edge (parent -> child relationship).");
uuid_id!(OverrideId, "Identifier of an edge strategy override.");
uuid_id!(RunId, "Identifier of a batch allocation run.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_id_kinds_do_not_compare() {
        let n = NodeId::new();
        let e = EdgeId::new();
        // Compile-time distinctness: these are different types, so no
        // `==` between NodeId and EdgeId is possible. This test just
        // checks Display/round-trip behavior.
        assert_eq!(NodeId::from_uuid(n.as_uuid()), n);
        assert_eq!(EdgeId::from_uuid(e.as_uuid()), e);
    }
}
