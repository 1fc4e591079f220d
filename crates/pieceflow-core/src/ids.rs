//! Opaque identifiers threaded through to external systems.
//!
//! Identifiers carry no structure beyond string equality. They address queue
//! keys, context store scopes and webhook URLs.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[derive(Debug, Display, From, Into)]
        #[display("{_0}")]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(
    /// Identity of a flow, stable across versions.
    FlowId
);

opaque_id!(
    /// Identity of one immutable flow version. Keys recurring jobs.
    FlowVersionId
);

opaque_id!(
    /// Identity of a collection of flows. Scopes trigger context stores.
    CollectionId
);

opaque_id!(
    /// Identity of one published collection version.
    CollectionVersionId
);

opaque_id!(
    /// Identity of the owning project.
    ProjectId
);

opaque_id!(
    /// Identity of a user.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_string() {
        let id = FlowVersionId::new("fv_123");
        assert_eq!(id.to_string(), "fv_123");
        assert_eq!(id.as_str(), "fv_123");
    }

    #[test]
    fn test_serde_transparent() {
        let id = FlowId::from("flow-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"flow-1\"");

        let parsed: FlowId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_string_conversions() {
        let id: CollectionId = String::from("col").into();
        let raw: String = id.clone().into();
        assert_eq!(raw, "col");
        assert_eq!(id, CollectionId::from("col"));
    }
}
