//! Key-value key types and traits.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use derive_more::{Display, Into};
use pieceflow_core::{CollectionId, FlowVersionId};

use crate::Error;

/// Marker trait for KV key types.
///
/// This trait defines how keys are formatted for storage in NATS KV.
pub trait KvKey: fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// Returns `true` if `key` is accepted by the NATS KV API.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.ends_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'/' | b'_' | b'=' | b'.'))
}

/// Key of a recurring job: the flow version id, stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Into)]
#[display("{_0}")]
pub struct JobKey(FlowVersionId);

impl KvKey for JobKey {}

impl JobKey {
    /// Creates a key, rejecting ids NATS cannot store as a key.
    pub fn new(flow_version_id: FlowVersionId) -> Result<Self, Error> {
        if !is_valid_key(flow_version_id.as_str()) {
            return Err(Error::invalid_key(
                flow_version_id.as_str(),
                "flow version id contains characters not allowed in KV keys",
            ));
        }
        Ok(Self(flow_version_id))
    }
}

/// Key of one context entry: `<collection>.<key>`, both segments base64url.
///
/// Encoding keeps arbitrary piece-chosen keys valid and makes the collection
/// prefix unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    collection_id: CollectionId,
    key: String,
}

impl KvKey for ContextKey {}

impl ContextKey {
    /// Creates a key inside `collection_id`'s partition.
    pub fn new(collection_id: CollectionId, key: impl Into<String>) -> Result<Self, Error> {
        let key = key.into();
        if collection_id.as_str().is_empty() {
            return Err(Error::invalid_key(key, "collection id cannot be empty"));
        }
        if key.is_empty() {
            return Err(Error::invalid_key(key, "context key cannot be empty"));
        }
        Ok(Self { collection_id, key })
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            URL_SAFE_NO_PAD.encode(self.collection_id.as_str()),
            URL_SAFE_NO_PAD.encode(&self.key)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_key_is_verbatim_flow_version_id() {
        let key = JobKey::new(FlowVersionId::from("fv_01HX9")).unwrap();
        assert_eq!(key.to_string(), "fv_01HX9");
        assert_eq!(FlowVersionId::from(key), FlowVersionId::from("fv_01HX9"));
    }

    #[test]
    fn test_job_key_rejects_invalid_characters() {
        assert!(JobKey::new(FlowVersionId::from("flow version")).is_err());
        assert!(JobKey::new(FlowVersionId::from(".hidden")).is_err());
        assert!(JobKey::new(FlowVersionId::from("")).is_err());
    }

    #[test]
    fn test_context_key_is_valid_nats_key() {
        let key = ContextKey::new(CollectionId::from("c1"), "last poll: cursor/é").unwrap();
        let encoded = key.to_string();
        assert!(is_valid_key(&encoded));
        assert_eq!(
            encoded,
            format!(
                "{}.{}",
                URL_SAFE_NO_PAD.encode("c1"),
                URL_SAFE_NO_PAD.encode("last poll: cursor/é")
            )
        );
    }

    #[test]
    fn test_context_keys_do_not_collide_across_collections() {
        let a = ContextKey::new(CollectionId::from("a.b"), "c").unwrap();
        let b = ContextKey::new(CollectionId::from("a"), "b.c").unwrap();
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_context_key_rejects_empty_parts() {
        assert!(ContextKey::new(CollectionId::from(""), "k").is_err());
        assert!(ContextKey::new(CollectionId::from("c1"), "").is_err());
    }
}
