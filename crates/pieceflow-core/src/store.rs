//! Key-value storage scoped to one trigger instance.

use std::sync::Arc;

use serde_json::Value;

use crate::Result;
use crate::ids::CollectionId;

/// Scoped key-value handle passed to piece triggers.
///
/// Pieces keep idempotency state here, such as the last cursor a polling
/// trigger has seen.
#[async_trait::async_trait]
pub trait ContextStore: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Deletes `key`. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Creates context stores scoped to a collection.
pub trait ContextStoreFactory: Send + Sync {
    /// Returns a store whose keys cannot collide with other collections.
    fn create_context_store(&self, collection_id: &CollectionId) -> Arc<dyn ContextStore>;
}
