//! Collection-scoped piece trigger context in NATS KV.

use std::fmt;
use std::sync::Arc;

use pieceflow_core::{CollectionId, ContextStore, ContextStoreFactory, ErrorKind};
use serde_json::Value;

use crate::kv::{ContextKey, KvStore, TriggerContextBucket};

type ContextKvStore = KvStore<ContextKey, Value, TriggerContextBucket>;

/// [`ContextStore`] whose keys live in one collection's partition of the
/// `trigger_context` bucket.
#[derive(Clone)]
pub struct NatsContextStore {
    collection_id: CollectionId,
    store: ContextKvStore,
}

impl fmt::Debug for NatsContextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NatsContextStore")
            .field("collection_id", &self.collection_id)
            .finish_non_exhaustive()
    }
}

impl NatsContextStore {
    fn key(&self, key: &str) -> pieceflow_core::Result<ContextKey> {
        ContextKey::new(self.collection_id.clone(), key)
            .map_err(|e| e.into_core(ErrorKind::ContextStoreFailure))
    }
}

#[async_trait::async_trait]
impl ContextStore for NatsContextStore {
    async fn get(&self, key: &str) -> pieceflow_core::Result<Option<Value>> {
        self.store
            .get(&self.key(key)?)
            .await
            .map_err(|e| e.into_core(ErrorKind::ContextStoreFailure))
    }

    async fn put(&self, key: &str, value: Value) -> pieceflow_core::Result<()> {
        self.store
            .put(&self.key(key)?, &value)
            .await
            .map_err(|e| e.into_core(ErrorKind::ContextStoreFailure))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> pieceflow_core::Result<()> {
        self.store
            .delete(&self.key(key)?)
            .await
            .map_err(|e| e.into_core(ErrorKind::ContextStoreFailure))
    }
}

/// Hands out [`NatsContextStore`]s sharing one bucket handle.
#[derive(Clone)]
pub struct NatsContextStoreFactory {
    store: ContextKvStore,
}

impl fmt::Debug for NatsContextStoreFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NatsContextStoreFactory")
            .field("bucket", &self.store.bucket_name())
            .finish()
    }
}

impl NatsContextStoreFactory {
    /// Wraps an opened context bucket.
    pub fn new(store: ContextKvStore) -> Self {
        Self { store }
    }

    /// Returns a concrete store for `collection_id`.
    pub fn store(&self, collection_id: &CollectionId) -> NatsContextStore {
        NatsContextStore {
            collection_id: collection_id.clone(),
            store: self.store.clone(),
        }
    }
}

impl ContextStoreFactory for NatsContextStoreFactory {
    fn create_context_store(&self, collection_id: &CollectionId) -> Arc<dyn ContextStore> {
        Arc::new(self.store(collection_id))
    }
}
