//! Typed JSON values in one KV bucket.

use std::marker::PhantomData;

use async_nats::jetstream::{self, kv};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{KvBucket, KvKey};
use crate::{Error, Result, TRACING_TARGET_KV};

/// JSON-encoded `V` values stored under `K` keys in bucket `B`.
pub struct KvStore<K, V, B> {
    store: kv::Store,
    _marker: PhantomData<fn() -> (K, V, B)>,
}

impl<K, V, B> Clone for KvStore<K, V, B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, B> KvStore<K, V, B>
where
    K: KvKey,
    V: Serialize + DeserializeOwned + Send + Sync,
    B: KvBucket,
{
    /// Opens bucket `B`, creating it when it does not exist yet.
    #[tracing::instrument(skip(jetstream), target = TRACING_TARGET_KV, fields(bucket = B::NAME))]
    pub async fn open(jetstream: &jetstream::Context) -> Result<Self> {
        let store = match jetstream.get_key_value(B::NAME).await {
            Ok(store) => store,
            Err(_) => {
                tracing::info!(target: TRACING_TARGET_KV, "Creating KV bucket");
                jetstream
                    .create_key_value(bucket_config::<B>())
                    .await
                    .map_err(|e| Error::operation("kv_create", e.to_string()))?
            }
        };

        Ok(Self {
            store,
            _marker: PhantomData,
        })
    }

    /// Returns the bucket name.
    pub fn bucket_name(&self) -> &'static str {
        B::NAME
    }

    /// Stores `value` under `key`, replacing the previous value.
    ///
    /// Returns the new revision.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_KV, fields(key = %key))]
    pub async fn put(&self, key: &K, value: &V) -> Result<u64> {
        let json = serde_json::to_vec(value)?;
        let revision = self
            .store
            .put(key.to_string(), json.into())
            .await
            .map_err(|e| Error::operation("kv_put", e.to_string()))?;

        tracing::debug!(target: TRACING_TARGET_KV, revision, "Stored value");
        Ok(revision)
    }

    /// Reads the live value under `key`.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_KV, fields(key = %key))]
    pub async fn get(&self, key: &K) -> Result<Option<V>> {
        let entry = self
            .store
            .entry(key.to_string())
            .await
            .map_err(|e| Error::operation("kv_get", e.to_string()))?;

        // Delete and purge markers are entries too.
        match entry {
            Some(entry) if matches!(entry.operation, kv::Operation::Put) => {
                Ok(Some(serde_json::from_slice(&entry.value)?))
            }
            _ => Ok(None),
        }
    }

    /// Removes `key` with its history. Absent keys are not an error.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_KV, fields(key = %key))]
    pub async fn delete(&self, key: &K) -> Result<()> {
        self.store
            .purge(key.to_string())
            .await
            .map_err(|e| Error::operation("kv_delete", e.to_string()))
    }
}

fn bucket_config<B: KvBucket>() -> kv::Config {
    kv::Config {
        bucket: B::NAME.to_string(),
        description: B::DESCRIPTION.to_string(),
        max_age: B::TTL.unwrap_or_default(),
        history: B::HISTORY,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::kv::{RecurringJobsBucket, TriggerContextBucket};

    #[test]
    fn test_bucket_config_keeps_one_revision_forever() {
        for config in [
            bucket_config::<RecurringJobsBucket>(),
            bucket_config::<TriggerContextBucket>(),
        ] {
            assert_eq!(config.history, 1);
            assert_eq!(config.max_age, Duration::ZERO);
        }
        assert_eq!(bucket_config::<RecurringJobsBucket>().bucket, "recurring_jobs");
        assert_eq!(bucket_config::<TriggerContextBucket>().bucket, "trigger_context");
    }
}
