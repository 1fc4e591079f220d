//! Recurring job registrations in NATS KV.

use std::fmt;

use pieceflow_core::{ErrorKind, FlowVersionId, RecurringJob, RecurringJobQueue};

use crate::kv::{JobKey, KvBucket, KvStore, RecurringJobsBucket};
use crate::TRACING_TARGET_QUEUE;

/// [`RecurringJobQueue`] over the `recurring_jobs` KV bucket.
///
/// One key per flow version gives the queue its upsert semantics: `put`
/// replaces, `purge` removes and succeeds for absent keys. The scheduler
/// process watching the bucket owns the actual cron ticks.
#[derive(Clone)]
pub struct NatsJobQueue {
    store: KvStore<JobKey, RecurringJob, RecurringJobsBucket>,
}

impl fmt::Debug for NatsJobQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NatsJobQueue")
            .field("bucket", &RecurringJobsBucket::NAME)
            .finish()
    }
}

impl NatsJobQueue {
    /// Wraps an opened job store.
    pub fn new(store: KvStore<JobKey, RecurringJob, RecurringJobsBucket>) -> Self {
        Self { store }
    }
}

/// Key a job for `flow_version_id` is stored under, if it can have one.
///
/// `add` rejects ids outside the KV key alphabet, so no job can exist for
/// them and removing one is a no-op.
fn stored_key(flow_version_id: &FlowVersionId) -> Option<JobKey> {
    JobKey::new(flow_version_id.clone()).ok()
}

#[async_trait::async_trait]
impl RecurringJobQueue for NatsJobQueue {
    async fn add(&self, job: RecurringJob) -> pieceflow_core::Result<()> {
        let key = JobKey::new(job.key.clone())
            .map_err(|e| e.into_core(ErrorKind::QueueOperationFailure))?;
        let revision = self
            .store
            .put(&key, &job)
            .await
            .map_err(|e| e.into_core(ErrorKind::QueueOperationFailure))?;

        tracing::debug!(
            target: TRACING_TARGET_QUEUE,
            key = %key,
            revision,
            cron_expression = %job.cron_expression,
            "Registered recurring job"
        );
        Ok(())
    }

    async fn remove(&self, key: &FlowVersionId) -> pieceflow_core::Result<()> {
        let Some(job_key) = stored_key(key) else {
            tracing::debug!(
                target: TRACING_TARGET_QUEUE,
                key = %key,
                "No job can exist for this key"
            );
            return Ok(());
        };

        self.store
            .delete(&job_key)
            .await
            .map_err(|e| e.into_core(ErrorKind::QueueOperationFailure))?;

        tracing::debug!(
            target: TRACING_TARGET_QUEUE,
            key = %job_key,
            "Removed recurring job"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_key_for_valid_id() {
        let key = stored_key(&FlowVersionId::from("fv_01HX9")).unwrap();
        assert_eq!(key.to_string(), "fv_01HX9");
    }

    #[test]
    fn test_ids_outside_key_alphabet_have_no_stored_job() {
        for id in ["flow version", "fv:1", "user@fv", ".fv", ""] {
            assert!(stored_key(&FlowVersionId::from(id)).is_none(), "{id}");
        }
    }
}
