//! Recurring job registration.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::flow::{FlowVersion, RunEnvironment, TriggerType};
use crate::ids::{CollectionId, CollectionVersionId, FlowVersionId};

/// Payload the scheduler hands back to the run engine on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowJobData {
    pub environment: RunEnvironment,
    pub collection_id: CollectionId,
    pub collection_version_id: CollectionVersionId,
    pub flow_version: FlowVersion,
    pub trigger_type: TriggerType,
}

/// A recurring job, keyed by the flow version it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringJob {
    /// Registration key. At most one live job exists per key.
    pub key: FlowVersionId,
    /// Payload delivered on each tick.
    pub data: FlowJobData,
    /// Cron expression the job repeats on.
    pub cron_expression: String,
}

/// Durable store of recurring jobs.
///
/// Implementations must upsert by key: adding a job whose key is already
/// registered replaces the existing job instead of creating a second one.
#[async_trait::async_trait]
pub trait RecurringJobQueue: Send + Sync {
    /// Registers `job`, replacing any job stored under the same key.
    async fn add(&self, job: RecurringJob) -> Result<()>;

    /// Removes the job stored under `key`. Absent keys are not an error.
    async fn remove(&self, key: &FlowVersionId) -> Result<()>;
}
