//! Remote execution engine trigger hooks.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use url::Url;

use crate::Result;
use crate::flow::{CollectionVersion, FlowVersion};
use crate::ids::ProjectId;

/// Which piece hook the remote engine should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerHookType {
    OnEnable,
    OnDisable,
}

/// Request to run a piece trigger hook inside the remote engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerHookRequest {
    pub hook_type: TriggerHookType,
    pub flow_version: FlowVersion,
    pub webhook_url: Url,
    pub collection_version: CollectionVersion,
    pub project_id: ProjectId,
}

/// The remote execution engine, as seen by the trigger core.
#[async_trait::async_trait]
pub trait TriggerHookExecutor: Send + Sync {
    /// Runs the requested hook. Fails with a remote hook failure when the
    /// engine cannot be reached or reports an error.
    async fn execute_trigger_hook(&self, request: &TriggerHookRequest) -> Result<()>;
}
