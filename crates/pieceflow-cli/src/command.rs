//! Subcommand execution.

use std::path::Path;

use anyhow::Context;
use pieceflow_trigger::{
    ExecuteTrigger, LifecycleParams, TriggerConfig, TriggerDispatcher, TriggerLifecycleManager,
    TriggerServices,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::TRACING_TARGET_COMMAND;
use crate::config::Command;

/// Runs `command` against the given services.
///
/// Returns the JSON document to print, if the command produces one.
pub async fn run(
    command: &Command,
    services: TriggerServices,
    config: TriggerConfig,
) -> anyhow::Result<Option<Value>> {
    match command {
        Command::Enable { params } => {
            let params: LifecycleParams = read_json(params).await?;
            TriggerLifecycleManager::new(services, config)
                .enable(&params)
                .await
                .with_context(|| {
                    format!("failed to enable trigger of flow version {}", params.flow_version.id)
                })?;

            tracing::info!(
                target: TRACING_TARGET_COMMAND,
                flow_version_id = %params.flow_version.id,
                "Trigger enabled"
            );
            Ok(None)
        }
        Command::Disable { params } => {
            let params: LifecycleParams = read_json(params).await?;
            TriggerLifecycleManager::new(services, config)
                .disable(&params)
                .await
                .with_context(|| {
                    format!("failed to disable trigger of flow version {}", params.flow_version.id)
                })?;

            tracing::info!(
                target: TRACING_TARGET_COMMAND,
                flow_version_id = %params.flow_version.id,
                "Trigger disabled"
            );
            Ok(None)
        }
        Command::Execute { request } => {
            let request: ExecuteTrigger = read_json(request).await?;
            let flow_version_id = request.flow_version.id.clone();
            let payloads = TriggerDispatcher::new(&services)
                .execute_trigger(request)
                .await
                .with_context(|| {
                    format!("failed to execute trigger of flow version {flow_version_id}")
                })?;

            tracing::info!(
                target: TRACING_TARGET_COMMAND,
                flow_version_id = %flow_version_id,
                payloads = payloads.len(),
                "Trigger executed"
            );
            Ok(Some(Value::Array(payloads)))
        }
    }
}

/// Reads and parses a JSON document from `path`.
async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_json(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> anyhow::Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pieceflow_core::{Trigger, TriggerType};

    use super::*;

    #[test]
    fn test_parse_lifecycle_params() {
        let params: LifecycleParams = parse_json(
            br#"{
                "collectionId": "c1",
                "collectionVersion": { "id": "cv1", "collectionId": "c1" },
                "flowVersion": {
                    "id": "fv1",
                    "flowId": "f1",
                    "trigger": { "type": "SCHEDULE", "settings": { "cronExpression": "0 0 * * * *" } }
                },
                "projectId": "p1"
            }"#,
        )
        .unwrap();

        assert_eq!(params.flow_version.trigger.trigger_type(), TriggerType::Schedule);
        assert_eq!(params.flow_version.trigger, Trigger::schedule("0 0 * * * *"));
        assert_eq!(params.project_id.as_ref(), "p1");
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(parse_json::<LifecycleParams>(b"{\"collectionId\": ").is_err());
    }

    #[tokio::test]
    async fn test_read_json_reports_missing_file() {
        let path = PathBuf::from("/nonexistent/pieceflow/params.json");
        let error = read_json::<LifecycleParams>(&path).await.unwrap_err();
        assert!(error.to_string().contains("failed to read"));
    }
}
