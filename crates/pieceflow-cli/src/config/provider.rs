//! Service provider configuration.

use std::sync::Arc;

use anyhow::Context;
use pieceflow_core::InMemoryPieceRegistry;
use pieceflow_engine::EngineClient;
use pieceflow_nats::NatsClient;
use pieceflow_trigger::TriggerServices;

use super::Cli;
use crate::TRACING_TARGET_STARTUP;

/// Connects every collaborator named in the configuration and bundles them
/// into [`TriggerServices`].
///
/// # Errors
///
/// Returns an error if NATS is unreachable, a bucket cannot be opened, or an
/// HTTP client cannot be built.
pub async fn create_services(cli: &Cli) -> anyhow::Result<TriggerServices> {
    let nats = NatsClient::connect(cli.nats.clone())
        .await
        .context("failed to connect to NATS")?;
    let job_queue = nats
        .job_queue()
        .await
        .context("failed to open the recurring job bucket")?;
    let context_stores = nats
        .context_store_factory()
        .await
        .context("failed to open the trigger context bucket")?;

    let engine = EngineClient::new(cli.engine.clone()).context("failed to create engine client")?;
    let backend = cli
        .backend
        .clone()
        .into_provider()
        .context("failed to create backend URL provider")?;

    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        hooks_url = %engine.hooks_url(),
        "Trigger services ready"
    );

    // No pieces are linked into this binary; piece triggers fail with PieceNotFound.
    Ok(TriggerServices::new(
        Arc::new(InMemoryPieceRegistry::new()),
        backend,
        Arc::new(context_stores),
        Arc::new(job_queue),
        Arc::new(engine),
    ))
}
