//! Connection to NATS and the buckets built on it.

use std::sync::Arc;

use async_nats::{ConnectOptions, jetstream};
use tokio::time::timeout;

use super::nats_config::NatsConfig;
use crate::kv::{KvStore, RecurringJobsBucket, TriggerContextBucket};
use crate::{
    Error, NatsContextStoreFactory, NatsJobQueue, Result, TRACING_TARGET_CLIENT,
    TRACING_TARGET_CONNECTION,
};

/// Connected JetStream context.
///
/// Cheap to clone; clones share one connection.
#[derive(Debug, Clone)]
pub struct NatsClient {
    inner: Arc<NatsClientInner>,
}

#[derive(Debug)]
struct NatsClientInner {
    jetstream: jetstream::Context,
    config: NatsConfig,
}

impl NatsClient {
    /// Connects to the servers named in `config`.
    ///
    /// Fails with [`Error::Timeout`] when no server answers within the
    /// connect timeout.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_CONNECTION, fields(servers = %config.nats_url))]
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        config.validate().map_err(Error::invalid_config)?;

        let connect_timeout = config.connect_timeout();
        let mut options = ConnectOptions::new()
            .name(config.name())
            .connection_timeout(connect_timeout)
            .request_timeout(config.request_timeout());
        if let Some(token) = &config.nats_token {
            options = options.token(token.clone());
        }

        let client = timeout(
            connect_timeout,
            async_nats::connect_with_options(config.nats_url.as_str(), options),
        )
        .await
        .map_err(|_| Error::timeout(connect_timeout))?
        .map_err(|e| Error::Connection(Box::new(e)))?;

        let server_info = client.server_info();
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            server_host = %server_info.host,
            server_version = %server_info.version,
            "Connected to NATS"
        );

        Ok(Self {
            inner: Arc::new(NatsClientInner {
                jetstream: jetstream::new(client),
                config,
            }),
        })
    }

    /// Returns the configuration the client connected with.
    pub fn config(&self) -> &NatsConfig {
        &self.inner.config
    }

    /// Opens the recurring job queue, creating its bucket on first use.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT)]
    pub async fn job_queue(&self) -> Result<NatsJobQueue> {
        let store = KvStore::<_, _, RecurringJobsBucket>::open(&self.inner.jetstream).await?;
        Ok(NatsJobQueue::new(store))
    }

    /// Opens the context bucket, creating it on first use.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT)]
    pub async fn context_store_factory(&self) -> Result<NatsContextStoreFactory> {
        let store = KvStore::<_, _, TriggerContextBucket>::open(&self.inner.jetstream).await?;
        Ok(NatsContextStoreFactory::new(store))
    }
}
