//! Reqwest-based client for the remote execution engine.

use std::fmt;
use std::sync::Arc;

use pieceflow_core::{ErrorKind, TriggerHookExecutor, TriggerHookRequest};
use reqwest::Client;
use url::Url;

use crate::{EngineConfig, Error, Result, TRACING_TARGET};

/// Path of the trigger hook endpoint, relative to the engine base URL.
pub const TRIGGER_HOOKS_PATH: [&str; 3] = ["v1", "engine", "trigger-hooks"];

/// Longest response body kept in an error message.
const MAX_ERROR_BODY_LEN: usize = 512;

struct EngineClientInner {
    http: Client,
    hooks_url: Url,
    config: EngineConfig,
}

/// HTTP client for the remote execution engine.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct EngineClient {
    inner: Arc<EngineClientInner>,
}

impl fmt::Debug for EngineClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineClient")
            .field("hooks_url", &self.inner.hooks_url.as_str())
            .field("timeout", &self.inner.config.effective_timeout())
            .finish_non_exhaustive()
    }
}

impl EngineClient {
    /// Creates a client for the engine described by `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let hooks_url = trigger_hooks_url(&config.engine_url)?;
        let timeout = config.effective_timeout();

        tracing::debug!(
            target: TRACING_TARGET,
            hooks_url = %hooks_url,
            timeout_ms = timeout.as_millis(),
            "Creating engine client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(config.effective_user_agent())
            .build()?;

        Ok(Self {
            inner: Arc::new(EngineClientInner {
                http,
                hooks_url,
                config,
            }),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Returns the URL trigger hooks are posted to.
    pub fn hooks_url(&self) -> &Url {
        &self.inner.hooks_url
    }

    async fn post_trigger_hook(&self, request: &TriggerHookRequest) -> Result<()> {
        let mut http_request = self.inner.http.post(self.inner.hooks_url.clone()).json(request);
        if let Some(token) = &self.inner.config.engine_token {
            http_request = http_request.bearer_auth(token);
        }

        let response = http_request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY_LEN {
            let mut end = MAX_ERROR_BODY_LEN;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }

        Err(Error::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl TriggerHookExecutor for EngineClient {
    async fn execute_trigger_hook(&self, request: &TriggerHookRequest) -> pieceflow_core::Result<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            hook_type = %request.hook_type,
            flow_version_id = %request.flow_version.id,
            project_id = %request.project_id,
            "Executing trigger hook"
        );

        match self.post_trigger_hook(request).await {
            Ok(()) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    hook_type = %request.hook_type,
                    "Trigger hook completed"
                );
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    hook_type = %request.hook_type,
                    error = %error,
                    "Trigger hook failed"
                );
                Err(error.into_core(ErrorKind::RemoteHookFailure))
            }
        }
    }
}

/// Appends [`TRIGGER_HOOKS_PATH`] to the engine base URL.
fn trigger_hooks_url(engine_url: &str) -> Result<Url> {
    let mut url = Url::parse(engine_url).map_err(|e| Error::invalid_url(engine_url, e))?;
    url.path_segments_mut()
        .map_err(|()| Error::invalid_url(engine_url, "URL cannot carry a path"))?
        .pop_if_empty()
        .extend(TRIGGER_HOOKS_PATH);
    Ok(url)
}
