//! Webhook callback URL derivation.

use std::fmt;
use std::sync::Arc;

use pieceflow_core::{BackendUrlProvider, Error, FlowId, Result};
use url::Url;

/// Path segments appended to the backend base URL.
const WEBHOOK_PATH: [&str; 2] = ["v1", "webhooks"];

/// Query parameter carrying the flow identity.
const FLOW_ID_PARAM: &str = "flowId";

/// Builds the externally reachable callback URL of a flow.
///
/// The base URL is fetched from the provider on every call; nothing is cached.
#[derive(Clone)]
pub struct WebhookUrlBuilder {
    backend: Arc<dyn BackendUrlProvider>,
}

impl fmt::Debug for WebhookUrlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookUrlBuilder").finish_non_exhaustive()
    }
}

impl WebhookUrlBuilder {
    /// Creates a builder over `backend`.
    pub fn new(backend: Arc<dyn BackendUrlProvider>) -> Self {
        Self { backend }
    }

    /// Returns `<backend>/v1/webhooks?flowId=<flow_id>`.
    ///
    /// # Errors
    ///
    /// Fails with `BackendUrlUnavailable` if the base URL cannot be discovered
    /// or cannot carry a path.
    pub async fn build_webhook_url(&self, flow_id: &FlowId) -> Result<Url> {
        let base = self.backend.backend_url().await?;
        webhook_url(&base, flow_id)
    }
}

/// Appends the webhook path and flow query to `base`.
pub fn webhook_url(base: &Url, flow_id: &FlowId) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| {
            Error::backend_url_unavailable()
                .with_message(format!("backend URL '{base}' cannot carry a path"))
        })?
        .pop_if_empty()
        .extend(WEBHOOK_PATH);
    url.query_pairs_mut()
        .clear()
        .append_pair(FLOW_ID_PARAM, flow_id.as_str());
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use pieceflow_core::ErrorKind;
    use pieceflow_core::mock::MockBackendUrl;

    use super::*;

    fn parse(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_webhook_url_from_bare_host() {
        let url = webhook_url(&parse("https://api.example.com"), &FlowId::from("flow1")).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/webhooks?flowId=flow1");
    }

    #[test]
    fn test_webhook_url_with_trailing_slash() {
        let url = webhook_url(&parse("http://10.0.0.1:3000/"), &FlowId::from("abc")).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.1:3000/v1/webhooks?flowId=abc");
    }

    #[test]
    fn test_webhook_url_keeps_base_path() {
        let url = webhook_url(&parse("https://example.com/api/"), &FlowId::from("abc")).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/webhooks?flowId=abc");
    }

    #[test]
    fn test_webhook_url_rejects_cannot_be_a_base() {
        let error = webhook_url(&parse("mailto:ops@example.com"), &FlowId::from("abc")).unwrap_err();
        assert_eq!(error.kind, ErrorKind::BackendUrlUnavailable);
    }

    #[tokio::test]
    async fn test_builder_uses_provider() {
        let builder = WebhookUrlBuilder::new(Arc::new(MockBackendUrl::new(parse(
            "https://hooks.example.com",
        ))));
        let url = builder.build_webhook_url(&FlowId::from("f1")).await.unwrap();
        assert_eq!(url.as_str(), "https://hooks.example.com/v1/webhooks?flowId=f1");
    }

    #[tokio::test]
    async fn test_builder_propagates_discovery_failure() {
        let builder = WebhookUrlBuilder::new(Arc::new(MockBackendUrl::unavailable()));
        let error = builder
            .build_webhook_url(&FlowId::from("f1"))
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::BackendUrlUnavailable);
    }
}
