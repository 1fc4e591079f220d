//! Backend base URL configuration and public address discovery.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use pieceflow_core::{BackendUrlProvider, ErrorKind, StaticBackendUrl};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use url::Url;

use crate::{Error, Result, TRACING_TARGET_BACKEND};

/// Port the backend listens on when no URL is configured.
pub const DEFAULT_BACKEND_PORT: u16 = 3000;

/// Plain-text IP echo service used for discovery.
pub const DEFAULT_IP_DISCOVERY_URL: &str = "https://api.ipify.org";

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Where external systems reach the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct BackendUrlConfig {
    /// Externally reachable backend URL; discovered from the public IP when unset
    #[cfg_attr(feature = "config", arg(long = "backend-url", env = "BACKEND_URL"))]
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Backend port used with a discovered public IP
    #[cfg_attr(
        feature = "config",
        arg(long = "backend-port", env = "BACKEND_PORT", default_value = "3000")
    )]
    #[serde(default = "default_backend_port")]
    pub backend_port: u16,

    /// IP echo service queried for the public address
    #[cfg_attr(
        feature = "config",
        arg(long = "ip-discovery-url", env = "IP_DISCOVERY_URL")
    )]
    #[serde(default)]
    pub ip_discovery_url: Option<String>,
}

fn default_backend_port() -> u16 {
    DEFAULT_BACKEND_PORT
}

impl Default for BackendUrlConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_port: default_backend_port(),
            ip_discovery_url: None,
        }
    }
}

impl BackendUrlConfig {
    /// Returns the discovery service URL, using the default if not set.
    pub fn ip_discovery_url(&self) -> &str {
        self.ip_discovery_url
            .as_deref()
            .unwrap_or(DEFAULT_IP_DISCOVERY_URL)
    }

    /// Set a fixed backend URL.
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    /// Set the backend port used with a discovered address.
    #[must_use]
    pub fn with_backend_port(mut self, port: u16) -> Self {
        self.backend_port = port;
        self
    }

    /// Set the IP discovery service.
    #[must_use]
    pub fn with_ip_discovery_url(mut self, url: impl Into<String>) -> Self {
        self.ip_discovery_url = Some(url.into());
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(backend_url) = &self.backend_url {
            let url = Url::parse(backend_url)
                .map_err(|e| format!("Invalid backend URL '{backend_url}': {e}"))?;
            if url.cannot_be_a_base() {
                return Err(format!("Backend URL cannot carry a path: {url}"));
            }
        }

        let discovery_url = self.ip_discovery_url();
        Url::parse(discovery_url)
            .map_err(|e| format!("Invalid IP discovery URL '{discovery_url}': {e}"))?;

        if self.backend_port == 0 {
            return Err("Backend port must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Builds the provider described by this configuration.
    ///
    /// A configured URL is returned as is; otherwise the public address is
    /// discovered on first use.
    pub fn into_provider(self) -> Result<Arc<dyn BackendUrlProvider>> {
        if let Some(backend_url) = &self.backend_url {
            let url = Url::parse(backend_url).map_err(|e| Error::invalid_url(backend_url, e))?;
            return Ok(Arc::new(StaticBackendUrl::new(url)));
        }

        Ok(Arc::new(PublicIpBackendUrl::new(
            self.ip_discovery_url(),
            self.backend_port,
        )?))
    }
}

/// Discovers the backend URL as `http://<public ip>:<port>`.
///
/// The first successful discovery is kept for the lifetime of the provider.
/// Failed discoveries are retried on the next call.
#[derive(Clone)]
pub struct PublicIpBackendUrl {
    http: Client,
    discovery_url: Url,
    port: u16,
    discovered: Arc<OnceCell<Url>>,
}

impl fmt::Debug for PublicIpBackendUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicIpBackendUrl")
            .field("discovery_url", &self.discovery_url.as_str())
            .field("port", &self.port)
            .field("discovered", &self.discovered.get().map(Url::as_str))
            .finish()
    }
}

impl PublicIpBackendUrl {
    /// Creates a provider querying `discovery_url`.
    pub fn new(discovery_url: &str, port: u16) -> Result<Self> {
        let discovery_url =
            Url::parse(discovery_url).map_err(|e| Error::invalid_url(discovery_url, e))?;
        let http = Client::builder().timeout(DISCOVERY_TIMEOUT).build()?;

        Ok(Self {
            http,
            discovery_url,
            port,
            discovered: Arc::default(),
        })
    }

    async fn discover(&self) -> Result<Url> {
        let response = self
            .http
            .get(self.discovery_url.clone())
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        let url = backend_url_for(body.trim(), self.port)?;

        tracing::info!(
            target: TRACING_TARGET_BACKEND,
            backend_url = %url,
            "Discovered public backend URL"
        );
        Ok(url)
    }
}

#[async_trait::async_trait]
impl BackendUrlProvider for PublicIpBackendUrl {
    async fn backend_url(&self) -> pieceflow_core::Result<Url> {
        self.discovered
            .get_or_try_init(|| self.discover())
            .await
            .cloned()
            .map_err(|error| {
                tracing::warn!(
                    target: TRACING_TARGET_BACKEND,
                    discovery_url = %self.discovery_url,
                    error = %error,
                    "Public address discovery failed"
                );
                error.into_core(ErrorKind::BackendUrlUnavailable)
            })
    }
}

/// Formats an IP address reported by the discovery service as a base URL.
fn backend_url_for(ip: &str, port: u16) -> Result<Url> {
    let ip: IpAddr = ip
        .parse()
        .map_err(|e| Error::invalid_url(ip, format!("not an IP address: {e}")))?;
    let host = match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{v6}]"),
    };

    let url = format!("http://{host}:{port}");
    Url::parse(&url).map_err(|e| Error::invalid_url(url, e))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tokio::net::TcpListener;

    use super::*;

    /// Serves `body` from `/` and counts the requests it answered.
    async fn serve_ip(status: StatusCode, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/",
            get(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (status, body)
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        (url, hits)
    }

    #[test]
    fn test_default_config() {
        let config = BackendUrlConfig::default();
        assert_eq!(config.backend_port, 3000);
        assert_eq!(config.ip_discovery_url(), "https://api.ipify.org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(
            BackendUrlConfig::default()
                .with_backend_url("https://api.example.com")
                .validate()
                .is_ok()
        );
        assert!(
            BackendUrlConfig::default()
                .with_backend_url("mailto:ops@example.com")
                .validate()
                .is_err()
        );
        assert!(BackendUrlConfig::default().with_backend_port(0).validate().is_err());
        assert!(
            BackendUrlConfig::default()
                .with_ip_discovery_url("nope")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_backend_url_for() {
        assert_eq!(
            backend_url_for("203.0.113.7", 3000).unwrap().as_str(),
            "http://203.0.113.7:3000/"
        );
        assert_eq!(
            backend_url_for("2001:db8::1", 8080).unwrap().as_str(),
            "http://[2001:db8::1]:8080/"
        );
        assert!(backend_url_for("<html>", 3000).is_err());
    }

    #[tokio::test]
    async fn test_configured_url_is_static() {
        let provider = BackendUrlConfig::default()
            .with_backend_url("https://api.example.com/")
            .into_provider()
            .unwrap();

        let url = provider.backend_url().await.unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/");
    }

    #[tokio::test]
    async fn test_discovers_and_keeps_public_ip() {
        let (discovery_url, hits) = serve_ip(StatusCode::OK, "198.51.100.4\n").await;
        let provider = PublicIpBackendUrl::new(&discovery_url, 3000).unwrap();

        let url = provider.backend_url().await.unwrap();
        assert_eq!(url.as_str(), "http://198.51.100.4:3000/");

        let again = provider.backend_url().await.unwrap();
        assert_eq!(again, url);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_discovery_failure_is_backend_url_unavailable() {
        let (discovery_url, _hits) = serve_ip(StatusCode::SERVICE_UNAVAILABLE, "").await;
        let provider = PublicIpBackendUrl::new(&discovery_url, 3000).unwrap();

        let error = provider.backend_url().await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::BackendUrlUnavailable);
        assert!(error.is_retryable());
    }
}
