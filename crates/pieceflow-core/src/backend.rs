//! The backend's externally reachable base URL.

use url::Url;

use crate::Result;

/// Supplies the base URL external systems use to reach the backend.
///
/// Implementations may perform network discovery; failures surface as
/// backend-URL-unavailable errors.
#[async_trait::async_trait]
pub trait BackendUrlProvider: Send + Sync {
    /// Returns the current base URL.
    async fn backend_url(&self) -> Result<Url>;
}

/// A fixed, pre-configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticBackendUrl(Url);

impl StaticBackendUrl {
    /// Wraps a known base URL.
    pub fn new(url: Url) -> Self {
        Self(url)
    }
}

#[async_trait::async_trait]
impl BackendUrlProvider for StaticBackendUrl {
    async fn backend_url(&self) -> Result<Url> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_backend_url() {
        let url = Url::parse("https://api.example.com").unwrap();
        let provider = StaticBackendUrl::new(url.clone());
        assert_eq!(provider.backend_url().await.unwrap(), url);
    }
}
