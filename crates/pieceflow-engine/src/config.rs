//! Engine client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for engine requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the remote execution engine client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct EngineConfig {
    /// Base URL of the execution engine
    #[cfg_attr(feature = "config", arg(long = "engine-url", env = "ENGINE_URL"))]
    pub engine_url: String,

    /// Bearer token sent with every engine request
    #[cfg_attr(feature = "config", arg(long = "engine-token", env = "ENGINE_TOKEN"))]
    #[serde(default)]
    pub engine_token: Option<String>,

    /// Engine request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "engine-timeout", env = "ENGINE_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub engine_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "engine-user-agent", env = "ENGINE_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl EngineConfig {
    /// Create a configuration for the engine at `engine_url`.
    pub fn new(engine_url: impl Into<String>) -> Self {
        Self {
            engine_url: engine_url.into(),
            engine_token: None,
            engine_timeout: default_timeout_secs(),
            user_agent: None,
        }
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.engine_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.engine_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(default_user_agent)
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.engine_token = Some(token.into());
        self
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.engine_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.engine_url)
            .map_err(|e| format!("Invalid engine URL '{}': {e}", self.engine_url))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("Engine URL must use http or https: {url}"));
        }

        if url.cannot_be_a_base() {
            return Err(format!("Engine URL cannot carry a path: {url}"));
        }

        if self.engine_token.as_deref() == Some("") {
            return Err("Engine token cannot be empty when set".to_string());
        }

        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("pieceflow/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config() {
        let config = EngineConfig::new("http://engine:3001");
        assert_eq!(config.engine_timeout, 30);
        assert_eq!(config.effective_timeout(), Duration::from_secs(30));
        assert!(config.engine_token.is_none());
        assert!(config.effective_user_agent().starts_with("pieceflow/"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new("https://engine.example.com")
            .with_token("secret")
            .with_timeout(5)
            .with_user_agent("scheduler/1.0");

        assert_eq!(config.engine_token.as_deref(), Some("secret"));
        assert_eq!(config.effective_timeout(), Duration::from_secs(5));
        assert_eq!(config.effective_user_agent(), "scheduler/1.0");
    }

    #[test]
    fn test_effective_timeout_uses_default_when_zero() {
        let config = EngineConfig::new("http://engine:3001").with_timeout(0);
        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(EngineConfig::new("http://engine:3001").validate().is_ok());
        assert!(EngineConfig::new("engine:3001/x").validate().is_err());
        assert!(EngineConfig::new("ftp://engine").validate().is_err());
        assert!(EngineConfig::new("not a url").validate().is_err());
        assert!(
            EngineConfig::new("http://engine:3001")
                .with_token("")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"engine_url": "http://engine:3001"}"#).unwrap();
        assert_eq!(config, EngineConfig::new("http://engine:3001"));
    }
}
