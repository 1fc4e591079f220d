//! Connection settings for the job and context buckets.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default time allowed to reach the server: 10 seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_NAME: &str = "pieceflow";

/// NATS connection used for trigger registrations and piece context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NatsConfig {
    /// NATS server URL (comma-separated for clustering)
    #[cfg_attr(feature = "config", arg(long = "nats-url", env = "NATS_URL"))]
    pub nats_url: String,

    /// Authentication token; connects anonymously when unset
    #[cfg_attr(feature = "config", arg(long = "nats-token", env = "NATS_TOKEN"))]
    #[serde(default)]
    pub nats_token: Option<String>,

    /// Seconds allowed to establish the connection
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-connect-timeout", env = "NATS_CONNECT_TIMEOUT_SECS", default_value = "10")
    )]
    #[serde(default = "default_connect_timeout_secs")]
    pub nats_connect_timeout: u64,

    /// Seconds a single KV request may take (client default when unset)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-request-timeout", env = "NATS_REQUEST_TIMEOUT_SECS")
    )]
    #[serde(default)]
    pub nats_request_timeout: Option<u64>,
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl NatsConfig {
    /// Creates an anonymous configuration for `nats_url`.
    pub fn new(nats_url: impl Into<String>) -> Self {
        Self {
            nats_url: nats_url.into(),
            nats_token: None,
            nats_connect_timeout: default_connect_timeout_secs(),
            nats_request_timeout: None,
        }
    }

    /// Connection name reported to the server.
    pub fn name(&self) -> &'static str {
        DEFAULT_NAME
    }

    /// Returns the individual server URLs.
    pub fn servers(&self) -> impl Iterator<Item = &str> {
        self.nats_url.split(',').map(str::trim)
    }

    /// Returns the connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.nats_connect_timeout)
    }

    /// Returns the KV request timeout, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.nats_request_timeout.map(Duration::from_secs)
    }

    /// Set the authentication token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.nats_token = Some(token.into());
        self
    }

    /// Set the connect timeout in seconds.
    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.nats_connect_timeout = secs;
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.nats_request_timeout = Some(secs);
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<(), String> {
        for server in self.servers() {
            if !server.starts_with("nats://") && !server.starts_with("tls://") {
                return Err(format!("NATS URL must use nats:// or tls://: '{server}'"));
            }
        }

        if self.nats_token.as_deref() == Some("") {
            return Err("NATS token cannot be empty when set".to_string());
        }

        if self.nats_connect_timeout == 0 {
            return Err("NATS connect timeout must be greater than zero".to_string());
        }

        if self.nats_request_timeout == Some(0) {
            return Err("NATS request timeout must be greater than zero".to_string());
        }

        Ok(())
    }
}
