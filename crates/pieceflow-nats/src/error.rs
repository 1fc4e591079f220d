//! Error types and utilities for NATS operations.

use std::time::Duration;

use pieceflow_core::ErrorKind;

/// Result type for all NATS operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for NATS operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// NATS client/connection errors
    #[error("NATS connection error: {0}")]
    Connection(#[from] async_nats::Error),

    /// Serialization errors when storing or loading values
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation timeout
    #[error("Operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Key rejected before reaching the server
    #[error("Invalid KV key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Generic operation error with context
    #[error("NATS operation failed: {operation} - {details}")]
    Operation { operation: String, details: String },
}

impl Error {
    /// Create an operation error with context
    pub fn operation(op: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Operation {
            operation: op.into(),
            details: details.into(),
        }
    }

    /// Create an invalid key error
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a timeout error with the given duration
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { timeout: duration }
    }

    /// Converts into the core error, classified as `kind`.
    ///
    /// Serialization and configuration failures keep their own kind.
    pub fn into_core(self, kind: ErrorKind) -> pieceflow_core::Error {
        let kind = match &self {
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::InvalidConfig { .. } => ErrorKind::Configuration,
            _ => kind,
        };

        let message = self.to_string();
        pieceflow_core::Error::from_source(kind, self).with_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_core_uses_given_kind() {
        let error = Error::operation("kv_put", "no responders").into_core(ErrorKind::QueueOperationFailure);
        assert_eq!(error.kind, ErrorKind::QueueOperationFailure);
        assert!(error.is_retryable());
        assert!(error.message.unwrap().contains("kv_put"));
    }

    #[test]
    fn test_into_core_keeps_serialization_kind() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = Error::from(source).into_core(ErrorKind::ContextStoreFailure);
        assert_eq!(error.kind, ErrorKind::Serialization);
    }

    #[test]
    fn test_timeout_display() {
        let error = Error::timeout(Duration::from_secs(3));
        assert_eq!(error.to_string(), "Operation timed out after 3s");
    }
}
