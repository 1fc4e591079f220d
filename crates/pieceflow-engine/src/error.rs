//! Error types for engine and discovery HTTP calls.

use pieceflow_core::ErrorKind;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The remote side answered with a non-success status.
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// A configured or received URL could not be used.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl Error {
    /// Create an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Converts into the core error, classified as `kind`.
    pub fn into_core(self, kind: ErrorKind) -> pieceflow_core::Error {
        let message = match &self {
            Self::Reqwest(e) if e.is_timeout() => format!("request timed out: {e}"),
            Self::Reqwest(e) if e.is_connect() => "connection failed".to_string(),
            other => other.to_string(),
        };

        pieceflow_core::Error::from_source(kind, self).with_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_into_core() {
        let error = Error::Status {
            status: 503,
            body: "engine draining".to_string(),
        }
        .into_core(ErrorKind::RemoteHookFailure);

        assert_eq!(error.kind, ErrorKind::RemoteHookFailure);
        assert!(error.message.unwrap().contains("503"));
        assert!(error.source.is_some());
    }

    #[test]
    fn test_invalid_url_into_core() {
        let error = Error::invalid_url("nope", "relative URL without a base")
            .into_core(ErrorKind::BackendUrlUnavailable);

        assert_eq!(error.kind, ErrorKind::BackendUrlUnavailable);
        assert_eq!(
            error.message.as_deref(),
            Some("Invalid URL 'nope': relative URL without a base")
        );
    }
}
