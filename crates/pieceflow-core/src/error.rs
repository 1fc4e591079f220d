//! Structured error handling for trigger lifecycle operations.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Collaborator adapters attach their transport errors as this type so the
/// original failure stays inspectable through [`std::error::Error::source`].
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors surfaced by the trigger core and its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The referenced piece is not registered.
    PieceNotFound,
    /// The referenced trigger does not exist on a registered piece.
    TriggerNotFound,
    /// The backend's externally reachable URL could not be determined.
    BackendUrlUnavailable,
    /// The remote execution engine rejected or failed a trigger hook call.
    RemoteHookFailure,
    /// The recurring job queue could not be reached or refused the operation.
    QueueOperationFailure,
    /// A piece trigger's own `run` or hook implementation failed.
    PieceFailure,
    /// The scoped context store could not be read or written.
    ContextStoreFailure,
    /// Serialization/deserialization error.
    Serialization,
    /// Configuration error.
    Configuration,
}

impl ErrorKind {
    /// Check if this error kind is typically retryable by the caller.
    ///
    /// The trigger core itself never retries.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUrlUnavailable
                | Self::RemoteHookFailure
                | Self::QueueOperationFailure
                | Self::ContextStoreFailure
        )
    }

    /// Returns `true` for reference errors caused by the flow definition
    /// rather than by infrastructure.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::PieceNotFound | Self::TriggerNotFound)
    }
}

/// Structured error type with classification and an optional source.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<String>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a piece-not-found error for `piece_name`.
    pub fn piece_not_found(piece_name: &str) -> Self {
        Self::new(ErrorKind::PieceNotFound).with_message(format!("piece '{piece_name}' not found"))
    }

    /// Creates a trigger-not-found error for `trigger_name` on `piece_name`.
    pub fn trigger_not_found(piece_name: &str, trigger_name: &str) -> Self {
        Self::new(ErrorKind::TriggerNotFound).with_message(format!(
            "trigger '{trigger_name}' not found on piece '{piece_name}'"
        ))
    }

    /// Creates a new backend URL discovery error.
    pub fn backend_url_unavailable() -> Self {
        Self::new(ErrorKind::BackendUrlUnavailable)
    }

    /// Creates a new remote engine hook error.
    pub fn remote_hook_failure() -> Self {
        Self::new(ErrorKind::RemoteHookFailure)
    }

    /// Creates a new job queue error.
    pub fn queue_operation_failure() -> Self {
        Self::new(ErrorKind::QueueOperationFailure)
    }

    /// Creates a new piece implementation error.
    pub fn piece_failure() -> Self {
        Self::new(ErrorKind::PieceFailure)
    }

    /// Creates a new context store error.
    pub fn context_store_failure() -> Self {
        Self::new(ErrorKind::ContextStoreFailure)
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Check if this error is retryable based on its kind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::from_source(ErrorKind::Serialization, error).with_message("invalid JSON payload")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_error_builder_pattern() {
        let error = Error::new(ErrorKind::Configuration).with_message("bad config");

        assert_eq!(error.kind, ErrorKind::Configuration);
        assert_eq!(error.message.as_deref(), Some("bad config"));
        assert!(error.source.is_none());
    }

    #[test]
    fn test_error_display() {
        let error = Error::piece_not_found("slack");

        let display_str = error.to_string();
        assert!(display_str.contains("piece_not_found"));
        assert!(display_str.contains("slack"));
    }

    #[test]
    fn test_trigger_not_found_message() {
        let error = Error::trigger_not_found("slack", "new-message");
        assert_eq!(error.kind(), ErrorKind::TriggerNotFound);
        assert_eq!(
            error.message.as_deref(),
            Some("trigger 'new-message' not found on piece 'slack'")
        );
    }

    #[test]
    fn test_from_source() {
        let source = std::io::Error::other("connection refused");
        let error = Error::from_source(ErrorKind::QueueOperationFailure, source);

        assert!(error.source.is_some());
        assert_eq!(error.kind_str(), "queue_operation_failure");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::BackendUrlUnavailable.is_retryable());
        assert!(ErrorKind::RemoteHookFailure.is_retryable());
        assert!(ErrorKind::QueueOperationFailure.is_retryable());

        assert!(!ErrorKind::PieceNotFound.is_retryable());
        assert!(!ErrorKind::TriggerNotFound.is_retryable());
        assert!(!ErrorKind::PieceFailure.is_retryable());
    }

    #[test]
    fn test_user_facing() {
        assert!(ErrorKind::PieceNotFound.is_user_facing());
        assert!(ErrorKind::TriggerNotFound.is_user_facing());
        assert!(!ErrorKind::RemoteHookFailure.is_user_facing());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            ErrorKind::from_str("piece_not_found").unwrap(),
            ErrorKind::PieceNotFound
        );
        assert!(ErrorKind::from_str("invalid").is_err());
    }

    #[test]
    fn test_from_serde_json() {
        let error: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(error.kind, ErrorKind::Serialization);
    }
}
