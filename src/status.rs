//! Log-level status codes and the translation from coordination errors.
//!
//! Callers of [`ConsistentStore`](crate::ConsistentStore) only ever see
//! [`StoreError`]. Each variant maps to one [`StatusCode`]; a successful
//! `Ok(..)` corresponds to [`StatusCode::Ok`].

use std::fmt;

use thiserror::Error;

use crate::error::StateError;

/// Canonical status codes surfaced by the consistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    /// A pending entry with the same content was already admitted.
    AlreadyExists,
    /// A conditional write lost against the current state of the key.
    FailedPrecondition,
    NotFound,
    InvalidArgument,
    /// The coordination service could not be reached.
    Unavailable,
    Internal,
    /// Opaque coordination-service failure.
    Unknown,
    /// The operation is declared but its protocol is not built yet.
    Unimplemented,
}

impl StatusCode {
    /// Canonical upper-snake name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::AlreadyExists => "ALREADY_EXISTS",
            StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::Unavailable => "UNAVAILABLE",
            StatusCode::Internal => "INTERNAL",
            StatusCode::Unknown => "UNKNOWN",
            StatusCode::Unimplemented => "UNIMPLEMENTED",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recoverable failures returned by the consistent store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Duplicate pending submission. The caller's entry now holds the
    /// previously accepted copy.
    #[error("ALREADY_EXISTS: {0}")]
    AlreadyExists(String),

    #[error("FAILED_PRECONDITION: {0}")]
    FailedPrecondition(String),

    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    #[error("INVALID_ARGUMENT: {0}")]
    InvalidArgument(String),

    #[error("UNAVAILABLE: {0}")]
    Unavailable(String),

    #[error("INTERNAL: {0}")]
    Internal(String),

    #[error("UNKNOWN: {0}")]
    Unknown(String),

    #[error("UNIMPLEMENTED: {0}")]
    Unimplemented(&'static str),
}

/// Result type alias for consistent store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// The status code this error reports.
    pub fn code(&self) -> StatusCode {
        match self {
            StoreError::AlreadyExists(_) => StatusCode::AlreadyExists,
            StoreError::FailedPrecondition(_) => StatusCode::FailedPrecondition,
            StoreError::NotFound(_) => StatusCode::NotFound,
            StoreError::InvalidArgument(_) => StatusCode::InvalidArgument,
            StoreError::Unavailable(_) => StatusCode::Unavailable,
            StoreError::Internal(_) => StatusCode::Internal,
            StoreError::Unknown(_) => StatusCode::Unknown,
            StoreError::Unimplemented(_) => StatusCode::Unimplemented,
        }
    }

    /// Returns true if the caller may retry the operation unchanged.
    ///
    /// The store itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Maps the coordination service's outcome onto log-level status.
///
/// A create conflict surfaces as `FailedPrecondition`; the store turns it
/// into `AlreadyExists` only after reading back and validating the stored
/// copy.
impl From<StateError> for StoreError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::AlreadyExists(key) => {
                StoreError::FailedPrecondition(format!("key already exists: {key}"))
            }
            err @ StateError::VersionConflict { .. } => {
                StoreError::FailedPrecondition(err.to_string())
            }
            StateError::KeyNotFound(key) => StoreError::NotFound(key),
            StateError::InvalidKey(msg) => StoreError::InvalidArgument(msg),
            StateError::ConnectionError(msg) => StoreError::Unavailable(msg),
            StateError::SerializationError(msg) => StoreError::Internal(msg),
            err @ (StateError::DatabaseError(_) | StateError::IoError(_)) => {
                StoreError::Unknown(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_conflict_is_failed_precondition() {
        let err: StoreError = StateError::AlreadyExists("/ct/unsequenced/x".into()).into();
        assert_eq!(err.code(), StatusCode::FailedPrecondition);
        assert!(err.to_string().contains("/ct/unsequenced/x"));
    }

    #[test]
    fn test_version_conflict_is_failed_precondition() {
        let err: StoreError = StateError::VersionConflict {
            key: "/k".into(),
            expected: 1,
            found: 3,
        }
        .into();
        assert_eq!(err.code(), StatusCode::FailedPrecondition);
    }

    #[test]
    fn test_translation_table() {
        let cases: Vec<(StateError, StatusCode)> = vec![
            (StateError::KeyNotFound("/k".into()), StatusCode::NotFound),
            (StateError::InvalidKey("k".into()), StatusCode::InvalidArgument),
            (StateError::ConnectionError("refused".into()), StatusCode::Unavailable),
            (StateError::SerializationError("eof".into()), StatusCode::Internal),
            (
                StateError::IoError(std::io::Error::other("disk")),
                StatusCode::Unknown,
            ),
        ];
        for (state, code) in cases {
            assert_eq!(StoreError::from(state).code(), code);
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StatusCode::AlreadyExists.to_string(), "ALREADY_EXISTS");
        assert_eq!(
            StoreError::Unimplemented("set_serving_sth").to_string(),
            "UNIMPLEMENTED: set_serving_sth"
        );
    }

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(StoreError::Unavailable("x".into()).is_retryable());
        assert!(!StoreError::Unknown("x".into()).is_retryable());
        assert!(!StoreError::AlreadyExists("x".into()).is_retryable());
    }
}
