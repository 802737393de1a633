//! Errors reported by coordination clients.
//!
//! This is the coordination service's native vocabulary. The consistent
//! store never hands these to its callers directly; see [`crate::status`]
//! for the translation into log-level status codes.

use thiserror::Error;

/// Errors that can occur during a coordination-service round trip.
#[derive(Debug, Error)]
pub enum StateError {
    /// Key does not exist in the store.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Expected version does not match current version (optimistic concurrency conflict).
    #[error("version conflict on {key}: expected {expected}, found {found}")]
    VersionConflict {
        key: String,
        expected: u64,
        found: u64,
    },

    /// Key already exists (for create_if_not_exists operations).
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// Cannot connect to or communicate with the coordination service.
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Invalid key format.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Database error from SQLx.
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// I/O error.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for coordination client operations.
pub type Result<T> = std::result::Result<T, StateError>;

impl StateError {
    /// Returns true if the same request may succeed when retried unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StateError::ConnectionError(_))
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StateError::KeyNotFound("/ct/sequenced/7".to_string());
        assert!(err.to_string().contains("key not found"));
        assert!(err.to_string().contains("/ct/sequenced/7"));
    }

    #[test]
    fn test_version_conflict_display() {
        let err = StateError::VersionConflict {
            key: "/ct/serving_sth".to_string(),
            expected: 5,
            found: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("/ct/serving_sth"));
        assert!(msg.contains("expected 5"));
        assert!(msg.contains("found 7"));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(StateError::ConnectionError("reset".to_string()).is_retryable());
        assert!(!StateError::AlreadyExists("/k".to_string()).is_retryable());
        assert!(!StateError::KeyNotFound("/k".to_string()).is_retryable());
        assert!(!StateError::InvalidKey("k".to_string()).is_retryable());
    }
}
