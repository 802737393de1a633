//! CoordinationClient trait - the narrow interface to the coordination service.
//!
//! The consistent store depends on this trait only. Conditional writes
//! (`create_if_not_exists`, `compare_and_set`) must be atomic in the backend:
//! they are the only cross-process exclusion the store relies on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};
use crate::watch::WatchStream;

/// Maximum key length in bytes.
pub const MAX_KEY_LENGTH: usize = 1024;

/// A value read back from the coordination service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// The key.
    pub key: String,
    /// The value (opaque bytes).
    pub value: Vec<u8>,
    /// Monotonically increasing version (per key), starting at 1.
    pub version: u64,
}

/// Validate that a key is well-formed.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StateError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StateError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if !key.starts_with('/') {
        return Err(StateError::InvalidKey(
            "key must start with '/'".to_string(),
        ));
    }
    Ok(())
}

/// Client for a coordination key-value service.
///
/// Implementations must be safe to share across concurrent callers.
#[async_trait]
pub trait CoordinationClient: Send + Sync {
    /// Point read. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<KeyValue>>;

    /// All values whose key starts with `prefix`, in key order.
    async fn get_all(&self, prefix: &str) -> Result<Vec<KeyValue>>;

    /// Create a key only if it doesn't already exist.
    ///
    /// Returns the new version (1) on success, or `AlreadyExists` if the
    /// key already exists.
    async fn create_if_not_exists(&self, key: &str, value: Vec<u8>) -> Result<u64>;

    /// Unconditionally set a key. Returns the new version.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<u64>;

    /// Update only if the current version matches `expected_version`.
    ///
    /// An expected version of 0 means the key must not exist yet.
    async fn compare_and_set(
        &self,
        key: &str,
        expected_version: u64,
        value: Vec<u8>,
    ) -> Result<u64>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Watch for changes to keys under `prefix`.
    fn watch(&self, prefix: &str) -> Result<WatchStream>;
}
