//! Log entries as the store sees them.
//!
//! The store does not know what a log entry contains. It needs a
//! canonical encoding, a content fingerprint, and access to the optional
//! sequence number; [`LogEntry`] is that capability.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::status::{StoreError, StoreResult};

/// Fixed-size fingerprint of an entry's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// URL-safe base64 with padding; never contains `/`.
    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// What the consistent store requires of a log entry.
///
/// `content_hash` is an identity key: two entries with the same hash must
/// be identical once [`normalize_backfilled`](LogEntry::normalize_backfilled)
/// has been applied to both. It must therefore cover neither the sequence
/// number nor any backfilled field.
pub trait LogEntry:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync
{
    fn content_hash(&self) -> ContentHash;

    /// `None` while pending, `Some` once the entry has a log position.
    fn sequence_number(&self) -> Option<u64>;

    fn set_sequence_number(&mut self, sequence_number: u64);

    /// Clear fields the log fills in on acceptance (timestamps and the like).
    fn normalize_backfilled(&mut self) {}
}

/// Canonical byte encoding of an entry.
pub(crate) fn encode<T: LogEntry>(entry: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(entry).map_err(|e| StoreError::Internal(e.to_string()))
}

pub(crate) fn decode<T: LogEntry>(bytes: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice(bytes)
}

/// Encoding of the entry with backfilled fields cleared.
pub(crate) fn encode_normalized<T: LogEntry>(entry: &T) -> StoreResult<Vec<u8>> {
    let mut normalized = entry.clone();
    normalized.normalize_backfilled();
    encode(&normalized)
}

/// One log entry plus the coordination metadata it was read at.
///
/// A fresh handle has no metadata; handles returned by the store's listing
/// operations carry the key and version they were read from, which a
/// compare-and-set against that key needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryHandle<T> {
    entry: T,
    key: Option<String>,
    version: Option<u64>,
}

impl<T> EntryHandle<T> {
    /// A handle for an entry that has not been persisted.
    pub fn new(entry: T) -> Self {
        Self {
            entry,
            key: None,
            version: None,
        }
    }

    /// A handle for an entry read back from the coordination service.
    pub fn with_metadata(entry: T, key: impl Into<String>, version: u64) -> Self {
        Self {
            entry,
            key: Some(key.into()),
            version: Some(version),
        }
    }

    pub fn entry(&self) -> &T {
        &self.entry
    }

    pub fn entry_mut(&mut self) -> &mut T {
        &mut self.entry
    }

    pub fn into_entry(self) -> T {
        self.entry
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// Whether this handle reflects a persisted read.
    pub fn has_metadata(&self) -> bool {
        self.key.is_some()
    }
}
