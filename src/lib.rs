//! # ct-consistent-store
//!
//! Consistent entry store for a certificate-transparency log.
//!
//! The store sits between the log server and a coordination key-value
//! service and gives every node in the cluster the same view of:
//!
//! - **Pending entries**: submissions accepted but not yet in the tree,
//!   stored once per distinct content under `<root>/unsequenced/`
//! - **Sequenced entries**: entries with a permanent log position, under
//!   `<root>/sequenced/<n>`
//!
//! Exactly-once admission comes from the coordination service's
//! create-if-absent; the store itself holds no locks and never retries.
//! Recoverable failures are returned as [`StoreError`]. A broken namespace
//! invariant halts instead (see [`invariant`]).
//!
//! ## Coordination backends
//!
//! - [`MemoryClient`]: in-process, for tests and single-process logs
//! - [`SqliteClient`]: durable single-node backend
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ct_consistent_store::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> StoreResult<()> {
//!     let client = Arc::new(MemoryClient::new());
//!     let store: ConsistentStore<LoggedCertificate> =
//!         ConsistentStore::new(client, "/ct", "node-1")?;
//!
//!     let mut cert = LoggedCertificate::x509(1_700_000_000_000, b"leaf".to_vec());
//!     match store.add_pending_entry(&mut cert).await {
//!         Ok(()) => println!("admitted"),
//!         Err(e) if e.code() == StatusCode::AlreadyExists => {
//!             println!("duplicate, original SCT at {}", cert.timestamp())
//!         }
//!         Err(e) => return Err(e),
//!     }
//!
//!     for handle in store.get_pending_entries().await? {
//!         println!("{:?} pending at {:?}", handle.entry().entry.entry_type, handle.key());
//!     }
//!     Ok(())
//! }
//! ```

pub mod certificate;
pub mod cluster;
pub mod config;
pub mod consistent;
pub mod coordination;
pub mod entry;
pub mod error;
pub mod invariant;
pub mod keys;
pub mod memory;
pub mod sqlite;
pub mod status;
pub mod watch;

#[cfg(test)]
mod testing;

// Re-export main types
pub use certificate::{CertificateEntry, EntryType, LoggedCertificate, SignedCertificateTimestamp};
pub use cluster::{ClusterNodeState, SignedTreeHead};
pub use crate::config::StoreConfig;
pub use consistent::ConsistentStore;
pub use coordination::{CoordinationClient, KeyValue, MAX_KEY_LENGTH};
pub use entry::{ContentHash, EntryHandle, LogEntry};
pub use error::StateError;
pub use invariant::InvariantViolation;
pub use keys::KeyLayout;
pub use memory::MemoryClient;
pub use sqlite::SqliteClient;
pub use status::{StatusCode, StoreError, StoreResult};
pub use watch::{EventType, WatchEvent, WatchStream};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::certificate::LoggedCertificate;
    pub use crate::cluster::{ClusterNodeState, SignedTreeHead};
    pub use crate::config::StoreConfig;
    pub use crate::consistent::ConsistentStore;
    pub use crate::coordination::CoordinationClient;
    pub use crate::entry::{EntryHandle, LogEntry};
    pub use crate::memory::MemoryClient;
    pub use crate::sqlite::SqliteClient;
    pub use crate::status::{StatusCode, StoreError, StoreResult};
}
