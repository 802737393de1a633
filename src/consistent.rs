//! The consistent entry store.
//!
//! [`ConsistentStore`] gives a log server one linearizable view of which
//! entries have been submitted and which have a position in the log. It
//! holds no mutable state: every operation is one or two round trips to
//! the coordination service, and exactly-once admission rests entirely on
//! the service's create-if-absent.
//!
//! Failures reported by the coordination service come back as a
//! [`StoreError`]. A broken namespace invariant does not: the store calls
//! [`halt`] instead.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::cluster::{ClusterNodeState, SignedTreeHead};
use crate::config::StoreConfig;
use crate::coordination::{CoordinationClient, KeyValue};
use crate::entry::{decode, encode, encode_normalized, EntryHandle, LogEntry};
use crate::invariant::{halt, InvariantViolation};
use crate::keys::KeyLayout;
use crate::status::{StoreError, StoreResult};

/// Consistent view of pending and sequenced log entries.
pub struct ConsistentStore<T> {
    client: Arc<dyn CoordinationClient>,
    keys: KeyLayout,
    node_id: String,
    _entry: PhantomData<fn() -> T>,
}

impl<T: LogEntry> ConsistentStore<T> {
    /// Create a store rooted at `root` for the node `node_id`.
    pub fn new(
        client: Arc<dyn CoordinationClient>,
        root: impl Into<String>,
        node_id: impl Into<String>,
    ) -> StoreResult<Self> {
        Self::from_config(client, &StoreConfig::new(root, node_id))
    }

    pub fn from_config(client: Arc<dyn CoordinationClient>, config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            client,
            keys: KeyLayout::new(config.root.as_str()),
            node_id: config.node_id.clone(),
            _entry: PhantomData,
        })
    }

    pub fn root(&self) -> &str {
        self.keys.root()
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn keys(&self) -> &KeyLayout {
        &self.keys
    }

    /// Admit `entry` as pending, exactly once per distinct content.
    ///
    /// Returns `Ok(())` if this call created the entry. If an identical
    /// entry was already admitted, `entry` is replaced by the stored copy
    /// (so the caller sees the original SCT) and `AlreadyExists` is
    /// returned.
    ///
    /// # Panics
    ///
    /// Halts if `entry` already has a sequence number, or if a different
    /// entry is stored under the same content hash.
    pub async fn add_pending_entry(&self, entry: &mut T) -> StoreResult<()> {
        let key = self.keys.unsequenced_key(entry);
        if let Some(sequence_number) = entry.sequence_number() {
            halt(InvariantViolation::SubmittedSequencedEntry {
                key,
                sequence_number,
            });
        }

        let value = encode(entry)?;
        match self.client.create_if_not_exists(&key, value).await {
            Ok(version) => {
                debug!(%key, version, "admitted pending entry");
                Ok(())
            }
            Err(err) => match StoreError::from(err) {
                StoreError::FailedPrecondition(_) => self.adopt_preexisting(&key, entry).await,
                other => Err(other),
            },
        }
    }

    /// Validate the entry stored at `key` against `entry` and hand it back.
    async fn adopt_preexisting(&self, key: &str, entry: &mut T) -> StoreResult<()> {
        let kv = self
            .client
            .get(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let preexisting: T = decode_stored(&kv);
        if let Some(sequence_number) = preexisting.sequence_number() {
            halt(InvariantViolation::SequencedEntryInPendingNamespace {
                key: kv.key,
                sequence_number,
            });
        }
        if encode_normalized(&preexisting)? != encode_normalized(entry)? {
            halt(InvariantViolation::ContentMismatch { key: kv.key });
        }

        debug!(%key, version = kv.version, "pending entry already admitted");
        *entry = preexisting;
        Err(StoreError::AlreadyExists(kv.key))
    }

    /// Every entry under the pending namespace.
    ///
    /// # Panics
    ///
    /// Halts if any listed entry carries a sequence number.
    pub async fn get_pending_entries(&self) -> StoreResult<Vec<EntryHandle<T>>> {
        let prefix = self.keys.unsequenced_prefix();
        let listed = self.client.get_all(&prefix).await?;

        let entries: Vec<EntryHandle<T>> = listed
            .into_iter()
            .map(|kv| {
                let entry: T = decode_stored(&kv);
                if let Some(sequence_number) = entry.sequence_number() {
                    halt(InvariantViolation::SequencedEntryInPendingNamespace {
                        key: kv.key,
                        sequence_number,
                    });
                }
                EntryHandle::with_metadata(entry, kv.key, kv.version)
            })
            .collect();

        debug!(%prefix, count = entries.len(), "listed pending entries");
        Ok(entries)
    }

    /// Every entry under the sequenced namespace, in sequence order.
    ///
    /// # Panics
    ///
    /// Halts if any listed entry has no sequence number, or is stored under
    /// a position other than its own.
    pub async fn get_sequenced_entries(&self) -> StoreResult<Vec<EntryHandle<T>>> {
        let prefix = self.keys.sequenced_prefix();
        let listed = self.client.get_all(&prefix).await?;

        let mut entries: Vec<(u64, EntryHandle<T>)> = listed
            .into_iter()
            .map(|kv| {
                let entry: T = decode_stored(&kv);
                let Some(sequence_number) = entry.sequence_number() else {
                    halt(InvariantViolation::UnsequencedEntryInSequencedNamespace {
                        key: kv.key,
                    })
                };
                if kv.key != self.keys.sequenced_key(sequence_number) {
                    halt(InvariantViolation::MisplacedSequencedEntry {
                        key: kv.key,
                        sequence_number,
                    });
                }
                (
                    sequence_number,
                    EntryHandle::with_metadata(entry, kv.key, kv.version),
                )
            })
            .collect();
        // Keys sort lexically ("10" < "9").
        entries.sort_by_key(|(sequence_number, _)| *sequence_number);

        debug!(%prefix, count = entries.len(), "listed sequenced entries");
        Ok(entries.into_iter().map(|(_, handle)| handle).collect())
    }

    /// Move a pending entry to log position `sequence_number`.
    ///
    /// The transition protocol is not defined yet: after checking the
    /// precondition this reports `Unimplemented` and touches nothing.
    ///
    /// # Panics
    ///
    /// Halts if the entry already has a sequence number.
    pub async fn assign_sequence_number(
        &self,
        sequence_number: u64,
        handle: &mut EntryHandle<T>,
    ) -> StoreResult<()> {
        if let Some(existing) = handle.entry().sequence_number() {
            halt(InvariantViolation::ResequencedEntry {
                existing,
                requested: sequence_number,
            });
        }
        Err(StoreError::Unimplemented("assign_sequence_number"))
    }

    /// The next free log position.
    ///
    /// # Panics
    ///
    /// Always: how the next position is chosen under concurrent assignment
    /// is not defined yet.
    pub async fn next_available_sequence_number(&self) -> u64 {
        unimplemented!("next_available_sequence_number")
    }

    /// Publish the STH this cluster is serving.
    pub async fn set_serving_sth(&self, _sth: &SignedTreeHead) -> StoreResult<()> {
        Err(StoreError::Unimplemented("set_serving_sth"))
    }

    /// Record this node's view of log progress for its peers.
    pub async fn set_cluster_node_state(&self, _state: &ClusterNodeState) -> StoreResult<()> {
        Err(StoreError::Unimplemented("set_cluster_node_state"))
    }
}

fn decode_stored<T: LogEntry>(kv: &KeyValue) -> T {
    match decode(&kv.value) {
        Ok(entry) => entry,
        Err(e) => halt(InvariantViolation::UndecodableEntry {
            key: kv.key.clone(),
            reason: e.to_string(),
        }),
    }
}
