//! Fatal invariant violations.
//!
//! These describe states that must be structurally impossible: a sequenced
//! entry in the pending namespace, two different entries under one content
//! hash, and so on. They are never returned as a [`StoreError`]; the store
//! calls [`halt`] and the process stops.
//!
//! [`StoreError`]: crate::StoreError

use thiserror::Error;
use tracing::error;

/// An invariant of the entry namespaces that has been broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// `add_pending_entry` was handed an entry that is already sequenced.
    #[error("entry submitted as pending already carries sequence number {sequence_number} (key {key})")]
    SubmittedSequencedEntry { key: String, sequence_number: u64 },

    /// `assign_sequence_number` was handed an entry that is already sequenced.
    #[error("entry already carries sequence number {existing}, refusing to assign {requested}")]
    ResequencedEntry { existing: u64, requested: u64 },

    /// A value under the unsequenced prefix carries a sequence number.
    #[error("entry in pending namespace carries sequence number {sequence_number} (key {key})")]
    SequencedEntryInPendingNamespace { key: String, sequence_number: u64 },

    /// A value under the sequenced prefix has no sequence number.
    #[error("entry in sequenced namespace has no sequence number (key {key})")]
    UnsequencedEntryInSequencedNamespace { key: String },

    /// A value under the sequenced prefix is stored at a position other
    /// than its own sequence number.
    #[error("entry at {key} carries sequence number {sequence_number}, which does not match its key")]
    MisplacedSequencedEntry { key: String, sequence_number: u64 },

    /// The stored entry shares a content hash with the submitted one but
    /// differs in content.
    #[error("preexisting entry at {key} differs from the submitted entry with the same content hash")]
    ContentMismatch { key: String },

    #[error("stored entry at {key} cannot be decoded: {reason}")]
    UndecodableEntry { key: String, reason: String },
}

/// Logs the violation and stops the current thread of execution.
///
/// Panics with the violation's message. Run the log server with
/// `panic = "abort"` to turn this into an immediate process exit.
#[track_caller]
pub fn halt(violation: InvariantViolation) -> ! {
    error!(%violation, "consistent store invariant violated");
    panic!("invariant violated: {violation}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_entry() {
        let v = InvariantViolation::SequencedEntryInPendingNamespace {
            key: "/ct/unsequenced/abc=".to_string(),
            sequence_number: 666,
        };
        let msg = v.to_string();
        assert!(msg.contains("666"));
        assert!(msg.contains("/ct/unsequenced/abc="));
    }

    #[test]
    #[should_panic(expected = "invariant violated: entry already carries sequence number 44")]
    fn test_halt_panics_with_violation() {
        halt(InvariantViolation::ResequencedEntry {
            existing: 44,
            requested: 1,
        });
    }
}
