//! Certificate-transparency log entries.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::entry::{ContentHash, LogEntry};

/// Kind of certificate submitted to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    X509,
    Precert,
}

impl EntryType {
    fn tag(self) -> u8 {
        match self {
            EntryType::X509 => 0,
            EntryType::Precert => 1,
        }
    }
}

/// Signed certificate timestamp issued when the log accepted the entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignedCertificateTimestamp {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<u8>,
}

/// The submitted certificate material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateEntry {
    pub entry_type: EntryType,
    pub leaf_certificate: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certificate_chain: Vec<Vec<u8>>,
}

/// A certificate submission together with its SCT and log position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedCertificate {
    pub sct: SignedCertificateTimestamp,
    pub entry: CertificateEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

impl LoggedCertificate {
    /// A pending X.509 entry with the given SCT timestamp.
    pub fn x509(timestamp: u64, leaf_certificate: impl Into<Vec<u8>>) -> Self {
        Self::new(EntryType::X509, timestamp, leaf_certificate)
    }

    pub fn precert(timestamp: u64, leaf_certificate: impl Into<Vec<u8>>) -> Self {
        Self::new(EntryType::Precert, timestamp, leaf_certificate)
    }

    fn new(entry_type: EntryType, timestamp: u64, leaf_certificate: impl Into<Vec<u8>>) -> Self {
        Self {
            sct: SignedCertificateTimestamp {
                timestamp,
                signature: Vec::new(),
            },
            entry: CertificateEntry {
                entry_type,
                leaf_certificate: leaf_certificate.into(),
                certificate_chain: Vec::new(),
            },
            sequence_number: None,
        }
    }

    pub fn with_sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    pub fn timestamp(&self) -> u64 {
        self.sct.timestamp
    }
}

impl LogEntry for LoggedCertificate {
    /// SHA-256 over the entry type and the leaf certificate.
    fn content_hash(&self) -> ContentHash {
        let mut hasher = Sha256::new();
        hasher.update([self.entry.entry_type.tag()]);
        hasher.update(&self.entry.leaf_certificate);
        ContentHash(hasher.finalize().into())
    }

    fn sequence_number(&self) -> Option<u64> {
        self.sequence_number
    }

    fn set_sequence_number(&mut self, sequence_number: u64) {
        self.sequence_number = Some(sequence_number);
    }

    /// The SCT is issued by whichever node accepted the submission first,
    /// and the same leaf may arrive with any valid chain. The first
    /// accepted chain is the one kept.
    fn normalize_backfilled(&mut self) {
        self.sct = SignedCertificateTimestamp::default();
        self.entry.certificate_chain.clear();
    }
}
