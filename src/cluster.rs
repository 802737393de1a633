//! Cluster-wide log state published through the consistent store.

use serde::{Deserialize, Serialize};

/// The log's published checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignedTreeHead {
    pub tree_size: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub sha256_root_hash: Vec<u8>,
    pub signature: Vec<u8>,
}

/// One node's view of log progress, for peers to aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterNodeState {
    pub node_id: String,
    /// Size of the tree this node has fully replicated.
    pub contiguous_tree_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_sth: Option<SignedTreeHead>,
    pub hostname: String,
    pub port: u16,
}
