//! Store configuration.
//!
//! Loaded from an optional TOML file, then overridden by `CT_STORE_*`
//! environment variables (`CT_STORE_ROOT`, `CT_STORE_NODE_ID`).

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::coordination::validate_key;
use crate::status::{StoreError, StoreResult};

/// Immutable settings for one [`ConsistentStore`](crate::ConsistentStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Prefix under which both entry namespaces live.
    #[serde(default = "default_root")]
    pub root: String,

    /// This node's identifier within the log cluster.
    pub node_id: String,
}

fn default_root() -> String {
    "/ct".to_string()
}

impl StoreConfig {
    pub fn new(root: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            node_id: node_id.into(),
        }
    }

    /// Load from `path` (if given) layered under the environment.
    pub fn load(path: Option<&Path>) -> StoreResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config: StoreConfig = builder
            .add_source(Environment::with_prefix("CT_STORE"))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| StoreError::InvalidArgument(format!("store config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        validate_key(&self.root)
            .map_err(|e| StoreError::InvalidArgument(format!("root {:?}: {e}", self.root)))?;
        if self.node_id.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "node_id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
