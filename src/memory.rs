//! In-memory coordination client.
//!
//! Every operation runs under a single lock, so conditional writes are
//! linearizable within the process. Data is lost on process exit; use
//! this for tests and single-process deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::coordination::{validate_key, CoordinationClient, KeyValue};
use crate::error::{Result, StateError};
use crate::watch::{WatchEvent, WatchSender, WatchStream};

/// In-memory implementation of [`CoordinationClient`].
///
/// Uses a BTreeMap so prefix listings come back in key order.
/// Clones share the same underlying data.
#[derive(Clone)]
pub struct MemoryClient {
    data: Arc<RwLock<BTreeMap<String, KeyValue>>>,
    watcher: WatchSender,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            watcher: WatchSender::new(1024),
        }
    }

    /// Get the number of keys in the store.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn put_locked(
        data: &mut BTreeMap<String, KeyValue>,
        key: &str,
        value: Vec<u8>,
    ) -> (u64, WatchEvent) {
        let previous = data.get(key).map(|kv| (kv.version, kv.value.clone()));
        let version = previous.as_ref().map(|(v, _)| v + 1).unwrap_or(1);
        data.insert(
            key.to_string(),
            KeyValue {
                key: key.to_string(),
                value: value.clone(),
                version,
            },
        );
        let event = match previous {
            Some((_, prev)) => WatchEvent::updated(key, prev, value, version),
            None => WatchEvent::created(key, value, version),
        };
        (version, event)
    }
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoordinationClient for MemoryClient {
    async fn get(&self, key: &str) -> Result<Option<KeyValue>> {
        validate_key(key)?;
        Ok(self.data.read().get(key).cloned())
    }

    async fn get_all(&self, prefix: &str) -> Result<Vec<KeyValue>> {
        let data = self.data.read();
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, kv)| kv.clone())
            .collect())
    }

    async fn create_if_not_exists(&self, key: &str, value: Vec<u8>) -> Result<u64> {
        validate_key(key)?;

        let mut data = self.data.write();
        if data.contains_key(key) {
            return Err(StateError::AlreadyExists(key.to_string()));
        }
        let (version, event) = Self::put_locked(&mut data, key, value);
        drop(data);

        self.watcher.send(event);
        Ok(version)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<u64> {
        validate_key(key)?;

        let mut data = self.data.write();
        let (version, event) = Self::put_locked(&mut data, key, value);
        drop(data);

        self.watcher.send(event);
        Ok(version)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected_version: u64,
        value: Vec<u8>,
    ) -> Result<u64> {
        validate_key(key)?;

        let mut data = self.data.write();
        let current_version = data.get(key).map(|kv| kv.version).unwrap_or(0);
        if current_version != expected_version {
            return Err(StateError::VersionConflict {
                key: key.to_string(),
                expected: expected_version,
                found: current_version,
            });
        }
        let (version, event) = Self::put_locked(&mut data, key, value);
        drop(data);

        self.watcher.send(event);
        Ok(version)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let removed = self.data.write().remove(key);
        if let Some(kv) = removed {
            self.watcher.send(WatchEvent::deleted(key, kv.value));
        }
        Ok(())
    }

    fn watch(&self, prefix: &str) -> Result<WatchStream> {
        Ok(self.watcher.subscribe(prefix))
    }
}
