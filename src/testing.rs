//! Coordination clients for exercising the store's failure paths.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::coordination::{CoordinationClient, KeyValue};
use crate::error::{Result, StateError};
use crate::memory::MemoryClient;
use crate::watch::WatchStream;

/// Wraps a [`MemoryClient`] and fails the next listing or read on demand.
#[derive(Default)]
pub(crate) struct FaultyClient {
    pub(crate) inner: MemoryClient,
    next_get_all: Mutex<Option<StateError>>,
    next_get: Mutex<Option<StateError>>,
    next_get_vanishes: Mutex<bool>,
}

impl FaultyClient {
    pub(crate) fn fail_next_get_all(&self, err: StateError) {
        *self.next_get_all.lock() = Some(err);
    }

    pub(crate) fn fail_next_get(&self, err: StateError) {
        *self.next_get.lock() = Some(err);
    }

    /// The next read reports the key as absent, as if it was deleted
    /// between a write and its read-back.
    pub(crate) fn vanish_next_get(&self) {
        *self.next_get_vanishes.lock() = true;
    }
}

#[async_trait]
impl CoordinationClient for FaultyClient {
    async fn get(&self, key: &str) -> Result<Option<KeyValue>> {
        if let Some(err) = self.next_get.lock().take() {
            return Err(err);
        }
        if std::mem::take(&mut *self.next_get_vanishes.lock()) {
            return Ok(None);
        }
        self.inner.get(key).await
    }

    async fn get_all(&self, prefix: &str) -> Result<Vec<KeyValue>> {
        if let Some(err) = self.next_get_all.lock().take() {
            return Err(err);
        }
        self.inner.get_all(prefix).await
    }

    async fn create_if_not_exists(&self, key: &str, value: Vec<u8>) -> Result<u64> {
        self.inner.create_if_not_exists(key, value).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<u64> {
        self.inner.set(key, value).await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected_version: u64,
        value: Vec<u8>,
    ) -> Result<u64> {
        self.inner.compare_and_set(key, expected_version, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    fn watch(&self, prefix: &str) -> Result<WatchStream> {
        self.inner.watch(prefix)
    }
}

/// Panics on every call. Proves an operation fails before any round trip.
pub(crate) struct UntouchableClient;

const TOUCHED: &str = "coordination client must not be called";

#[async_trait]
impl CoordinationClient for UntouchableClient {
    async fn get(&self, _key: &str) -> Result<Option<KeyValue>> {
        panic!("{TOUCHED}")
    }

    async fn get_all(&self, _prefix: &str) -> Result<Vec<KeyValue>> {
        panic!("{TOUCHED}")
    }

    async fn create_if_not_exists(&self, _key: &str, _value: Vec<u8>) -> Result<u64> {
        panic!("{TOUCHED}")
    }

    async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<u64> {
        panic!("{TOUCHED}")
    }

    async fn compare_and_set(
        &self,
        _key: &str,
        _expected_version: u64,
        _value: Vec<u8>,
    ) -> Result<u64> {
        panic!("{TOUCHED}")
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        panic!("{TOUCHED}")
    }

    fn watch(&self, _prefix: &str) -> Result<WatchStream> {
        panic!("{TOUCHED}")
    }
}
