//! Change notifications for keys under a prefix.
//!
//! Backends publish every successful mutation on a broadcast channel;
//! each [`WatchStream`] filters that channel down to one prefix. A slow
//! subscriber that falls behind the channel capacity silently skips the
//! events it missed and should re-list the prefix.

use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

/// Type of change that occurred to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// Key was created (did not exist before).
    Created,
    /// Key existed and its value was replaced.
    Updated,
    Deleted,
}

/// A change to one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEvent {
    pub key: String,
    pub event_type: EventType,
    /// Value before the change (updates and deletes).
    pub prev_value: Option<Vec<u8>>,
    /// Value after the change (creates and updates).
    pub value: Option<Vec<u8>>,
    /// Version after the change, 0 once deleted.
    pub version: u64,
}

impl WatchEvent {
    pub fn created(key: impl Into<String>, value: Vec<u8>, version: u64) -> Self {
        Self {
            key: key.into(),
            event_type: EventType::Created,
            prev_value: None,
            value: Some(value),
            version,
        }
    }

    pub fn updated(
        key: impl Into<String>,
        prev_value: Vec<u8>,
        value: Vec<u8>,
        version: u64,
    ) -> Self {
        Self {
            key: key.into(),
            event_type: EventType::Updated,
            prev_value: Some(prev_value),
            value: Some(value),
            version,
        }
    }

    pub fn deleted(key: impl Into<String>, prev_value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            event_type: EventType::Deleted,
            prev_value: Some(prev_value),
            value: None,
            version: 0,
        }
    }
}

/// A stream of watch events for keys under one prefix.
pub struct WatchStream {
    inner: Pin<Box<dyn Stream<Item = WatchEvent> + Send>>,
    prefix: String,
}

impl WatchStream {
    pub fn new(receiver: broadcast::Receiver<WatchEvent>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let filter = prefix.clone();
        let inner = BroadcastStream::new(receiver).filter_map(move |item| match item {
            Ok(event) if event.key.starts_with(&filter) => Some(event),
            // Lagged receivers drop what they missed.
            _ => None,
        });
        Self {
            inner: Box::pin(inner),
            prefix,
        }
    }

    /// The prefix this stream is watching.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Stream for WatchStream {
    type Item = WatchEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Handle for sending watch events to subscribers.
#[derive(Clone)]
pub struct WatchSender {
    sender: broadcast::Sender<WatchEvent>,
}

impl WatchSender {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event to all subscribers.
    pub fn send(&self, event: WatchEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self, prefix: impl Into<String>) -> WatchStream {
        WatchStream::new(self.sender.subscribe(), prefix)
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WatchSender {
    fn default() -> Self {
        Self::new(1024)
    }
}
