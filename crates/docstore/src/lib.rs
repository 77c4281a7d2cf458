use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared::error::BackendError;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

const LISTENER_CHANNEL_CAPACITY: usize = 64;

/// A raw document as held by the remote collection: string key plus untyped
/// payload. Schema mapping happens in the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub key: String,
    pub data: Value,
}

/// One push from the collection listener. A snapshot always carries the full
/// current membership, so a consumer that misses intermediate events still
/// converges on the next one.
#[derive(Debug, Clone)]
pub enum ListenerEvent {
    Snapshot(Vec<RawDocument>),
    /// Transient listener failure. Carries no documents; the feed stays open.
    Error(String),
}

/// Live feed handed out by [`DocumentBackend::subscribe`]: the membership as
/// of the subscribe call plus a receiver for every later change.
pub struct CollectionSubscription {
    pub initial: Vec<RawDocument>,
    pub events: broadcast::Receiver<ListenerEvent>,
}

/// The remote document collection the list syncs against: push-based change
/// notification plus upsert/delete by string key.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn subscribe(&self) -> Result<CollectionSubscription, BackendError>;
    async fn upsert(&self, key: &str, data: Value) -> Result<(), BackendError>;
    async fn delete(&self, key: &str) -> Result<(), BackendError>;
}

pub struct MissingBackend;

#[async_trait]
impl DocumentBackend for MissingBackend {
    async fn subscribe(&self) -> Result<CollectionSubscription, BackendError> {
        Err(BackendError::Unavailable(
            "document backend is unavailable".into(),
        ))
    }

    async fn upsert(&self, key: &str, _data: Value) -> Result<(), BackendError> {
        Err(BackendError::Unavailable(format!(
            "document backend is unavailable for upsert of {key}"
        )))
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        Err(BackendError::Unavailable(format!(
            "document backend is unavailable for delete of {key}"
        )))
    }
}

/// In-process document collection with push-based change notification.
/// Stands in for the hosted document store in tests and local runs; every
/// mutation publishes the full resulting membership to all subscribers.
pub struct MemoryCollection {
    documents: Mutex<BTreeMap<String, Value>>,
    events: broadcast::Sender<ListenerEvent>,
}

impl MemoryCollection {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(LISTENER_CHANNEL_CAPACITY);
        Arc::new(Self {
            documents: Mutex::new(BTreeMap::new()),
            events,
        })
    }

    /// Pushes a synthetic listener failure to every subscriber. Test hook
    /// for the transient-network-error path.
    pub fn push_listener_error(&self, message: impl Into<String>) {
        let _ = self.events.send(ListenerEvent::Error(message.into()));
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.documents.lock().await.get(key).cloned()
    }

    fn membership(documents: &BTreeMap<String, Value>) -> Vec<RawDocument> {
        documents
            .iter()
            .map(|(key, data)| RawDocument {
                key: key.clone(),
                data: data.clone(),
            })
            .collect()
    }

    fn publish(&self, documents: &BTreeMap<String, Value>) {
        // send fails only when nobody is subscribed; that is fine.
        let _ = self
            .events
            .send(ListenerEvent::Snapshot(Self::membership(documents)));
    }
}

#[async_trait]
impl DocumentBackend for MemoryCollection {
    async fn subscribe(&self) -> Result<CollectionSubscription, BackendError> {
        // Lock held across snapshot + subscribe so no change can slip
        // between the initial membership and the event feed.
        let documents = self.documents.lock().await;
        let subscription = CollectionSubscription {
            initial: Self::membership(&documents),
            events: self.events.subscribe(),
        };
        debug!(documents = documents.len(), "collection subscriber registered");
        Ok(subscription)
    }

    async fn upsert(&self, key: &str, data: Value) -> Result<(), BackendError> {
        let mut documents = self.documents.lock().await;
        documents.insert(key.to_string(), data);
        self.publish(&documents);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let mut documents = self.documents.lock().await;
        if documents.remove(key).is_some() {
            self.publish(&documents);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
