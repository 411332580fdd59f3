//! Progress publication.
//!
//! Provides a decoupled way for the scheduler to emit progress events that
//! any number of transports can subscribe to: a broadcast channel carries
//! every event, while per-operation subscribers registered at enqueue time
//! are invoked synchronously on publish.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::warn;

use opq_core::Progress;

/// Callback registered for a single operation's progress updates.
pub trait ProgressSubscriber: Send + Sync {
    fn on_progress(&self, progress: &Progress);
}

pub struct ProgressBus {
    tx: broadcast::Sender<Progress>,
    subscribers: RwLock<HashMap<String, Vec<Arc<dyn ProgressSubscriber>>>>,
}

impl ProgressBus {
    /// Create a new bus with the specified broadcast capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to every progress event published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<Progress> {
        self.tx.subscribe()
    }

    /// Register a callback for one operation's updates.
    pub fn subscribe_operation(&self, id: &str, subscriber: Arc<dyn ProgressSubscriber>) {
        self.subscribers
            .write()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push(subscriber);
    }

    /// Publish an event to the broadcast channel and to the operation's
    /// subscribers. A panicking subscriber is logged and skipped so it
    /// cannot break publication to the others.
    pub fn publish(&self, progress: &Progress) {
        // Ignore send errors (no subscribers)
        let _ = self.tx.send(progress.clone());

        let subscribers = {
            let map = self.subscribers.read().unwrap();
            map.get(&progress.operation_id).cloned()
        };
        let Some(subscribers) = subscribers else {
            return;
        };
        for subscriber in subscribers {
            if catch_unwind(AssertUnwindSafe(|| subscriber.on_progress(progress))).is_err() {
                warn!(
                    "progress subscriber panicked for operation {}",
                    progress.operation_id
                );
            }
        }
    }

    /// Drop all subscriptions for an operation. Called when its store entry
    /// is purged.
    pub fn discard(&self, id: &str) {
        self.subscribers.write().unwrap().remove(id);
    }
}
