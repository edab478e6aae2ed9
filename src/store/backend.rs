//! Record backend seam and the in-memory implementation.
//!
//! The backend is a hierarchical key-value tree with realtime change
//! notification: watching a collection path yields the current snapshot
//! immediately and a fresh snapshot after every write to that path.

use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Collection path for user records.
pub const USERS_PATH: &str = "users";
/// Collection path for order records.
pub const ORDERS_PATH: &str = "order";
/// Collection path for storable catalog items.
pub const STORABLE_OBJECTS_PATH: &str = "storableobjects";
/// Collection path for vendor companies.
pub const COMPANIES_PATH: &str = "Companies";

/// Event delivered on a collection watch.
#[derive(Debug, Clone)]
pub enum RecordEvent {
    /// Full snapshot of the collection subtree after a change.
    Snapshot(Value),
    /// Backend-reported failure (e.g. permission denial). The watch stays
    /// open and later snapshots are still delivered.
    Error(String),
}

/// Typed access to the remote hierarchical record store.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Open a long-lived watch on a collection path.
    ///
    /// The receiver gets the current snapshot immediately, then one
    /// snapshot per remote change, preserving backend delivery order.
    /// Dropping the receiver cancels this watch without affecting other
    /// watchers.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch cannot be established.
    async fn watch(&self, path: &str) -> Result<mpsc::UnboundedReceiver<RecordEvent>>;

    /// Replace the record at `{path}/{id}` with `value`.
    ///
    /// Whole-record overwrite, last-write-wins; no merge, no concurrency
    /// check.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected by the backend.
    async fn put(&self, path: &str, id: &str, value: Value) -> Result<()>;
}

/// In-memory [`RecordBackend`] for demo mode and tests.
///
/// Cloning is cheap and shares the underlying tree, so a clone can feed
/// data to a store created from another clone.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<String, serde_json::Map<String, Value>>,
    watchers: HashMap<String, Vec<mpsc::UnboundedSender<RecordEvent>>>,
}

impl MemoryState {
    /// Fan an event out to every live watcher of `path`, pruning closed ones.
    fn notify(&mut self, path: &str, event: &RecordEvent) {
        if let Some(watchers) = self.watchers.get_mut(path) {
            watchers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an error event to every watcher of `path`.
    ///
    /// Mirrors backend-side failures (permission denial and the like) so
    /// that the error channel can be exercised without a real backend.
    pub fn emit_error(&self, path: &str, message: &str) {
        let mut state = self.inner.lock();
        state.notify(path, &RecordEvent::Error(message.to_string()));
    }

    /// Current snapshot of the collection at `path`.
    #[must_use]
    pub fn snapshot(&self, path: &str) -> Value {
        let state = self.inner.lock();
        Value::Object(state.collections.get(path).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl RecordBackend for MemoryBackend {
    async fn watch(&self, path: &str) -> Result<mpsc::UnboundedReceiver<RecordEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.inner.lock();

        let snapshot = state.collections.get(path).cloned().unwrap_or_default();
        // The receiver is still in scope, so the initial send cannot fail.
        let _ = tx.send(RecordEvent::Snapshot(Value::Object(snapshot)));

        state.watchers.entry(path.to_string()).or_default().push(tx);
        debug!(path, "memory backend watch opened");
        Ok(rx)
    }

    async fn put(&self, path: &str, id: &str, value: Value) -> Result<()> {
        let mut state = self.inner.lock();
        state
            .collections
            .entry(path.to_string())
            .or_default()
            .insert(id.to_string(), value);

        let snapshot = Value::Object(state.collections.get(path).cloned().unwrap_or_default());
        state.notify(path, &RecordEvent::Snapshot(snapshot));
        debug!(path, id, "memory backend record replaced");
        Ok(())
    }
}
