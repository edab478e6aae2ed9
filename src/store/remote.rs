//! Record store facade: subscriptions, normalization and upserts.

use crate::error::{Error, Result};
use crate::model::{StorableObject, StorageCompany};
use crate::store::backend::{
    RecordBackend, RecordEvent, COMPANIES_PATH, ORDERS_PATH, STORABLE_OBJECTS_PATH, USERS_PATH,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A long-lived subscription to one collection.
///
/// Every backend snapshot is decoded into a full replacement `Vec<T>` and
/// delivered on the update channel; backend failures arrive on the separate
/// error channel without closing the subscription. Dropping the
/// subscription (or calling [`cancel`](Self::cancel)) stops further
/// notifications for this subscriber only.
pub struct CollectionSubscription<T> {
    updates: mpsc::UnboundedReceiver<Vec<T>>,
    errors: mpsc::UnboundedReceiver<Error>,
    task: JoinHandle<()>,
}

impl<T> CollectionSubscription<T> {
    /// Wait for the next full-collection update.
    ///
    /// Returns `None` once the subscription is cancelled.
    pub async fn next_update(&mut self) -> Option<Vec<T>> {
        self.updates.recv().await
    }

    /// Take an update if one is already queued.
    pub fn try_next_update(&mut self) -> Option<Vec<T>> {
        self.updates.try_recv().ok()
    }

    /// Wait for the next backend error.
    pub async fn next_error(&mut self) -> Option<Error> {
        self.errors.recv().await
    }

    /// Stop the subscription. No further updates or errors are delivered.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl<T> Drop for CollectionSubscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Fetches and normalizes nested backend records into flat catalog
/// entities.
///
/// Holds no persistence beyond an in-memory copy of the last successful
/// fetch per collection, replaced atomically on every snapshot.
pub struct RemoteRecordStore {
    backend: Arc<dyn RecordBackend>,
    storable_objects: Arc<Mutex<Vec<StorableObject>>>,
    storage_companies: Arc<Mutex<Vec<StorageCompany>>>,
}

impl RemoteRecordStore {
    /// Create a store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self {
            backend,
            storable_objects: Arc::new(Mutex::new(Vec::new())),
            storage_companies: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Last successfully fetched storable objects.
    #[must_use]
    pub fn storable_objects(&self) -> Vec<StorableObject> {
        self.storable_objects.lock().clone()
    }

    /// Last successfully fetched storage companies.
    #[must_use]
    pub fn storage_companies(&self) -> Vec<StorageCompany> {
        self.storage_companies.lock().clone()
    }

    /// Subscribe to the catalog-items collection.
    ///
    /// Entries with the wrong shape are skipped rather than erroring the
    /// whole fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend watch cannot be established.
    pub async fn fetch_storable_objects(
        &self,
    ) -> Result<CollectionSubscription<StorableObject>> {
        let events = self.backend.watch(STORABLE_OBJECTS_PATH).await?;
        Ok(subscribe(
            events,
            STORABLE_OBJECTS_PATH,
            Arc::clone(&self.storable_objects),
            decode_storable_objects,
        ))
    }

    /// Subscribe to the vendor-companies collection.
    ///
    /// Performs the three-level price-index flatten; companies missing a
    /// name or price index are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend watch cannot be established.
    pub async fn fetch_companies(&self) -> Result<CollectionSubscription<StorageCompany>> {
        let events = self.backend.watch(COMPANIES_PATH).await?;
        Ok(subscribe(
            events,
            COMPANIES_PATH,
            Arc::clone(&self.storage_companies),
            decode_companies,
        ))
    }

    /// Upsert a user record (whole-record replace).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub async fn create_user(&self, id: &str, fields: &HashMap<String, String>) -> Result<()> {
        self.backend
            .put(USERS_PATH, id, to_record(fields)?)
            .await
    }

    /// Upsert an order record (whole-record replace).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub async fn create_order(&self, id: &str, fields: &HashMap<String, String>) -> Result<()> {
        self.backend
            .put(ORDERS_PATH, id, to_record(fields)?)
            .await
    }
}

/// Bridge a backend watch into a decoded subscription.
///
/// Each snapshot replaces `cache` atomically before the update is pushed,
/// so `storable_objects()`/`storage_companies()` always reflect the last
/// delivered state.
fn subscribe<T>(
    mut events: mpsc::UnboundedReceiver<RecordEvent>,
    path: &'static str,
    cache: Arc<Mutex<Vec<T>>>,
    decode: fn(&Value) -> Vec<T>,
) -> CollectionSubscription<T>
where
    T: Clone + Send + 'static,
{
    let (updates_tx, updates) = mpsc::unbounded_channel();
    let (errors_tx, errors) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                RecordEvent::Snapshot(value) => {
                    let decoded = decode(&value);
                    debug!(path, count = decoded.len(), "collection replaced");
                    *cache.lock() = decoded.clone();
                    if updates_tx.send(decoded).is_err() {
                        break;
                    }
                }
                RecordEvent::Error(message) => {
                    warn!(path, %message, "record store backend error");
                    // Errors go to their own channel; the watch stays up.
                    let _ = errors_tx.send(Error::RecordStore(message));
                }
            }
        }
    });

    CollectionSubscription {
        updates,
        errors,
        task,
    }
}

fn to_record(fields: &HashMap<String, String>) -> Result<Value> {
    serde_json::to_value(fields).map_err(|e| Error::RecordStore(e.to_string()))
}

/// Decode a storable-objects snapshot (`{id: name}` map).
fn decode_storable_objects(snapshot: &Value) -> Vec<StorableObject> {
    let Some(entries) = snapshot.as_object() else {
        return Vec::new();
    };
    entries
        .values()
        .filter_map(Value::as_str)
        .map(StorableObject::new)
        .collect()
}

/// Decode a companies snapshot, skipping malformed entries.
fn decode_companies(snapshot: &Value) -> Vec<StorageCompany> {
    let Some(entries) = snapshot.as_object() else {
        return Vec::new();
    };
    entries.values().filter_map(decode_company).collect()
}

/// A company record needs a `name` and a `Price Index` subtree; anything
/// else is optional.
fn decode_company(record: &Value) -> Option<StorageCompany> {
    let name = record.get("name")?.as_str()?;
    let index = record.get("Price Index")?.as_object()?;

    Some(StorageCompany {
        name: name.to_string(),
        price_index: flatten_price_index(index),
        pickup_times: decode_times(record.get("Pickup Times")),
        dropoff_times: decode_times(record.get("Dropoff Times")),
        image: crate::blob::Blob::default(),
    })
}

/// Flatten the nested item → option → price tree into item-name → price.
///
/// Options of the same item overwrite each other and duplicate item names
/// collide last-write-wins; both are accepted lossy-merge policy, not
/// errors. Malformed leaves are skipped silently.
fn flatten_price_index(index: &serde_json::Map<String, Value>) -> HashMap<String, f64> {
    let mut prices = HashMap::new();
    for item in index.values() {
        let Some(item) = item.as_object() else {
            continue;
        };
        let Some(item_name) = item.get("name").and_then(Value::as_str) else {
            continue;
        };
        for option in item.values() {
            // Skips the `name` string field itself.
            let Some(option) = option.as_object() else {
                continue;
            };
            if let Some(price) = option.get("price").and_then(Value::as_f64) {
                prices.insert(item_name.to_string(), price);
            }
        }
    }
    prices
}

/// Decode an optional array of RFC 3339 timestamps, skipping malformed
/// entries.
fn decode_times(value: Option<&Value>) -> Vec<DateTime<Utc>> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::store::backend::MemoryBackend;
    use serde_json::json;

    fn memory_store() -> (MemoryBackend, RemoteRecordStore) {
        let backend = MemoryBackend::new();
        let store = RemoteRecordStore::new(Arc::new(backend.clone()));
        (backend, store)
    }

    fn company_record() -> Value {
        json!({
            "name": "Campus Storage Co",
            "Price Index": {
                "item1": {
                    "name": "Mini Fridge",
                    "small": { "price": 10.0 },
                    "large": { "price": 15.0 }
                },
                "item2": {
                    "name": "Futon",
                    "standard": { "price": 25.5 }
                }
            },
            "Pickup Times": ["2017-05-20T09:00:00Z", "not-a-time"]
        })
    }

    #[test]
    fn test_decode_storable_objects_skips_wrong_shapes() {
        let snapshot = json!({
            "a": "Mini Fridge",
            "b": 42,
            "c": "Futon",
            "d": { "name": "nested" }
        });
        let mut objects = decode_storable_objects(&snapshot);
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            objects,
            vec![StorableObject::new("Futon"), StorableObject::new("Mini Fridge")]
        );
    }

    #[test]
    fn test_company_without_price_index_is_skipped() {
        let snapshot = json!({
            "c1": { "name": "No Prices Inc" },
            "c2": company_record()
        });
        let companies = decode_companies(&snapshot);
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Campus Storage Co");
    }

    #[test]
    fn test_company_without_name_is_skipped() {
        let snapshot = json!({
            "c1": { "Price Index": {} }
        });
        assert!(decode_companies(&snapshot).is_empty());
    }

    #[test]
    fn test_price_index_flatten() {
        let companies = decode_companies(&json!({ "c": company_record() }));
        let index = &companies[0].price_index;

        // Options within an item overwrite each other; "small" sorts after
        // "large" so its price is the one kept.
        assert_eq!(index.get("Mini Fridge"), Some(&10.0));
        assert_eq!(index.get("Futon"), Some(&25.5));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_price_index_skips_malformed_leaves() {
        let snapshot = json!({
            "c": {
                "name": "Lossy Co",
                "Price Index": {
                    "item1": {
                        "name": "Desk",
                        "ok": { "price": 12.0 },
                        "bad_string_price": { "price": "twelve" },
                        "no_price": { "note": "call us" }
                    },
                    "nameless_item": {
                        "opt": { "price": 99.0 }
                    },
                    "not_an_object": 7
                }
            }
        });
        let companies = decode_companies(&snapshot);
        assert_eq!(companies[0].price_index, HashMap::from([("Desk".to_string(), 12.0)]));
    }

    #[test]
    fn test_pickup_times_skip_malformed() {
        let companies = decode_companies(&json!({ "c": company_record() }));
        assert_eq!(companies[0].pickup_times.len(), 1);
        assert!(companies[0].dropoff_times.is_empty());
    }

    #[tokio::test]
    async fn test_subscription_replaces_collection_per_update() {
        let (backend, store) = memory_store();
        let mut sub = store.fetch_storable_objects().await.unwrap();

        // Initial snapshot of an empty collection.
        assert_eq!(sub.next_update().await.unwrap(), Vec::new());

        backend
            .put(STORABLE_OBJECTS_PATH, "a", json!("Mini Fridge"))
            .await
            .unwrap();
        let first = sub.next_update().await.unwrap();
        assert_eq!(first, vec![StorableObject::new("Mini Fridge")]);
        assert_eq!(store.storable_objects(), first);

        backend
            .put(STORABLE_OBJECTS_PATH, "b", json!("Futon"))
            .await
            .unwrap();
        let second = sub.next_update().await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(store.storable_objects(), second);
    }

    #[tokio::test]
    async fn test_errors_use_dedicated_channel_and_keep_subscription() {
        let (backend, store) = memory_store();
        let mut sub = store.fetch_companies().await.unwrap();
        sub.next_update().await.unwrap();

        backend.emit_error(COMPANIES_PATH, "permission denied");
        let err = sub.next_error().await.unwrap();
        assert!(matches!(err, Error::RecordStore(_)));
        assert!(err.to_string().contains("permission denied"));

        // Subscription survives the error.
        backend
            .put(COMPANIES_PATH, "c", company_record())
            .await
            .unwrap();
        let companies = sub.next_update().await.unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(store.storage_companies(), companies);
    }

    #[tokio::test]
    async fn test_cancel_stops_one_subscriber_only() {
        let (backend, store) = memory_store();
        let mut kept = store.fetch_storable_objects().await.unwrap();
        let cancelled = store.fetch_storable_objects().await.unwrap();
        kept.next_update().await.unwrap();

        cancelled.cancel();
        backend
            .put(STORABLE_OBJECTS_PATH, "a", json!("Bike"))
            .await
            .unwrap();

        let update = kept.next_update().await.unwrap();
        assert_eq!(update, vec![StorableObject::new("Bike")]);
    }

    #[tokio::test]
    async fn test_create_user_and_order_write_separate_paths() {
        let (backend, store) = memory_store();
        let fields = HashMap::from([("email".to_string(), "a@b.c".to_string())]);

        store.create_user("u1", &fields).await.unwrap();
        store.create_order("o1", &fields).await.unwrap();

        assert!(backend.snapshot(USERS_PATH).get("u1").is_some());
        assert!(backend.snapshot(ORDERS_PATH).get("o1").is_some());
        assert!(backend.snapshot(USERS_PATH).get("o1").is_none());
    }
}
