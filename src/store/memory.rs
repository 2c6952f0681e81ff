//! In-process store backend.
//!
//! Collections are flat maps of key -> JSON snapshot behind one async
//! read-write lock; every mutation publishes a [`StoreEvent`] on the owning
//! collection's broadcast channel while the write lock is still held, which
//! gives subscribers per-collection commit order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::{ChangeKind, FieldFilter, Store, StoreError, StoreEvent};

/// In-memory realtime store.
pub struct MemoryStore {
    data: RwLock<HashMap<String, BTreeMap<String, JsonValue>>>,
    // std Mutex: subscribe() is synchronous and the critical section is tiny.
    senders: Mutex<HashMap<String, broadcast::Sender<StoreEvent>>>,
    event_capacity: usize,
}

impl MemoryStore {
    pub fn new(event_capacity: usize) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            senders: Mutex::new(HashMap::new()),
            event_capacity,
        }
    }

    fn sender_for(&self, collection: &str) -> broadcast::Sender<StoreEvent> {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(self.event_capacity).0)
            .clone()
    }

    fn publish(&self, collection: &str, event: StoreEvent) {
        // A send error only means no subscriber is listening right now.
        let _ = self.sender_for(collection).send(event);
    }

    fn split_path(path: &str) -> Result<(&str, &str), StoreError> {
        match path.split_once('/') {
            Some((collection, key)) if !collection.is_empty() && !key.is_empty() => {
                Ok((collection, key))
            }
            _ => Err(StoreError::Backend(format!(
                "malformed store path: {}",
                path
            ))),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(crate::config::defaults::DEV_EVENT_CAPACITY)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<JsonValue>, StoreError> {
        let (collection, key) = Self::split_path(path)?;
        let data = self.data.read().await;
        Ok(data
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned())
    }

    async fn list(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<(String, JsonValue)>, StoreError> {
        let data = self.data.read().await;
        let Some(records) = data.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(records
            .iter()
            .filter(|(_, value)| filter.map(|f| f.matches(value)).unwrap_or(true))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn create_at(&self, path: &str, value: JsonValue) -> Result<(), StoreError> {
        let (collection, key) = Self::split_path(path)?;
        let mut data = self.data.write().await;
        let records = data.entry(collection.to_string()).or_default();
        if records.contains_key(key) {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        records.insert(key.to_string(), value.clone());
        self.publish(
            collection,
            StoreEvent {
                path: path.to_string(),
                kind: ChangeKind::Created,
                snapshot: Some(value),
            },
        );
        Ok(())
    }

    async fn create(&self, collection: &str, value: JsonValue) -> Result<String, StoreError> {
        // v7 keys sort by creation time, like the push keys they replace.
        let key = Uuid::now_v7().to_string();
        let path = super::join(collection, &key);
        self.create_at(&path, value).await?;
        Ok(key)
    }

    async fn patch(&self, path: &str, partial: JsonValue) -> Result<(), StoreError> {
        let (collection, key) = Self::split_path(path)?;
        let JsonValue::Object(fields) = partial else {
            return Err(StoreError::Serialization(
                "patch body must be a JSON object".to_string(),
            ));
        };

        let mut data = self.data.write().await;
        let record = data
            .get_mut(collection)
            .and_then(|records| records.get_mut(key))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        let JsonValue::Object(target) = record else {
            return Err(StoreError::Serialization(format!(
                "record at {} is not an object",
                path
            )));
        };
        for (field, value) in fields {
            // Shallow merge; null clears the field.
            if value.is_null() {
                target.remove(&field);
            } else {
                target.insert(field, value);
            }
        }

        let snapshot = record.clone();
        self.publish(
            collection,
            StoreEvent {
                path: path.to_string(),
                kind: ChangeKind::Patched,
                snapshot: Some(snapshot),
            },
        );
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let (collection, key) = Self::split_path(path)?;
        let mut data = self.data.write().await;
        let removed = data
            .get_mut(collection)
            .and_then(|records| records.remove(key));
        if removed.is_none() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        self.publish(
            collection,
            StoreEvent {
                path: path.to_string(),
                kind: ChangeKind::Deleted,
                snapshot: None,
            },
        );
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> broadcast::Receiver<StoreEvent> {
        self.sender_for(collection).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_get_delete() {
        let store = MemoryStore::default();
        store
            .create_at("requests/REQ-1", json!({"status": "Pending"}))
            .await
            .unwrap();

        let snapshot = store.get("requests/REQ-1").await.unwrap();
        assert_eq!(snapshot, Some(json!({"status": "Pending"})));

        store.delete("requests/REQ-1").await.unwrap();
        assert_eq!(store.get("requests/REQ-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_at_occupied_path() {
        let store = MemoryStore::default();
        store.create_at("requests/REQ-1", json!({})).await.unwrap();
        let err = store
            .create_at("requests/REQ-1", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_patch_is_shallow_merge() {
        let store = MemoryStore::default();
        store
            .create_at(
                "requests/REQ-1",
                json!({"status": "Pending", "priority": "Low"}),
            )
            .await
            .unwrap();

        store
            .patch("requests/REQ-1", json!({"status": "In Progress"}))
            .await
            .unwrap();

        let snapshot = store.get("requests/REQ-1").await.unwrap().unwrap();
        assert_eq!(snapshot["status"], "In Progress");
        assert_eq!(snapshot["priority"], "Low");
    }

    #[tokio::test]
    async fn test_patch_null_clears_field() {
        let store = MemoryStore::default();
        store
            .create_at("requests/REQ-1", json!({"technician": "t@x"}))
            .await
            .unwrap();
        store
            .patch("requests/REQ-1", json!({"technician": null}))
            .await
            .unwrap();
        let snapshot = store.get("requests/REQ-1").await.unwrap().unwrap();
        assert!(snapshot.get("technician").is_none());
    }

    #[tokio::test]
    async fn test_patch_absent_path() {
        let store = MemoryStore::default();
        let err = store
            .patch("requests/REQ-missing", json!({"status": "Cancelled"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let store = MemoryStore::default();
        store
            .create_at("users/u1", json!({"role": "technician"}))
            .await
            .unwrap();
        store
            .create_at("users/u2", json!({"role": "admin"}))
            .await
            .unwrap();

        let filter = FieldFilter::new("role", "technician");
        let matched = store.list("users", Some(&filter)).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].0, "u1");

        let all = store.list("users", None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_subscriber_sees_commit_order() {
        let store = MemoryStore::default();
        let mut events = store.subscribe("requests");

        store.create_at("requests/REQ-1", json!({})).await.unwrap();
        store
            .patch("requests/REQ-1", json!({"status": "Cancelled"}))
            .await
            .unwrap();
        store.delete("requests/REQ-1").await.unwrap();

        assert_eq!(events.recv().await.unwrap().kind, ChangeKind::Created);
        assert_eq!(events.recv().await.unwrap().kind, ChangeKind::Patched);
        let deleted = events.recv().await.unwrap();
        assert_eq!(deleted.kind, ChangeKind::Deleted);
        assert!(deleted.snapshot.is_none());
    }

    #[tokio::test]
    async fn test_auto_keys_are_unique() {
        let store = MemoryStore::default();
        let a = store.create("recommendations", json!({})).await.unwrap();
        let b = store.create("recommendations", json!({})).await.unwrap();
        assert_ne!(a, b);
    }
}
