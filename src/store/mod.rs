//! Ticket store adapter.
//!
//! Everything persisted lives in a hierarchical realtime key-value tree
//! addressed by slash-delimited paths (`requests/{id}`, `users/{uid}`, ...).
//! The [`Store`] trait is the adapter contract; [`MemoryStore`] is the
//! in-process backend; [`TicketStore`] is the typed façade the workflow
//! services use.

pub mod memory;
pub mod tickets;

pub use memory::MemoryStore;
pub use tickets::TicketStore;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;

/// Top-level collection names (the logical store schema).
pub mod paths {
    pub const USERS: &str = "users";
    pub const REQUESTS: &str = "requests";
    pub const RECOMMENDATIONS: &str = "recommendations";
    pub const PARTS_REQUESTS: &str = "partsRequests";
}

/// Store-level errors. The façade converts these into application errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record already occupies the path (keyed create only).
    #[error("path already occupied: {0}")]
    AlreadyExists(String),

    /// Patch or delete addressed an absent path.
    #[error("no record at path: {0}")]
    NotFound(String),

    /// Record failed to (de)serialize against the typed schema.
    #[error("serialization failure: {0}")]
    Serialization(String),

    /// Backend/network failure.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Equality filter on a single field, the only indexed query shape the
/// store supports (used for "requests by userId", "users by role").
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub equals: JsonValue,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, equals: impl Into<JsonValue>) -> Self {
        Self {
            field: field.into(),
            equals: equals.into(),
        }
    }

    /// Whether a record snapshot matches the filter.
    pub fn matches(&self, value: &JsonValue) -> bool {
        value.get(&self.field) == Some(&self.equals)
    }
}

/// Kind of change carried by a [`StoreEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Patched,
    Deleted,
}

/// Change event delivered to collection subscribers, in per-collection
/// commit order. There is no ordering guarantee across collections.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreEvent {
    /// Full path of the changed record, e.g. `requests/REQ-jo-20260830-123456`.
    pub path: String,
    pub kind: ChangeKind,
    /// Post-change snapshot; None for deletions.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub snapshot: Option<JsonValue>,
}

/// Generic hierarchical realtime store.
///
/// All operations are asynchronous and fallible; callers surface failures to
/// the initiating actor rather than retrying silently. The one sanctioned
/// retry loop is the request-ID allocator, which drives `create_at` until an
/// unused key is found.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch the snapshot at a path, or None when absent.
    async fn get(&self, path: &str) -> Result<Option<JsonValue>, StoreError>;

    /// List `(key, snapshot)` pairs of a collection, optionally filtered by
    /// equality on one field.
    async fn list(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<(String, JsonValue)>, StoreError>;

    /// Create a record at an exact path; fails with `AlreadyExists` when the
    /// path is occupied. This is the allocator's existence check.
    async fn create_at(&self, path: &str, value: JsonValue) -> Result<(), StoreError>;

    /// Create a record under a collection with a generated key; returns the key.
    async fn create(&self, collection: &str, value: JsonValue) -> Result<String, StoreError>;

    /// Shallow-merge fields into the record at a path. Last writer wins; no
    /// concurrency token. Patching an absent path is `NotFound`.
    async fn patch(&self, path: &str, partial: JsonValue) -> Result<(), StoreError>;

    /// Remove the record at a path outright.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Subscribe to change events for one collection. The subscription ends
    /// when the receiver is dropped.
    fn subscribe(&self, collection: &str) -> broadcast::Receiver<StoreEvent>;
}

/// Join a collection and key into a slash path.
pub fn join(collection: &str, key: &str) -> String {
    format!("{}/{}", collection, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_filter_matches() {
        let filter = FieldFilter::new("role", "technician");
        assert!(filter.matches(&json!({"role": "technician", "email": "t@x"})));
        assert!(!filter.matches(&json!({"role": "admin"})));
        assert!(!filter.matches(&json!({"email": "t@x"})));
    }

    #[test]
    fn test_join() {
        assert_eq!(join(paths::REQUESTS, "REQ-1"), "requests/REQ-1");
    }
}
