//! Typed façade over the raw store.
//!
//! Reads decode snapshots into the domain records, which is where closed-enum
//! validation happens: a snapshot carrying an unknown status or role fails to
//! decode and surfaces as a store error instead of leaking into handlers.
//! Writes go through serde so only schema fields ever land in the tree.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;

use crate::error::{AppError, AppResult};
use crate::models::{
    PartsRequest, Recommendation, RepairRequest, Role, UserProfile, UserRecord,
};

use super::{paths, FieldFilter, Store, StoreEvent};

/// Typed access to the ticket tree, shared across handlers.
#[derive(Clone)]
pub struct TicketStore {
    inner: Arc<dyn Store>,
}

impl TicketStore {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self { inner }
    }

    /// Subscribe to raw change events for a collection (websocket relay).
    pub fn subscribe(&self, collection: &str) -> broadcast::Receiver<StoreEvent> {
        self.inner.subscribe(collection)
    }

    // -- users --------------------------------------------------------------

    pub async fn get_user(&self, uid: &str) -> AppResult<Option<UserRecord>> {
        let path = super::join(paths::USERS, uid);
        match self.inner.get(&path).await? {
            Some(snapshot) => Ok(Some(decode(&path, snapshot)?)),
            None => Ok(None),
        }
    }

    pub async fn put_user(&self, uid: &str, record: &UserRecord) -> AppResult<()> {
        let path = super::join(paths::USERS, uid);
        self.inner.create_at(&path, encode(record)?).await?;
        Ok(())
    }

    pub async fn list_users(&self, role: Option<Role>) -> AppResult<Vec<UserProfile>> {
        let filter = role.map(|r| FieldFilter::new("role", r.as_str()));
        let rows = self.inner.list(paths::USERS, filter.as_ref()).await?;
        let mut users = Vec::with_capacity(rows.len());
        for (uid, snapshot) in rows {
            let path = super::join(paths::USERS, &uid);
            let record: UserRecord = decode(&path, snapshot)?;
            users.push(UserProfile {
                uid,
                email: record.email,
                role: record.role,
                created_at: record.created_at,
            });
        }
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    pub async fn set_user_role(&self, uid: &str, role: Role) -> AppResult<()> {
        let path = super::join(paths::USERS, uid);
        self.inner
            .patch(&path, serde_json::json!({ "role": role.as_str() }))
            .await?;
        Ok(())
    }

    // -- repair requests ----------------------------------------------------

    /// Create a request at a caller-chosen ID. Fails with `AlreadyExists`
    /// when the ID is taken; the allocator relies on that.
    pub async fn insert_request(&self, id: &str, record: &RepairRequest) -> AppResult<()> {
        let path = super::join(paths::REQUESTS, id);
        self.inner.create_at(&path, encode(record)?).await?;
        Ok(())
    }

    pub async fn get_request(&self, id: &str) -> AppResult<RepairRequest> {
        let path = super::join(paths::REQUESTS, id);
        let snapshot = self
            .inner
            .get(&path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {}", id)))?;
        decode_keyed(&path, id, snapshot)
    }

    /// List requests, newest first, optionally filtered by one field.
    pub async fn list_requests(
        &self,
        filter: Option<&FieldFilter>,
    ) -> AppResult<Vec<RepairRequest>> {
        let rows = self.inner.list(paths::REQUESTS, filter).await?;
        let mut requests = Vec::with_capacity(rows.len());
        for (id, snapshot) in rows {
            let path = super::join(paths::REQUESTS, &id);
            requests.push(decode_keyed::<RepairRequest>(&path, &id, snapshot)?);
        }
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    pub async fn patch_request(&self, id: &str, partial: JsonValue) -> AppResult<()> {
        let path = super::join(paths::REQUESTS, id);
        self.inner.patch(&path, partial).await.map_err(|err| {
            // Patch on an absent request reads better as "Request X not found".
            match err {
                super::StoreError::NotFound(_) => AppError::NotFound(format!("Request {}", id)),
                other => other.into(),
            }
        })
    }

    // -- recommendations ----------------------------------------------------

    pub async fn create_recommendation(&self, record: &Recommendation) -> AppResult<String> {
        Ok(self
            .inner
            .create(paths::RECOMMENDATIONS, encode(record)?)
            .await?)
    }

    pub async fn get_recommendation(&self, id: &str) -> AppResult<Recommendation> {
        let path = super::join(paths::RECOMMENDATIONS, id);
        let snapshot = self
            .inner
            .get(&path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recommendation {}", id)))?;
        decode_keyed(&path, id, snapshot)
    }

    /// List recommendations, newest submission first.
    pub async fn list_recommendations(
        &self,
        filter: Option<&FieldFilter>,
    ) -> AppResult<Vec<Recommendation>> {
        let rows = self.inner.list(paths::RECOMMENDATIONS, filter).await?;
        let mut recommendations = Vec::with_capacity(rows.len());
        for (id, snapshot) in rows {
            let path = super::join(paths::RECOMMENDATIONS, &id);
            recommendations.push(decode_keyed::<Recommendation>(&path, &id, snapshot)?);
        }
        recommendations.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(recommendations)
    }

    pub async fn patch_recommendation(&self, id: &str, partial: JsonValue) -> AppResult<()> {
        let path = super::join(paths::RECOMMENDATIONS, id);
        self.inner.patch(&path, partial).await.map_err(|err| match err {
            super::StoreError::NotFound(_) => {
                AppError::NotFound(format!("Recommendation {}", id))
            }
            other => other.into(),
        })
    }

    // -- parts requests -----------------------------------------------------

    pub async fn create_parts_request(&self, record: &PartsRequest) -> AppResult<String> {
        Ok(self
            .inner
            .create(paths::PARTS_REQUESTS, encode(record)?)
            .await?)
    }

    pub async fn get_parts_request(&self, id: &str) -> AppResult<PartsRequest> {
        let path = super::join(paths::PARTS_REQUESTS, id);
        let snapshot = self
            .inner
            .get(&path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Parts request {}", id)))?;
        decode_keyed(&path, id, snapshot)
    }

    /// List parts requests, newest first.
    pub async fn list_parts_requests(
        &self,
        filter: Option<&FieldFilter>,
    ) -> AppResult<Vec<PartsRequest>> {
        let rows = self.inner.list(paths::PARTS_REQUESTS, filter).await?;
        let mut parts = Vec::with_capacity(rows.len());
        for (id, snapshot) in rows {
            let path = super::join(paths::PARTS_REQUESTS, &id);
            parts.push(decode_keyed::<PartsRequest>(&path, &id, snapshot)?);
        }
        parts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(parts)
    }

    pub async fn patch_parts_request(&self, id: &str, partial: JsonValue) -> AppResult<()> {
        let path = super::join(paths::PARTS_REQUESTS, id);
        self.inner.patch(&path, partial).await.map_err(|err| match err {
            super::StoreError::NotFound(_) => {
                AppError::NotFound(format!("Parts request {}", id))
            }
            other => other.into(),
        })
    }

    pub async fn delete_parts_request(&self, id: &str) -> AppResult<()> {
        let path = super::join(paths::PARTS_REQUESTS, id);
        self.inner.delete(&path).await.map_err(|err| match err {
            super::StoreError::NotFound(_) => {
                AppError::NotFound(format!("Parts request {}", id))
            }
            other => other.into(),
        })
    }
}

fn encode<T: Serialize>(record: &T) -> AppResult<JsonValue> {
    serde_json::to_value(record).map_err(|err| AppError::Store(format!("encode failure: {}", err)))
}

fn decode<T: DeserializeOwned>(path: &str, snapshot: JsonValue) -> AppResult<T> {
    serde_json::from_value(snapshot)
        .map_err(|err| AppError::Store(format!("corrupt record at {}: {}", path, err)))
}

/// Decode a snapshot whose record type carries its store key in an `id` field.
fn decode_keyed<T: DeserializeOwned>(path: &str, key: &str, snapshot: JsonValue) -> AppResult<T> {
    let mut snapshot = snapshot;
    if let Some(fields) = snapshot.as_object_mut() {
        fields.insert("id".to_string(), JsonValue::String(key.to_string()));
    }
    decode(path, snapshot)
}
