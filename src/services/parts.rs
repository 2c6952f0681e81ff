//! Parts procurement workflow.

use chrono::Utc;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::{
    DocumentReferences, PartsRequest, PartsStatus, Role, SubmitPartsBody, SupplyDocument,
};
use crate::store::{FieldFilter, TicketStore};

use super::roles::{Action, Actor};

#[derive(Clone)]
pub struct PartsService {
    store: TicketStore,
}

impl PartsService {
    pub fn new(store: TicketStore) -> Self {
        Self { store }
    }

    /// Submit a parts request against a ticket. Blank rows are dropped; a
    /// submission that filters down to nothing is still accepted.
    pub async fn submit(
        &self,
        actor: &Actor,
        request_id: &str,
        body: SubmitPartsBody,
    ) -> AppResult<PartsRequest> {
        if !actor.can(Action::SubmitParts) {
            return Err(AppError::Forbidden(
                "only technicians may request parts".to_string(),
            ));
        }
        // The parent ticket must exist.
        self.store.get_request(request_id).await?;

        let items: Vec<_> = body.items.into_iter().filter(|i| !i.is_blank()).collect();
        let now = Utc::now();
        let mut record = PartsRequest {
            id: String::new(),
            request_id: request_id.to_string(),
            technician_email: actor.email.clone(),
            technician_name: actor.email.clone(),
            items,
            status: PartsStatus::Pending,
            created_at: now,
            updated_at: now,
            processed_at: None,
            processed_by: None,
        };
        let id = self.store.create_parts_request(&record).await?;
        record.id = id;
        Ok(record)
    }

    /// Admins see every parts request; technicians see their own.
    pub async fn list_for(&self, actor: &Actor) -> AppResult<Vec<PartsRequest>> {
        if !actor.can(Action::ListPartsRequests) {
            return Err(AppError::Forbidden(
                "your role may not list parts requests".to_string(),
            ));
        }
        let filter = match actor.role {
            Some(Role::Admin) => None,
            _ => Some(FieldFilter::new("technicianEmail", actor.email.as_str())),
        };
        self.store.list_parts_requests(filter.as_ref()).await
    }

    /// Approve a pending parts request.
    pub async fn approve(&self, actor: &Actor, id: &str) -> AppResult<PartsRequest> {
        self.decide(actor, id, PartsStatus::Approved).await
    }

    /// Reject a pending parts request.
    pub async fn reject(&self, actor: &Actor, id: &str) -> AppResult<PartsRequest> {
        self.decide(actor, id, PartsStatus::Rejected).await
    }

    async fn decide(
        &self,
        actor: &Actor,
        id: &str,
        next: PartsStatus,
    ) -> AppResult<PartsRequest> {
        if !actor.can(Action::DecideParts) {
            return Err(AppError::Forbidden(
                "only admins may decide parts requests".to_string(),
            ));
        }
        let parts = self.store.get_parts_request(id).await?;
        if parts.status != PartsStatus::Pending {
            return Err(AppError::InvalidTransition(format!(
                "parts request {} is already {}",
                id, parts.status
            )));
        }
        self.apply_status(actor, id, next).await
    }

    /// Mark a parts request processed. Deliberately unguarded: processing is
    /// an administrative override that may follow any prior state.
    pub async fn mark_processed(&self, actor: &Actor, id: &str) -> AppResult<PartsRequest> {
        if !actor.can(Action::DecideParts) {
            return Err(AppError::Forbidden(
                "only admins may process parts requests".to_string(),
            ));
        }
        self.store.get_parts_request(id).await?;
        self.apply_status(actor, id, PartsStatus::Processed).await
    }

    async fn apply_status(
        &self,
        actor: &Actor,
        id: &str,
        status: PartsStatus,
    ) -> AppResult<PartsRequest> {
        let now = Utc::now();
        self.store
            .patch_parts_request(
                id,
                json!({
                    "status": status,
                    "updatedAt": now,
                    "processedAt": now,
                    "processedBy": actor.email,
                }),
            )
            .await?;
        self.store.get_parts_request(id).await
    }

    /// Hard delete. The only hard delete in the system; every other removal
    /// is a status change.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<()> {
        if !actor.can(Action::DecideParts) {
            return Err(AppError::Forbidden(
                "only admins may delete parts requests".to_string(),
            ));
        }
        self.store.delete_parts_request(id).await
    }

    /// One-shot supply-division document snapshot. Later changes to the
    /// parts request do not flow into an already generated document.
    pub async fn supply_document(
        &self,
        actor: &Actor,
        id: &str,
        refs: DocumentReferences,
    ) -> AppResult<SupplyDocument> {
        if !actor.can(Action::DecideParts) {
            return Err(AppError::Forbidden(
                "only admins may generate supply documents".to_string(),
            ));
        }
        let parts = self.store.get_parts_request(id).await?;
        Ok(SupplyDocument::from_parts_request(&parts, refs, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PartItem, SubmitRequestBody};
    use crate::services::requests::RequestService;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn actor(uid: &str, email: &str, role: Role) -> Actor {
        Actor {
            uid: uid.to_string(),
            email: email.to_string(),
            role: Some(role),
        }
    }

    fn technician() -> Actor {
        actor("t1", "tech@example.com", Role::Technician)
    }

    fn admin() -> Actor {
        actor("a1", "admin@example.com", Role::Admin)
    }

    fn item(name: &str, amount: &str) -> PartItem {
        PartItem {
            name: name.to_string(),
            amount: amount.to_string(),
            description: None,
        }
    }

    async fn fixture() -> (PartsService, TicketStore, String) {
        let store = TicketStore::new(Arc::new(MemoryStore::default()));
        let requests = RequestService::new(store.clone());
        let user = actor("u1", "jo@example.com", Role::User);
        let request = requests
            .submit(
                &user,
                SubmitRequestBody {
                    device_type: "Printer".to_string(),
                    device_id: "D-9".to_string(),
                    problem_description: "paper jam".to_string(),
                    image_url: None,
                },
            )
            .await
            .unwrap();
        (PartsService::new(store.clone()), store, request.id)
    }

    #[tokio::test]
    async fn test_submit_filters_blank_rows() {
        let (service, _, request_id) = fixture().await;
        let parts = service
            .submit(
                &technician(),
                &request_id,
                SubmitPartsBody {
                    items: vec![item("Roller", "350.00"), item("", ""), item("  ", "10")],
                },
            )
            .await
            .unwrap();
        assert_eq!(parts.items.len(), 1);
        assert_eq!(parts.status, PartsStatus::Pending);
    }

    #[tokio::test]
    async fn test_fully_blank_submission_accepted() {
        let (service, _, request_id) = fixture().await;
        let parts = service
            .submit(
                &technician(),
                &request_id,
                SubmitPartsBody {
                    items: vec![item("", "")],
                },
            )
            .await
            .unwrap();
        assert!(parts.items.is_empty());
    }

    #[tokio::test]
    async fn test_decisions_require_pending() {
        let (service, _, request_id) = fixture().await;
        let parts = service
            .submit(
                &technician(),
                &request_id,
                SubmitPartsBody {
                    items: vec![item("Roller", "350.00")],
                },
            )
            .await
            .unwrap();

        let approved = service.approve(&admin(), &parts.id).await.unwrap();
        assert_eq!(approved.status, PartsStatus::Approved);
        assert_eq!(approved.processed_by.as_deref(), Some("admin@example.com"));

        let err = service.reject(&admin(), &parts.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_processed_is_unguarded() {
        let (service, _, request_id) = fixture().await;
        let parts = service
            .submit(
                &technician(),
                &request_id,
                SubmitPartsBody {
                    items: vec![item("Roller", "350.00")],
                },
            )
            .await
            .unwrap();
        service.reject(&admin(), &parts.id).await.unwrap();

        // Even a rejected request can be marked processed by an admin.
        let processed = service.mark_processed(&admin(), &parts.id).await.unwrap();
        assert_eq!(processed.status, PartsStatus::Processed);
    }

    #[tokio::test]
    async fn test_delete_removes_from_listing() {
        let (service, _, request_id) = fixture().await;
        let parts = service
            .submit(
                &technician(),
                &request_id,
                SubmitPartsBody {
                    items: vec![item("Roller", "350.00")],
                },
            )
            .await
            .unwrap();

        // A document generated before deletion keeps its snapshot.
        let document = service
            .supply_document(&admin(), &parts.id, DocumentReferences::default())
            .await
            .unwrap();

        service.delete(&admin(), &parts.id).await.unwrap();
        assert!(service.list_for(&admin()).await.unwrap().is_empty());
        assert_eq!(document.total, "350.00");

        let err = service
            .supply_document(&admin(), &parts.id, DocumentReferences::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listing_scoped_to_technician() {
        let (service, _, request_id) = fixture().await;
        service
            .submit(
                &technician(),
                &request_id,
                SubmitPartsBody {
                    items: vec![item("Roller", "350.00")],
                },
            )
            .await
            .unwrap();

        let other = actor("t2", "other-tech@example.com", Role::Technician);
        assert!(service.list_for(&other).await.unwrap().is_empty());
        assert_eq!(service.list_for(&technician()).await.unwrap().len(), 1);
        assert_eq!(service.list_for(&admin()).await.unwrap().len(), 1);
    }
}
