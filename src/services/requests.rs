//! Repair request workflow.

use chrono::Utc;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::{
    EditRequestBody, Priority, RepairRequest, RequestStatus, SubmitRequestBody, UpdateStatusBody,
};
use crate::store::{FieldFilter, TicketStore};

use super::roles::{Action, Actor};
use super::ticket_id;

#[derive(Clone)]
pub struct RequestService {
    store: TicketStore,
}

impl RequestService {
    pub fn new(store: TicketStore) -> Self {
        Self { store }
    }

    /// Submit a new ticket. Status and priority always start at
    /// Pending/Low; the requester does not choose them.
    pub async fn submit(
        &self,
        actor: &Actor,
        body: SubmitRequestBody,
    ) -> AppResult<RepairRequest> {
        if !actor.can(Action::SubmitRequest) {
            return Err(AppError::Forbidden(
                "only users may submit repair requests".to_string(),
            ));
        }
        if body.device_type.trim().is_empty()
            || body.device_id.trim().is_empty()
            || body.problem_description.trim().is_empty()
        {
            return Err(AppError::InvalidInput(
                "deviceType, deviceId and problemDescription are required".to_string(),
            ));
        }

        let now = Utc::now();
        let mut record = RepairRequest {
            id: String::new(),
            user_id: actor.uid.clone(),
            user_email: actor.email.clone(),
            device_type: body.device_type,
            device_id: body.device_id,
            problem_description: body.problem_description,
            image_url: body.image_url,
            status: RequestStatus::Pending,
            priority: Priority::Low,
            technician: None,
            vendor: None,
            recommendation: None,
            has_recommendation: None,
            recommendation_status: None,
            approved_recommendation: None,
            final_recommendation: None,
            rejection_note: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        let id = ticket_id::allocate(&self.store, &actor.email, &record).await?;
        record.id = id;
        Ok(record)
    }

    /// List the tickets visible to the actor: everything for staff, the
    /// assigned queue for technicians and engineers, own tickets otherwise.
    pub async fn list_for(&self, actor: &Actor) -> AppResult<Vec<RepairRequest>> {
        use crate::models::Role;
        let filter = match actor.role {
            Some(Role::Manager) | Some(Role::Admin) => None,
            Some(Role::Technician) | Some(Role::Engineer) => {
                Some(FieldFilter::new("technician", actor.email.as_str()))
            }
            _ => Some(FieldFilter::new("userId", actor.uid.as_str())),
        };
        self.store.list_requests(filter.as_ref()).await
    }

    /// Fetch one ticket, visible to staff, the owner, and the assignee.
    pub async fn get(&self, actor: &Actor, id: &str) -> AppResult<RepairRequest> {
        let request = self.store.get_request(id).await?;
        if !self.may_view(actor, &request) {
            return Err(AppError::Forbidden(
                "you do not have access to this request".to_string(),
            ));
        }
        Ok(request)
    }

    fn may_view(&self, actor: &Actor, request: &RepairRequest) -> bool {
        actor.is_staff()
            || request.user_id == actor.uid
            || request.technician.as_deref() == Some(actor.email.as_str())
    }

    /// Direct status transition. Technicians may only move tickets assigned
    /// to them; the move must follow the workflow graph.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: &str,
        body: UpdateStatusBody,
    ) -> AppResult<RepairRequest> {
        if !actor.can(Action::TransitionStatus) {
            return Err(AppError::Forbidden(
                "your role may not change request status".to_string(),
            ));
        }

        let request = self.store.get_request(id).await?;
        let assigned = request.technician.as_deref() == Some(actor.email.as_str());
        if !actor.is_staff() && !assigned {
            return Err(AppError::Forbidden(format!(
                "request {} is not assigned to you",
                id
            )));
        }
        if !request.status.can_transition_to(body.status) {
            return Err(AppError::InvalidTransition(format!(
                "{} -> {} is not a valid move for request {}",
                request.status, body.status, id
            )));
        }

        let now = Utc::now();
        let mut partial = json!({
            "status": body.status,
            "updatedAt": now,
        });
        if body.status == RequestStatus::Completed {
            partial["completedAt"] = json!(now);
        }
        self.store.patch_request(id, partial).await?;
        self.store.get_request(id).await
    }

    /// Admin edit: device fields, priority, assignment, vendor, and an
    /// unguarded status override. Only supplied fields are patched.
    pub async fn edit(
        &self,
        actor: &Actor,
        id: &str,
        body: EditRequestBody,
    ) -> AppResult<RepairRequest> {
        if !actor.can(Action::EditRequest) {
            return Err(AppError::Forbidden(
                "only admins may edit requests".to_string(),
            ));
        }
        // Existence check up front so the error names the request.
        self.store.get_request(id).await?;

        let now = Utc::now();
        let mut fields = serde_json::Map::new();
        if let Some(device_type) = body.device_type {
            fields.insert("deviceType".to_string(), json!(device_type));
        }
        if let Some(problem_description) = body.problem_description {
            fields.insert("problemDescription".to_string(), json!(problem_description));
        }
        if let Some(status) = body.status {
            fields.insert("status".to_string(), json!(status));
            if status == RequestStatus::Completed {
                fields.insert("completedAt".to_string(), json!(now));
            }
        }
        if let Some(priority) = body.priority {
            fields.insert("priority".to_string(), json!(priority));
        }
        if let Some(technician) = body.technician {
            // Empty string unassigns.
            if technician.trim().is_empty() {
                fields.insert("technician".to_string(), serde_json::Value::Null);
            } else {
                fields.insert("technician".to_string(), json!(technician));
            }
        }
        if let Some(vendor) = body.vendor {
            fields.insert("vendor".to_string(), json!(vendor));
        }
        if fields.is_empty() {
            return Err(AppError::InvalidInput(
                "no editable fields supplied".to_string(),
            ));
        }
        fields.insert("updatedAt".to_string(), json!(now));

        self.store
            .patch_request(id, serde_json::Value::Object(fields))
            .await?;
        self.store.get_request(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn service() -> RequestService {
        RequestService::new(TicketStore::new(Arc::new(MemoryStore::default())))
    }

    fn actor(uid: &str, email: &str, role: Option<Role>) -> Actor {
        Actor {
            uid: uid.to_string(),
            email: email.to_string(),
            role,
        }
    }

    fn submit_body() -> SubmitRequestBody {
        SubmitRequestBody {
            device_type: "Laptop".to_string(),
            device_id: "D-1".to_string(),
            problem_description: "won't boot".to_string(),
            image_url: None,
        }
    }

    async fn submitted(service: &RequestService) -> RepairRequest {
        let user = actor("u1", "jo@example.com", Some(Role::User));
        service.submit(&user, submit_body()).await.unwrap()
    }

    #[tokio::test]
    async fn test_submit_defaults() {
        let service = service();
        let request = submitted(&service).await;
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.priority, Priority::Low);
        assert!(request.id.starts_with("REQ-jo-"));
    }

    #[tokio::test]
    async fn test_submit_requires_user_role() {
        let service = service();
        let tech = actor("t1", "tech@example.com", Some(Role::Technician));
        let err = service.submit(&tech, submit_body()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_no_shortcut_from_pending_to_completed() {
        let service = service();
        let request = submitted(&service).await;
        let admin = actor("a1", "admin@example.com", Some(Role::Admin));
        let err = service
            .update_status(
                &admin,
                &request.id,
                UpdateStatusBody {
                    status: RequestStatus::Completed,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_technician_needs_assignment() {
        let service = service();
        let request = submitted(&service).await;
        let tech = actor("t1", "tech@example.com", Some(Role::Technician));

        let err = service
            .update_status(
                &tech,
                &request.id,
                UpdateStatusBody {
                    status: RequestStatus::InProgress,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Assign, then the same transition succeeds.
        let admin = actor("a1", "admin@example.com", Some(Role::Admin));
        service
            .edit(
                &admin,
                &request.id,
                EditRequestBody {
                    technician: Some("tech@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = service
            .update_status(
                &tech,
                &request.id,
                UpdateStatusBody {
                    status: RequestStatus::InProgress,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::InProgress);
    }

    #[tokio::test]
    async fn test_completion_stamps_completed_at() {
        let service = service();
        let request = submitted(&service).await;
        let admin = actor("a1", "admin@example.com", Some(Role::Admin));

        service
            .update_status(
                &admin,
                &request.id,
                UpdateStatusBody {
                    status: RequestStatus::InProgress,
                },
            )
            .await
            .unwrap();
        let done = service
            .update_status(
                &admin,
                &request.id,
                UpdateStatusBody {
                    status: RequestStatus::Completed,
                },
            )
            .await
            .unwrap();
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_listing_scoped_by_role() {
        let service = service();
        let request = submitted(&service).await;

        let owner = actor("u1", "jo@example.com", Some(Role::User));
        assert_eq!(service.list_for(&owner).await.unwrap().len(), 1);

        let stranger = actor("u2", "other@example.com", Some(Role::User));
        assert!(service.list_for(&stranger).await.unwrap().is_empty());

        let tech = actor("t1", "tech@example.com", Some(Role::Technician));
        assert!(service.list_for(&tech).await.unwrap().is_empty());

        let admin = actor("a1", "admin@example.com", Some(Role::Admin));
        service
            .edit(
                &admin,
                &request.id,
                EditRequestBody {
                    technician: Some("tech@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(service.list_for(&tech).await.unwrap().len(), 1);
        assert_eq!(service.list_for(&admin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_enforces_visibility() {
        let service = service();
        let request = submitted(&service).await;

        let stranger = actor("u2", "other@example.com", Some(Role::User));
        let err = service.get(&stranger, &request.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let owner = actor("u1", "jo@example.com", Some(Role::User));
        assert!(service.get(&owner, &request.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_edit_rejects_empty_body() {
        let service = service();
        let request = submitted(&service).await;
        let admin = actor("a1", "admin@example.com", Some(Role::Admin));
        let err = service
            .edit(&admin, &request.id, EditRequestBody::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
