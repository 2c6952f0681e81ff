//! Engineer recommendation workflow.
//!
//! A recommendation is its own record with its own pending/approved/rejected
//! lifecycle; deciding it side-effects the parent ticket. The two writes are
//! not atomic, but both run server-side behind the already-decided guard, so
//! a double-click on approve gets a conflict instead of a second completion.

use chrono::Utc;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::{
    ApprovalStatus, ListRecommendationsQuery, Recommendation, RejectRecommendationBody,
    RequestStatus, SubmitRecommendationBody,
};
use crate::store::{FieldFilter, TicketStore};

use super::roles::{Action, Actor};

#[derive(Clone)]
pub struct RecommendationService {
    store: TicketStore,
}

impl RecommendationService {
    pub fn new(store: TicketStore) -> Self {
        Self { store }
    }

    /// Submit a recommendation against an assigned ticket. The ticket is
    /// flagged `hasRecommendation` with a pending mirror status; its primary
    /// status does not move until a manager decides.
    pub async fn submit(
        &self,
        actor: &Actor,
        request_id: &str,
        body: SubmitRecommendationBody,
    ) -> AppResult<Recommendation> {
        if !actor.can(Action::SubmitRecommendation) {
            return Err(AppError::Forbidden(
                "only engineers may submit recommendations".to_string(),
            ));
        }
        let text = body.recommendation_text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::InvalidInput(
                "recommendation text cannot be empty".to_string(),
            ));
        }

        let request = self.store.get_request(request_id).await?;
        if request.technician.as_deref() != Some(actor.email.as_str()) {
            return Err(AppError::Forbidden(format!(
                "request {} is not assigned to you",
                request_id
            )));
        }

        let now = Utc::now();
        let mut record = Recommendation {
            id: String::new(),
            request_id: request_id.to_string(),
            engineer_id: actor.uid.clone(),
            engineer_email: actor.email.clone(),
            engineer_name: actor.email.clone(),
            recommendation_text: text,
            device_type: request.device_type.clone(),
            issue_description: request.problem_description.clone(),
            approval_status: ApprovalStatus::Pending,
            submitted_at: now,
            approved_at: None,
            rejected_at: None,
            approved_by: None,
            rejected_by: None,
        };
        let id = self.store.create_recommendation(&record).await?;
        record.id = id;

        self.store
            .patch_request(
                request_id,
                json!({
                    "hasRecommendation": true,
                    "recommendationStatus": ApprovalStatus::Pending,
                    "updatedAt": now,
                }),
            )
            .await?;
        Ok(record)
    }

    /// List recommendations, optionally narrowed by status and/or ticket.
    /// Pending rows are listed as-is; duplicates for one ticket are legal
    /// and not collapsed.
    pub async fn list(
        &self,
        actor: &Actor,
        query: &ListRecommendationsQuery,
    ) -> AppResult<Vec<Recommendation>> {
        if !actor.can(Action::ListRecommendations) {
            return Err(AppError::Forbidden(
                "your role may not list recommendations".to_string(),
            ));
        }
        let filter = query
            .status
            .map(|status| FieldFilter::new("approvalStatus", status.as_str()));
        let mut recommendations = self.store.list_recommendations(filter.as_ref()).await?;
        if let Some(request_id) = &query.request_id {
            recommendations.retain(|r| &r.request_id == request_id);
        }
        Ok(recommendations)
    }

    /// Approve: the recommendation becomes terminally `approved` and the
    /// ticket is completed with the recommendation text as its final
    /// recommendation.
    pub async fn approve(&self, actor: &Actor, id: &str) -> AppResult<Recommendation> {
        let recommendation = self.load_pending(actor, id).await?;
        let now = Utc::now();

        self.store
            .patch_recommendation(
                id,
                json!({
                    "approvalStatus": ApprovalStatus::Approved,
                    "approvedAt": now,
                    "approvedBy": actor.email,
                }),
            )
            .await?;
        self.store
            .patch_request(
                &recommendation.request_id,
                json!({
                    "status": RequestStatus::Completed,
                    "completedAt": now,
                    "finalRecommendation": recommendation.recommendation_text,
                    "approvedRecommendation": recommendation.recommendation_text,
                    "recommendationStatus": ApprovalStatus::Approved,
                    "updatedAt": now,
                }),
            )
            .await?;
        self.store.get_recommendation(id).await
    }

    /// Reject: the recommendation becomes terminally `rejected` and the
    /// ticket returns to `Pending` carrying the rejection note. The engineer
    /// may submit a fresh recommendation afterwards.
    pub async fn reject(
        &self,
        actor: &Actor,
        id: &str,
        body: RejectRecommendationBody,
    ) -> AppResult<Recommendation> {
        let recommendation = self.load_pending(actor, id).await?;
        let now = Utc::now();

        self.store
            .patch_recommendation(
                id,
                json!({
                    "approvalStatus": ApprovalStatus::Rejected,
                    "rejectedAt": now,
                    "rejectedBy": actor.email,
                }),
            )
            .await?;

        let mut request_patch = json!({
            "status": RequestStatus::Pending,
            "recommendationStatus": ApprovalStatus::Rejected,
            "updatedAt": now,
        });
        if let Some(note) = body.rejection_note {
            request_patch["rejectionNote"] = json!(note);
        }
        self.store
            .patch_request(&recommendation.request_id, request_patch)
            .await?;
        self.store.get_recommendation(id).await
    }

    async fn load_pending(&self, actor: &Actor, id: &str) -> AppResult<Recommendation> {
        if !actor.can(Action::DecideRecommendation) {
            return Err(AppError::Forbidden(
                "only managers may decide recommendations".to_string(),
            ));
        }
        let recommendation = self.store.get_recommendation(id).await?;
        if recommendation.approval_status.is_decided() {
            return Err(AppError::InvalidTransition(format!(
                "recommendation {} is already {}",
                id, recommendation.approval_status
            )));
        }
        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EditRequestBody, Role, SubmitRequestBody, UpdateStatusBody};
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

    struct Fixture {
        recommendations: RecommendationService,
        store: TicketStore,
        request_id: String,
    }

    /// Ticket submitted, assigned to eng@example.com, moved to In Progress.
    async fn fixture() -> Fixture {
        let store = TicketStore::new(Arc::new(MemoryStore::default()));
        let requests = RequestService::new(store.clone());
        let recommendations = RecommendationService::new(store.clone());

        let user = actor("u1", "jo@example.com", Role::User);
        let request = requests
            .submit(
                &user,
                SubmitRequestBody {
                    device_type: "Laptop".to_string(),
                    device_id: "D-1".to_string(),
                    problem_description: "won't boot".to_string(),
                    image_url: None,
                },
            )
            .await
            .unwrap();

        let admin = actor("a1", "admin@example.com", Role::Admin);
        requests
            .edit(
                &admin,
                &request.id,
                EditRequestBody {
                    technician: Some("eng@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        requests
            .update_status(
                &admin,
                &request.id,
                UpdateStatusBody {
                    status: RequestStatus::InProgress,
                },
            )
            .await
            .unwrap();

        Fixture {
            recommendations,
            store,
            request_id: request.id,
        }
    }

    fn engineer() -> Actor {
        actor("e1", "eng@example.com", Role::Engineer)
    }

    fn manager() -> Actor {
        actor("m1", "mgr@example.com", Role::Manager)
    }

    async fn submit_text(fx: &Fixture, text: &str) -> Recommendation {
        fx.recommendations
            .submit(
                &engineer(),
                &fx.request_id,
                SubmitRecommendationBody {
                    recommendation_text: text.to_string(),
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_flags_ticket_without_moving_status() {
        let fx = fixture().await;
        let rec = submit_text(&fx, "replace SSD").await;
        assert_eq!(rec.approval_status, ApprovalStatus::Pending);
        assert_eq!(rec.device_type, "Laptop");

        let request = fx.store.get_request(&fx.request_id).await.unwrap();
        assert_eq!(request.has_recommendation, Some(true));
        assert_eq!(request.recommendation_status, Some(ApprovalStatus::Pending));
        assert_eq!(request.status, RequestStatus::InProgress);
    }

    #[tokio::test]
    async fn test_submit_requires_assignment() {
        let fx = fixture().await;
        let other = actor("e2", "other-eng@example.com", Role::Engineer);
        let err = fx
            .recommendations
            .submit(
                &other,
                &fx.request_id,
                SubmitRecommendationBody {
                    recommendation_text: "replace SSD".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_approval_completes_ticket() {
        let fx = fixture().await;
        let rec = submit_text(&fx, "replace SSD").await;

        let approved = fx.recommendations.approve(&manager(), &rec.id).await.unwrap();
        assert_eq!(approved.approval_status, ApprovalStatus::Approved);
        assert_eq!(approved.approved_by.as_deref(), Some("mgr@example.com"));

        let request = fx.store.get_request(&fx.request_id).await.unwrap();
        assert_eq!(request.status, RequestStatus::Completed);
        assert_eq!(request.final_recommendation.as_deref(), Some("replace SSD"));
        assert!(request.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_rejection_returns_ticket_to_pending() {
        let fx = fixture().await;
        let rec = submit_text(&fx, "replace SSD").await;

        let rejected = fx
            .recommendations
            .reject(
                &manager(),
                &rec.id,
                RejectRecommendationBody {
                    rejection_note: Some("quote a cheaper part".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);

        let request = fx.store.get_request(&fx.request_id).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(
            request.rejection_note.as_deref(),
            Some("quote a cheaper part")
        );
    }

    #[tokio::test]
    async fn test_decided_recommendation_is_immutable() {
        let fx = fixture().await;
        let rec = submit_text(&fx, "replace SSD").await;
        fx.recommendations.approve(&manager(), &rec.id).await.unwrap();

        let err = fx
            .recommendations
            .approve(&manager(), &rec.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        let err = fx
            .recommendations
            .reject(&manager(), &rec.id, RejectRecommendationBody::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_two_pending_recommendations_can_coexist() {
        let fx = fixture().await;
        submit_text(&fx, "replace SSD").await;
        submit_text(&fx, "replace motherboard").await;

        let pending = fx
            .recommendations
            .list(
                &manager(),
                &ListRecommendationsQuery {
                    status: Some(ApprovalStatus::Pending),
                    request_id: Some(fx.request_id.clone()),
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn test_only_managers_decide() {
        let fx = fixture().await;
        let rec = submit_text(&fx, "replace SSD").await;
        let admin = actor("a1", "admin@example.com", Role::Admin);
        let err = fx.recommendations.approve(&admin, &rec.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
