//! Role resolution and the capability table.
//!
//! Every surface asks the same pure question, `can(role, action)`, instead of
//! sprinkling role string comparisons through handlers. Resource-level checks
//! (ticket ownership, technician assignment) stay with the workflow that owns
//! the resource.

use crate::error::AppResult;
use crate::models::Role;
use crate::store::TicketStore;

/// The authenticated principal as seen by the workflow services.
#[derive(Debug, Clone)]
pub struct Actor {
    pub uid: String,
    pub email: String,
    /// None when no profile record exists yet ("no role assigned").
    pub role: Option<Role>,
}

impl Actor {
    pub fn can(&self, action: Action) -> bool {
        self.role.map(|role| can(role, action)).unwrap_or(false)
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Some(Role::Manager) | Some(Role::Admin))
    }
}

/// Actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitRequest,
    ListAllRequests,
    TransitionStatus,
    EditRequest,
    SubmitRecommendation,
    DecideRecommendation,
    ListRecommendations,
    SubmitParts,
    DecideParts,
    ListPartsRequests,
    ManageUsers,
    ViewDashboard,
}

/// The capability table. Role-based only; ownership and assignment are
/// checked where the resource is loaded.
pub fn can(role: Role, action: Action) -> bool {
    use Action::*;
    use Role::*;
    match action {
        SubmitRequest => matches!(role, User),
        ListAllRequests => matches!(role, Manager | Admin),
        TransitionStatus => matches!(role, Technician | Manager | Admin),
        EditRequest => matches!(role, Admin),
        SubmitRecommendation => matches!(role, Engineer),
        DecideRecommendation => matches!(role, Manager),
        ListRecommendations => matches!(role, Manager | Admin),
        SubmitParts => matches!(role, Technician),
        DecideParts => matches!(role, Admin),
        ListPartsRequests => matches!(role, Technician | Admin),
        ManageUsers => matches!(role, Admin),
        ViewDashboard => matches!(role, Manager | Admin),
    }
}

/// Resolve a principal's role from `users/{uid}`. An absent profile is "no
/// role assigned", never an error.
pub async fn resolve(store: &TicketStore, uid: &str) -> AppResult<Option<Role>> {
    Ok(store.get_user(uid).await?.map(|record| record.role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use std::sync::Arc;

    #[test]
    fn test_capability_table() {
        assert!(can(Role::User, Action::SubmitRequest));
        assert!(!can(Role::Technician, Action::SubmitRequest));

        assert!(can(Role::Technician, Action::TransitionStatus));
        assert!(!can(Role::User, Action::TransitionStatus));
        assert!(!can(Role::Engineer, Action::TransitionStatus));

        assert!(can(Role::Engineer, Action::SubmitRecommendation));
        assert!(!can(Role::Manager, Action::SubmitRecommendation));

        assert!(can(Role::Manager, Action::DecideRecommendation));
        assert!(!can(Role::Admin, Action::DecideRecommendation));

        assert!(can(Role::Admin, Action::DecideParts));
        assert!(!can(Role::Manager, Action::DecideParts));

        assert!(can(Role::Admin, Action::ManageUsers));
        assert!(can(Role::Manager, Action::ViewDashboard));
        assert!(!can(Role::Technician, Action::ViewDashboard));
    }

    #[test]
    fn test_actor_without_role_can_do_nothing() {
        let actor = Actor {
            uid: "u1".to_string(),
            email: "u@example.com".to_string(),
            role: None,
        };
        assert!(!actor.can(Action::SubmitRequest));
        assert!(!actor.is_staff());
    }

    #[tokio::test]
    async fn test_resolve_role() {
        let store = TicketStore::new(Arc::new(MemoryStore::default()));
        store
            .put_user(
                "u1",
                &UserRecord {
                    email: "tech@example.com".to_string(),
                    role: Role::Technician,
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            resolve(&store, "u1").await.unwrap(),
            Some(Role::Technician)
        );
        // Absent profile resolves to no role, not an error.
        assert_eq!(resolve(&store, "unknown").await.unwrap(), None);
    }
}
