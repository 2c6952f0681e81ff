//! OpenAPI documentation configuration.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{api, error, models, store};

/// Registers the bearer-token security scheme referenced by the handlers.
struct SessionTokenSecurity;

impl Modify for SessionTokenSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Session token from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "RepairDesk Server",
        version = "0.1.0",
        description = "Role-based repair request tracking: users submit device repair tickets, technicians action them, engineers attach recommendations, managers approve or reject, admins run parts procurement and dashboards"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    modifiers(&SessionTokenSecurity),
    paths(
        // Health
        api::health::health,
        // Auth
        api::auth::sign_up,
        api::auth::login,
        api::auth::logout,
        api::auth::me,
        // Users
        api::users::list_users,
        api::users::assign_role,
        // Requests
        api::requests::submit_request,
        api::requests::list_requests,
        api::requests::get_request,
        api::requests::update_status,
        api::requests::edit_request,
        // Recommendations
        api::recommendations::submit_recommendation,
        api::recommendations::list_recommendations,
        api::recommendations::approve_recommendation,
        api::recommendations::reject_recommendation,
        // Parts
        api::parts::submit_parts_request,
        api::parts::list_parts_requests,
        api::parts::approve_parts_request,
        api::parts::reject_parts_request,
        api::parts::process_parts_request,
        api::parts::delete_parts_request,
        api::parts::supply_document,
        // Dashboard
        api::dashboard::stats,
        api::dashboard::report,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            api::health::HealthResponse,
            // Auth and users
            models::Role,
            models::UserRecord,
            models::UserProfile,
            models::SignUpRequest,
            models::LoginRequest,
            models::SessionResponse,
            models::AssignRoleRequest,
            api::auth::MeResponse,
            // Requests
            models::RequestStatus,
            models::Priority,
            models::RepairRequest,
            models::SubmitRequestBody,
            models::UpdateStatusBody,
            models::EditRequestBody,
            // Recommendations
            models::ApprovalStatus,
            models::Recommendation,
            models::SubmitRecommendationBody,
            models::RejectRecommendationBody,
            // Parts
            models::PartsStatus,
            models::PartItem,
            models::PartsRequest,
            models::SubmitPartsBody,
            models::SupplyDocument,
            // Dashboard
            models::DashboardStats,
            models::ReportSummary,
            // WebSocket payloads
            store::ChangeKind,
            store::StoreEvent,
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Auth", description = "Accounts and sessions"),
        (name = "Users", description = "Profiles and role assignment"),
        (name = "Requests", description = "Repair request workflow"),
        (name = "Recommendations", description = "Engineer recommendations and manager approval"),
        (name = "Parts", description = "Parts procurement"),
        (name = "Dashboard", description = "Aggregates and reports"),
    )
)]
pub struct ApiDoc;
