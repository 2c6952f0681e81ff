//! User administration handlers.

use actix_web::{web, HttpResponse};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{AssignRoleRequest, ListUsersQuery, UserProfile};
use crate::services::Action;
use crate::store::TicketStore;

/// List user profiles, optionally filtered by role.
///
/// The role filter backs the technician-assignment dropdown.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(
        ("role" = Option<String>, Query, description = "Only profiles with this role")
    ),
    responses(
        (status = 200, description = "User profiles", body = [UserProfile]),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn list_users(
    user: AuthUser,
    store: web::Data<TicketStore>,
    query: web::Query<ListUsersQuery>,
) -> AppResult<HttpResponse> {
    if !user.actor().can(Action::ManageUsers) {
        return Err(AppError::Forbidden(
            "only admins may list users".to_string(),
        ));
    }
    let users = store.list_users(query.role).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Assign a role to a user profile.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{uid}/role",
    tag = "Users",
    params(
        ("uid" = String, Path, description = "User profile key")
    ),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "No such profile", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn assign_role(
    user: AuthUser,
    store: web::Data<TicketStore>,
    path: web::Path<String>,
    body: web::Json<AssignRoleRequest>,
) -> AppResult<HttpResponse> {
    if !user.actor().can(Action::ManageUsers) {
        return Err(AppError::Forbidden(
            "only admins may assign roles".to_string(),
        ));
    }
    let uid = path.into_inner();
    store.set_user_role(&uid, body.role).await?;
    let record = store
        .get_user(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", uid)))?;

    info!(uid = %uid, role = %body.role, assigned_by = %user.email, "role assigned");
    Ok(HttpResponse::Ok().json(UserProfile {
        uid,
        email: record.email,
        role: record.role,
        created_at: record.created_at,
    }))
}

/// Configure user administration routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("/{uid}/role", web::patch().to(assign_role)),
    );
}
