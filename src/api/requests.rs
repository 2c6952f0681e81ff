//! Repair request API handlers.

use actix_web::{web, HttpResponse};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{EditRequestBody, RepairRequest, SubmitRequestBody, UpdateStatusBody};
use crate::services::RequestService;

/// Submit a new repair request.
///
/// The ticket starts at status `Pending` with priority `Low` and a freshly
/// allocated human-readable ID.
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    tag = "Requests",
    request_body = SubmitRequestBody,
    responses(
        (status = 201, description = "Ticket created", body = RepairRequest),
        (status = 400, description = "Missing required fields", body = crate::error::ErrorResponse),
        (status = 403, description = "Role may not submit requests", body = crate::error::ErrorResponse),
        (status = 503, description = "ID allocation exhausted", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn submit_request(
    user: AuthUser,
    service: web::Data<RequestService>,
    body: web::Json<SubmitRequestBody>,
) -> AppResult<HttpResponse> {
    let request = service.submit(&user.actor(), body.into_inner()).await?;
    info!(request_id = %request.id, user = %user.email, "repair request submitted");
    Ok(HttpResponse::Created().json(request))
}

/// List the tickets visible to the caller.
///
/// Staff see everything, technicians and engineers see their assigned queue,
/// users see their own tickets. Newest first.
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    tag = "Requests",
    responses(
        (status = 200, description = "Visible tickets", body = [RepairRequest]),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn list_requests(
    user: AuthUser,
    service: web::Data<RequestService>,
) -> AppResult<HttpResponse> {
    let requests = service.list_for(&user.actor()).await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// Fetch one ticket.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    tag = "Requests",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "The ticket", body = RepairRequest),
        (status = 403, description = "No access to this ticket", body = crate::error::ErrorResponse),
        (status = 404, description = "No such ticket", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn get_request(
    user: AuthUser,
    service: web::Data<RequestService>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let request = service.get(&user.actor(), &path).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Move a ticket along the workflow.
///
/// Technicians may only move tickets assigned to them; the move must follow
/// the workflow graph, so e.g. `Pending` cannot jump straight to `Completed`.
#[utoipa::path(
    patch,
    path = "/api/v1/requests/{id}/status",
    tag = "Requests",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    request_body = UpdateStatusBody,
    responses(
        (status = 200, description = "Updated ticket", body = RepairRequest),
        (status = 403, description = "Not permitted", body = crate::error::ErrorResponse),
        (status = 404, description = "No such ticket", body = crate::error::ErrorResponse),
        (status = 409, description = "Transition not allowed by the workflow", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn update_status(
    user: AuthUser,
    service: web::Data<RequestService>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusBody>,
) -> AppResult<HttpResponse> {
    let request = service
        .update_status(&user.actor(), &path, body.into_inner())
        .await?;
    info!(request_id = %request.id, status = %request.status, by = %user.email, "status updated");
    Ok(HttpResponse::Ok().json(request))
}

/// Admin edit of ticket fields, including assignment and an unguarded
/// status override.
#[utoipa::path(
    patch,
    path = "/api/v1/requests/{id}",
    tag = "Requests",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    request_body = EditRequestBody,
    responses(
        (status = 200, description = "Updated ticket", body = RepairRequest),
        (status = 400, description = "No editable fields supplied", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "No such ticket", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn edit_request(
    user: AuthUser,
    service: web::Data<RequestService>,
    path: web::Path<String>,
    body: web::Json<EditRequestBody>,
) -> AppResult<HttpResponse> {
    let request = service.edit(&user.actor(), &path, body.into_inner()).await?;
    info!(request_id = %request.id, by = %user.email, "request edited");
    Ok(HttpResponse::Ok().json(request))
}

/// Configure repair request routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/requests")
            .route("", web::post().to(submit_request))
            .route("", web::get().to(list_requests))
            .route("/{id}", web::get().to(get_request))
            .route("/{id}", web::patch().to(edit_request))
            .route("/{id}/status", web::patch().to(update_status)),
    );
}
