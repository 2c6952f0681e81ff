//! Parts procurement API handlers.

use actix_web::{web, HttpResponse};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{DocumentReferences, PartsRequest, SubmitPartsBody, SupplyDocument};
use crate::services::PartsService;

/// Request parts for a ticket.
///
/// Technician-only. Blank item rows are dropped server-side; a submission
/// that filters down to an empty list is still accepted.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/parts",
    tag = "Parts",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    request_body = SubmitPartsBody,
    responses(
        (status = 201, description = "Parts request recorded", body = PartsRequest),
        (status = 403, description = "Not a technician", body = crate::error::ErrorResponse),
        (status = 404, description = "No such ticket", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn submit_parts_request(
    user: AuthUser,
    service: web::Data<PartsService>,
    path: web::Path<String>,
    body: web::Json<SubmitPartsBody>,
) -> AppResult<HttpResponse> {
    let parts = service
        .submit(&user.actor(), &path, body.into_inner())
        .await?;
    info!(parts_id = %parts.id, request_id = %parts.request_id, by = %user.email, "parts requested");
    Ok(HttpResponse::Created().json(parts))
}

/// List parts requests: all of them for admins, own for technicians.
#[utoipa::path(
    get,
    path = "/api/v1/parts-requests",
    tag = "Parts",
    responses(
        (status = 200, description = "Parts requests", body = [PartsRequest]),
        (status = 403, description = "Role may not list parts requests", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn list_parts_requests(
    user: AuthUser,
    service: web::Data<PartsService>,
) -> AppResult<HttpResponse> {
    let parts = service.list_for(&user.actor()).await?;
    Ok(HttpResponse::Ok().json(parts))
}

/// Approve a pending parts request.
#[utoipa::path(
    post,
    path = "/api/v1/parts-requests/{id}/approve",
    tag = "Parts",
    params(
        ("id" = String, Path, description = "Parts request key")
    ),
    responses(
        (status = 200, description = "Approved", body = PartsRequest),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "No such parts request", body = crate::error::ErrorResponse),
        (status = 409, description = "Already decided", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn approve_parts_request(
    user: AuthUser,
    service: web::Data<PartsService>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let parts = service.approve(&user.actor(), &path).await?;
    info!(parts_id = %parts.id, by = %user.email, "parts request approved");
    Ok(HttpResponse::Ok().json(parts))
}

/// Reject a pending parts request.
#[utoipa::path(
    post,
    path = "/api/v1/parts-requests/{id}/reject",
    tag = "Parts",
    params(
        ("id" = String, Path, description = "Parts request key")
    ),
    responses(
        (status = 200, description = "Rejected", body = PartsRequest),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "No such parts request", body = crate::error::ErrorResponse),
        (status = 409, description = "Already decided", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn reject_parts_request(
    user: AuthUser,
    service: web::Data<PartsService>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let parts = service.reject(&user.actor(), &path).await?;
    info!(parts_id = %parts.id, by = %user.email, "parts request rejected");
    Ok(HttpResponse::Ok().json(parts))
}

/// Mark a parts request processed.
///
/// An administrative override: applies from any prior state, not just
/// `pending`.
#[utoipa::path(
    post,
    path = "/api/v1/parts-requests/{id}/process",
    tag = "Parts",
    params(
        ("id" = String, Path, description = "Parts request key")
    ),
    responses(
        (status = 200, description = "Marked processed", body = PartsRequest),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "No such parts request", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn process_parts_request(
    user: AuthUser,
    service: web::Data<PartsService>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let parts = service.mark_processed(&user.actor(), &path).await?;
    info!(parts_id = %parts.id, by = %user.email, "parts request processed");
    Ok(HttpResponse::Ok().json(parts))
}

/// Delete a parts request outright.
#[utoipa::path(
    delete,
    path = "/api/v1/parts-requests/{id}",
    tag = "Parts",
    params(
        ("id" = String, Path, description = "Parts request key")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "No such parts request", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn delete_parts_request(
    user: AuthUser,
    service: web::Data<PartsService>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    service.delete(&user.actor(), &path).await?;
    info!(parts_id = %path.as_str(), by = %user.email, "parts request deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Generate a supply-division document snapshot for a parts request.
///
/// The paperwork reference numbers (device, quotation/tender, purchase
/// order, GRN) come from the caller as query parameters.
#[utoipa::path(
    get,
    path = "/api/v1/parts-requests/{id}/supply-document",
    tag = "Parts",
    params(
        ("id" = String, Path, description = "Parts request key"),
        DocumentReferences,
    ),
    responses(
        (status = 200, description = "Document snapshot", body = SupplyDocument),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "No such parts request", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn supply_document(
    user: AuthUser,
    service: web::Data<PartsService>,
    path: web::Path<String>,
    refs: web::Query<DocumentReferences>,
) -> AppResult<HttpResponse> {
    let document = service
        .supply_document(&user.actor(), &path, refs.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(document))
}

/// Configure parts procurement routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/requests/{id}/parts", web::post().to(submit_parts_request))
        .service(
            web::scope("/parts-requests")
                .route("", web::get().to(list_parts_requests))
                .route("/{id}", web::delete().to(delete_parts_request))
                .route("/{id}/approve", web::post().to(approve_parts_request))
                .route("/{id}/reject", web::post().to(reject_parts_request))
                .route("/{id}/process", web::post().to(process_parts_request))
                .route(
                    "/{id}/supply-document",
                    web::get().to(supply_document),
                ),
        );
}
