//! Recommendation API handlers.

use actix_web::{web, HttpResponse};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{
    ListRecommendationsQuery, Recommendation, RejectRecommendationBody, SubmitRecommendationBody,
};
use crate::services::RecommendationService;

/// Submit a recommendation for a ticket.
///
/// Engineer-only, and the ticket must be assigned to the caller. The ticket
/// is flagged as having a pending recommendation; its status does not move
/// until a manager decides.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/recommendations",
    tag = "Recommendations",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    request_body = SubmitRecommendationBody,
    responses(
        (status = 201, description = "Recommendation recorded", body = Recommendation),
        (status = 400, description = "Empty recommendation text", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the assigned engineer", body = crate::error::ErrorResponse),
        (status = 404, description = "No such ticket", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn submit_recommendation(
    user: AuthUser,
    service: web::Data<RecommendationService>,
    path: web::Path<String>,
    body: web::Json<SubmitRecommendationBody>,
) -> AppResult<HttpResponse> {
    let recommendation = service
        .submit(&user.actor(), &path, body.into_inner())
        .await?;
    info!(
        recommendation_id = %recommendation.id,
        request_id = %recommendation.request_id,
        engineer = %user.email,
        "recommendation submitted"
    );
    Ok(HttpResponse::Created().json(recommendation))
}

/// List recommendations, optionally narrowed by status and ticket.
///
/// The manager review queue is `?status=pending`. Multiple pending rows for
/// one ticket are returned as-is.
#[utoipa::path(
    get,
    path = "/api/v1/recommendations",
    tag = "Recommendations",
    params(
        ("status" = Option<String>, Query, description = "Filter by approval status"),
        ("requestId" = Option<String>, Query, description = "Filter by ticket")
    ),
    responses(
        (status = 200, description = "Recommendations", body = [Recommendation]),
        (status = 403, description = "Role may not list recommendations", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn list_recommendations(
    user: AuthUser,
    service: web::Data<RecommendationService>,
    query: web::Query<ListRecommendationsQuery>,
) -> AppResult<HttpResponse> {
    let recommendations = service.list(&user.actor(), &query).await?;
    Ok(HttpResponse::Ok().json(recommendations))
}

/// Approve a pending recommendation.
///
/// Completes the parent ticket and records the recommendation text as its
/// final recommendation.
#[utoipa::path(
    post,
    path = "/api/v1/recommendations/{id}/approve",
    tag = "Recommendations",
    params(
        ("id" = String, Path, description = "Recommendation key")
    ),
    responses(
        (status = 200, description = "Approved", body = Recommendation),
        (status = 403, description = "Not a manager", body = crate::error::ErrorResponse),
        (status = 404, description = "No such recommendation", body = crate::error::ErrorResponse),
        (status = 409, description = "Already decided", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn approve_recommendation(
    user: AuthUser,
    service: web::Data<RecommendationService>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let recommendation = service.approve(&user.actor(), &path).await?;
    info!(recommendation_id = %recommendation.id, by = %user.email, "recommendation approved");
    Ok(HttpResponse::Ok().json(recommendation))
}

/// Reject a pending recommendation.
///
/// Returns the parent ticket to `Pending`; the optional note lands on the
/// ticket for the engineer to read. The recommendation itself stays
/// `rejected` forever.
#[utoipa::path(
    post,
    path = "/api/v1/recommendations/{id}/reject",
    tag = "Recommendations",
    params(
        ("id" = String, Path, description = "Recommendation key")
    ),
    request_body = RejectRecommendationBody,
    responses(
        (status = 200, description = "Rejected", body = Recommendation),
        (status = 403, description = "Not a manager", body = crate::error::ErrorResponse),
        (status = 404, description = "No such recommendation", body = crate::error::ErrorResponse),
        (status = 409, description = "Already decided", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn reject_recommendation(
    user: AuthUser,
    service: web::Data<RecommendationService>,
    path: web::Path<String>,
    body: web::Json<RejectRecommendationBody>,
) -> AppResult<HttpResponse> {
    let recommendation = service
        .reject(&user.actor(), &path, body.into_inner())
        .await?;
    info!(recommendation_id = %recommendation.id, by = %user.email, "recommendation rejected");
    Ok(HttpResponse::Ok().json(recommendation))
}

/// Configure recommendation routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/requests/{id}/recommendations",
        web::post().to(submit_recommendation),
    )
    .service(
        web::scope("/recommendations")
            .route("", web::get().to(list_recommendations))
            .route("/{id}/approve", web::post().to(approve_recommendation))
            .route("/{id}/reject", web::post().to(reject_recommendation)),
    );
}
