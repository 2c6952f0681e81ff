//! Dashboard and report API handlers.

use actix_web::{web, HttpResponse};

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{DashboardStats, ReportQuery, ReportSummary};
use crate::services::DashboardService;

/// Aggregate dashboard counters.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Dashboard counters", body = DashboardStats),
        (status = 403, description = "Role may not view the dashboard", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn stats(
    user: AuthUser,
    service: web::Data<DashboardService>,
) -> AppResult<HttpResponse> {
    let stats = service.stats(&user.actor()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Date-filtered report summary with monthly buckets.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/report",
    tag = "Dashboard",
    params(
        ("from" = Option<String>, Query, description = "Inclusive start date (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Inclusive end date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Report summary", body = ReportSummary),
        (status = 403, description = "Role may not view reports", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn report(
    user: AuthUser,
    service: web::Data<DashboardService>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    let summary = service.report(&user.actor(), &query).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Configure dashboard routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dashboard")
            .route("/stats", web::get().to(stats))
            .route("/report", web::get().to(report)),
    );
}
