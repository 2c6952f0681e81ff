//! API endpoint modules.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod openapi;
pub mod parts;
pub mod recommendations;
pub mod requests;
pub mod users;
pub mod websocket;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;

use actix_web::web;

/// Mount every API route under one scope.
///
/// The nested `/requests/{id}/...` routes are registered before the
/// `/requests` scope so they match first.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    configure_health_routes(cfg);
    auth::configure_routes(cfg);
    users::configure_routes(cfg);
    recommendations::configure_routes(cfg);
    parts::configure_routes(cfg);
    requests::configure_routes(cfg);
    dashboard::configure_routes(cfg);
    websocket::configure_routes(cfg);
}
