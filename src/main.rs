//! RepairDesk server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use secrecy::SecretString;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use repairdesk_lib::api;
use repairdesk_lib::auth::AuthService;
use repairdesk_lib::config::Config;
use repairdesk_lib::middleware::RequestLogger;
use repairdesk_lib::models::{Role, UserRecord};
use repairdesk_lib::services::{
    DashboardService, PartsService, RecommendationService, RequestService,
};
use repairdesk_lib::store::{MemoryStore, TicketStore};

/// Seed the bootstrap admin account and profile when configured. Without it
/// a fresh store has no admin and nobody can assign roles.
async fn seed_admin(config: &Config, auth: &AuthService, store: &TicketStore) {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        warn!("no admin account configured; role assignment will be unavailable");
        return;
    };

    let secret = SecretString::from(password.clone());
    match auth.sign_up(email, &secret) {
        Ok(principal) => {
            let result = store
                .put_user(
                    &principal.uid,
                    &UserRecord {
                        email: principal.email.clone(),
                        role: Role::Admin,
                        created_at: chrono::Utc::now(),
                    },
                )
                .await;
            match result {
                Ok(()) => info!(email = %principal.email, "admin account seeded"),
                Err(e) => error!("failed to write admin profile: {}", e),
            }
        }
        Err(e) => error!("failed to seed admin account: {}", e),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, RD_ADMIN_EMAIL and RD_ADMIN_PASSWORD must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  RepairDesk Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    // Build shared state: one in-memory store behind the typed façade, one
    // account registry, the workflow services on top.
    let store = TicketStore::new(Arc::new(MemoryStore::new(config.event_capacity)));
    let auth = web::Data::new(AuthService::new());
    seed_admin(&config, &auth, &store).await;

    let request_service = web::Data::new(RequestService::new(store.clone()));
    let recommendation_service = web::Data::new(RecommendationService::new(store.clone()));
    let parts_service = web::Data::new(PartsService::new(store.clone()));
    let dashboard_service = web::Data::new(DashboardService::new(store.clone()));
    let store = web::Data::new(store);

    let bind_address = config.bind_address();
    let is_development = config.is_development();

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    HttpServer::new(move || {
        // Configure CORS
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                ])
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                ])
                .max_age(3600)
        };

        App::new()
            // CORS must wrap before other middleware
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(store.clone())
            .app_data(auth.clone())
            .app_data(request_service.clone())
            .app_data(recommendation_service.clone())
            .app_data(parts_service.clone())
            .app_data(dashboard_service.clone())
            .service(web::scope("/api/v1").configure(api::configure_api))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
            )
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}
