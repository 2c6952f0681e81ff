//! Authentication API handlers.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::{AuthService, AuthUser};
use crate::error::AppResult;
use crate::models::{LoginRequest, Role, SessionResponse, SignUpRequest, UserRecord};
use crate::services::roles;
use crate::store::TicketStore;

/// The caller's own identity and role.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub uid: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Create an account.
///
/// New accounts get a profile record with the `user` role and are signed in
/// immediately.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "Auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionResponse),
        (status = 400, description = "Invalid email or weak password", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::error::ErrorResponse),
    )
)]
pub async fn sign_up(
    auth: web::Data<AuthService>,
    store: web::Data<TicketStore>,
    body: web::Json<SignUpRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let principal = auth.sign_up(&body.email, &body.password)?;

    store
        .put_user(
            &principal.uid,
            &UserRecord {
                email: principal.email.clone(),
                role: Role::User,
                created_at: Utc::now(),
            },
        )
        .await?;

    let token = auth.create_session(&principal);
    info!(uid = %principal.uid, "account created");
    Ok(HttpResponse::Created().json(SessionResponse {
        token,
        uid: principal.uid,
        email: principal.email,
        role: Some(Role::User),
    }))
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Wrong email or password", body = crate::error::ErrorResponse),
    )
)]
pub async fn login(
    auth: web::Data<AuthService>,
    store: web::Data<TicketStore>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let principal = auth.sign_in(&body.email, &body.password)?;
    let role = roles::resolve(&store, &principal.uid).await?;
    let token = auth.create_session(&principal);

    info!(uid = %principal.uid, "signed in");
    Ok(HttpResponse::Ok().json(SessionResponse {
        token,
        uid: principal.uid,
        email: principal.email,
        role,
    }))
}

/// Sign out, revoking the presented session token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn logout(auth: web::Data<AuthService>, user: AuthUser) -> AppResult<HttpResponse> {
    auth.revoke_session(&user.token);
    Ok(HttpResponse::NoContent().finish())
}

/// The caller's identity and resolved role.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current principal", body = MeResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
    ),
    security(("session_token" = []))
)]
pub async fn me(user: AuthUser) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(MeResponse {
        uid: user.uid,
        email: user.email,
        role: user.role,
    }))
}

/// Configure auth routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(sign_up))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/me", web::get().to(me)),
    );
}
