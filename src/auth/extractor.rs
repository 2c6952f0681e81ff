//! Actix-web extractor for session-token authentication.
//!
//! Handlers take an [`AuthUser`] argument; the extractor validates the
//! bearer token and resolves the caller's role from their profile record
//! before the handler body runs.

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::auth::AuthService;
use crate::config::AUTH_HEADER;
use crate::error::AppError;
use crate::models::Role;
use crate::services::{roles, Actor};
use crate::store::TicketStore;

/// The authenticated caller, with their role already resolved. A caller
/// without a profile record has `role: None` and passes no capability check.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub role: Option<Role>,
    pub token: String,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            uid: self.uid.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth = req.app_data::<web::Data<AuthService>>().cloned();
        let store = req.app_data::<web::Data<TicketStore>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let (Some(auth), Some(store)) = (auth, store) else {
                return Err(AppError::Store(
                    "auth state not configured".to_string(),
                ));
            };
            let token = token.ok_or_else(|| {
                AppError::Unauthorized(
                    "missing bearer token; provide Authorization: Bearer <token>".to_string(),
                )
            })?;
            let principal = auth
                .verify_session(&token)
                .ok_or_else(|| AppError::Unauthorized("invalid or expired session".to_string()))?;

            let role = roles::resolve(&store, &principal.uid).await?;
            Ok(AuthUser {
                uid: principal.uid,
                email: principal.email,
                role,
                token,
            })
        })
    }
}
