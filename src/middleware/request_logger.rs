//! Structured request/response logging.
//!
//! One line when a request arrives, one when it completes, both on the
//! `api` target. Session tokens are logged as an 8-character prefix only.

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::time::Instant;
use tracing::{info, warn};

use crate::config::AUTH_HEADER;

/// Middleware factory; wrap the whole app in it.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
}

/// Shorten a bearer token to a loggable prefix.
fn session_prefix(req: &ServiceRequest) -> String {
    req.headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| match token.char_indices().nth(8) {
            Some((idx, _)) => format!("{}...", &token[..idx]),
            None => "invalid".to_string(),
        })
        .unwrap_or_else(|| "none".to_string())
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let session = session_prefix(&req);

        info!(
            target: "api",
            method = %method,
            path = %path,
            remote_addr = %remote_addr,
            session = %session,
            "request started"
        );

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            let status = res.status().as_u16();
            let duration_ms = start.elapsed().as_millis();

            if res.status().is_success() || res.status().is_redirection() {
                info!(
                    target: "api",
                    method = %method, path = %path, status = %status, duration_ms = %duration_ms,
                    "request completed"
                );
            } else {
                warn!(
                    target: "api",
                    method = %method, path = %path, status = %status, duration_ms = %duration_ms,
                    "request failed"
                );
            }
            Ok(res)
        })
    }
}
