//! Domain error types for the RepairDesk server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.
//! Every failure is caught at the initiating handler and rendered as a structured
//! JSON body; no failure is fatal to the process.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Store operation failed (backend/network)
    #[error("Store error: {0}")]
    Store(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// A record already occupies the target path
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Invalid input data (including unknown status strings)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted to perform the action
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested state transition is not allowed by the workflow
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Ticket ID allocation gave up after the retry cap
    #[error("Could not allocate a request id after {0} attempts")]
    AllocationExhausted(u32),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::Store(err_str) => {
                tracing::error!("Store error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "An internal store error occurred".to_string(),
                )
            }
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::AlreadyExists(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "ALREADY_EXISTS",
                self.to_string(),
            ),
            AppError::InvalidInput(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                self.to_string(),
            ),
            AppError::Unauthorized(_) => (
                actix_web::http::StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                self.to_string(),
            ),
            AppError::Forbidden(_) => (
                actix_web::http::StatusCode::FORBIDDEN,
                "FORBIDDEN",
                self.to_string(),
            ),
            AppError::InvalidTransition(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "INVALID_TRANSITION",
                self.to_string(),
            ),
            AppError::AllocationExhausted(_) => (
                actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                "ALLOCATION_EXHAUSTED",
                self.to_string(),
            ),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching the OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<crate::store::StoreError> for AppError {
    fn from(err: crate::store::StoreError) -> Self {
        use crate::store::StoreError;
        match err {
            StoreError::AlreadyExists(path) => AppError::AlreadyExists(path),
            StoreError::NotFound(path) => AppError::NotFound(path),
            StoreError::Serialization(msg) => AppError::InvalidInput(msg),
            StoreError::Backend(msg) => AppError::Store(msg),
        }
    }
}
