//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service and its JSON envelope.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use priority_stream_core::StreamError;
use serde::{Deserialize, Serialize};
use std::any::Any;
use tracing::error;
use utoipa::ToSchema;

//=========================================================================================
// Error Envelope
//=========================================================================================

pub const ERR_UNAUTHORIZED: &str = "unauthorized";
pub const ERR_NOT_FOUND: &str = "resource_not_found";
pub const ERR_INTERNAL: &str = "internal_error";
pub const ERR_VALIDATION_FAILED: &str = "validation_failed";

/// The body of every error response: `{"error": {"code": .., "message": ..}}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

//=========================================================================================
// ApiError
//=========================================================================================

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the stream core.
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error while running database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request carried no usable credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The requested resource does not exist for this user.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::Stream(e) if e.is_client_error() => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ERR_VALIDATION_FAILED, e.to_string()),
            ),
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(ERR_UNAUTHORIZED, message.clone()),
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(ERR_NOT_FOUND, message.clone()),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(ERR_INTERNAL, "An internal error occurred"),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(body)).into_response()
    }
}

/// Turns a panic caught while serving a request into the internal error envelope.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    error!("Request handler panicked: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(ERR_INTERNAL, "An internal error occurred")),
    )
        .into_response()
}
