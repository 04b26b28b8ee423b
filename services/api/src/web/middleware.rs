//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::AppState;

/// The authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

/// Middleware that resolves the caller through the configured authenticator.
///
/// If valid, inserts a `UserId` into request extensions for handlers to use.
/// If invalid or missing, returns 401 with the error envelope.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let user_id = state.authenticator.authenticate(authorization).map_err(|e| {
        debug!("Rejected request: {}", e);
        ApiError::Unauthorized(e.to_string())
    })?;

    req.extensions_mut().insert(UserId(user_id));
    Ok(next.run(req).await)
}
