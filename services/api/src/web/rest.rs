//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorDetail, ErrorResponse};
use crate::web::middleware::UserId;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use chrono::{SecondsFormat, Utc};
use priority_stream_core::{
    validate_filter, AiInsight, Attachment, CalendarEvent, InsightType, Message, Priority,
    PriorityItem, SenderType, SocialContent, SocialPlatform, SocialStats, SourceType,
    StreamFilter, StreamPage, StreamRequest, User,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{IntoParams, Modify, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        get_stream_handler,
        get_stream_item_handler,
    ),
    components(
        schemas(
            HealthResponse, ErrorResponse, ErrorDetail, StreamPage, PriorityItem, Message,
            User, Attachment, CalendarEvent, SocialContent, SocialStats, AiInsight,
            SourceType, Priority, SenderType, InsightType, SocialPlatform, StreamFilter,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Priority Stream API", description = "Paginated, cached feed of a user's priority items.")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// API Query and Response Structs
//=========================================================================================

/// Query string of `GET /v2/stream`.
///
/// Values stay raw strings so the handler decides how lenient to be.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    /// One of `all`, `high` or `unread`. Missing or empty means `all`.
    pub filter: Option<String>,
    /// Page size, clamped to 1..=100. Unparseable values fall back to 20.
    pub limit: Option<String>,
    /// The `nextCursor` of the previous page.
    pub cursor: Option<String>,
}

impl StreamQuery {
    /// Converts the raw query into a core request for `user_id`.
    pub fn into_request(self, user_id: String) -> Result<StreamRequest, ApiError> {
        let filter = match self.filter.as_deref() {
            None | Some("") => StreamFilter::All,
            Some(raw) => validate_filter(raw)?,
        };
        let mut request = StreamRequest::new(user_id).with_filter(filter);
        request.limit = self.limit.as_deref().and_then(|l| l.trim().parse::<i64>().ok());
        request.cursor = self.cursor.filter(|c| !c.is_empty());
        Ok(request)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

/// Returns one page of the caller's priority stream, newest first.
#[utoipa::path(
    get,
    path = "/v2/stream",
    params(StreamQuery),
    responses(
        (status = 200, description = "A page of priority items", body = StreamPage),
        (status = 400, description = "Invalid filter or cursor", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stream_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Query(query): Query<StreamQuery>,
) -> Result<Json<StreamPage>, ApiError> {
    let request = query.into_request(user_id)?;
    let page = app_state.stream.get_stream(&request).await?;
    Ok(Json(page))
}

/// Returns one priority item with its full message thread.
#[utoipa::path(
    get,
    path = "/v2/stream/{item_id}",
    params(
        ("item_id" = String, Path, description = "The id of the priority item.")
    ),
    responses(
        (status = 200, description = "The item with its messages", body = PriorityItem),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 404, description = "No such item for this user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stream_item_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(item_id): Path<String>,
) -> Result<Json<PriorityItem>, ApiError> {
    app_state
        .stream
        .get_stream_item(&user_id, &item_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("The requested priority item does not exist".to_string()))
}
