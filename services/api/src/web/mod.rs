pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

use crate::error::panic_response;
use axum::{middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::{require_auth, UserId};
pub use rest::{get_stream_handler, get_stream_item_handler, health_handler, ApiDoc};
pub use state::AppState;

/// Builds the full HTTP surface: public health check, authenticated stream
/// routes and the Swagger UI.
///
/// Every API response carries an `x-request-id` header, and a panicking
/// handler answers with the 500 error envelope.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/v2/stream", get(get_stream_handler))
        .route("/v2/stream/{item_id}", get(get_stream_item_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
