//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{MemoryCache, PgItemStore},
    config::Config,
    error::ApiError,
    web::{
        self,
        auth::{Authenticator, DevAuthenticator, JwtAuthenticator},
        AppState,
    },
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use priority_stream_core::StreamService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect(&config.database_url)
        .await?;
    let item_store = Arc::new(PgItemStore::new(db_pool.clone()));
    info!("Running database migrations...");
    item_store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Cache and the Stream Service ---
    let cache = Arc::new(MemoryCache::new(config.cache_max_entries));
    let stream = StreamService::new(item_store, cache, config.cache);
    info!(
        stream_ttl_secs = config.cache.stream_ttl.as_secs(),
        item_ttl_secs = config.cache.item_ttl.as_secs(),
        "Stream cache configured"
    );

    // --- 4. Choose the Authenticator ---
    let authenticator = build_authenticator(&config)?;

    // --- 5. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(stream, authenticator));
    let app = web::router(app_state).layer(build_cors(&config)?);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_for_shutdown(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    db_pool.close().await;
    info!("Server stopped.");
    Ok(())
}

fn build_authenticator(config: &Config) -> Result<Arc<dyn Authenticator>, ApiError> {
    if let Some(pem) = &config.auth_public_key_pem {
        info!("Verifying RS256 bearer tokens.");
        let authenticator = JwtAuthenticator::from_rsa_pem(pem)
            .map_err(|e| ApiError::Internal(format!("AUTH_PUBLIC_KEY_PEM: {}", e)))?;
        return Ok(Arc::new(authenticator));
    }
    if let Some(secret) = &config.auth_jwt_secret {
        info!("Verifying HS256 bearer tokens.");
        return Ok(Arc::new(JwtAuthenticator::from_secret(secret)));
    }
    warn!("No token verification key configured; every request is served as the development user.");
    Ok(Arc::new(DevAuthenticator))
}

fn build_cors(config: &Config) -> Result<CorsLayer, ApiError> {
    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|origin| {
            if origin == "*" {
                return Err(ApiError::Internal(
                    "Wildcard CORS origin cannot be combined with credentials".to_string(),
                ));
            }
            origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS origin '{}': {}", origin, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]))
}

/// Cancels `token` on Ctrl-C or, on Unix, SIGTERM.
async fn watch_for_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections...");
    token.cancel();
}
