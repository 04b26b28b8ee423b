//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::web::auth::Authenticator;
use priority_stream_core::StreamService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub stream: Arc<StreamService>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(stream: StreamService, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            stream: Arc::new(stream),
            authenticator,
        }
    }
}
