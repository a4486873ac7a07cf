//! HTTP route handlers and router configuration

mod admin;
mod mainstem;
mod validate;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use mainstem::{MainstemParams, MainstemsResponse};

/// Build the main application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        // Health check
        .route("/health", get(admin::health))
        .route("/stats", get(admin::stats))
        // Mainstem resolution
        .route("/mainstem", get(mainstem::mainstem))
        .route("/mainstems", get(mainstem::mainstems))
        // Shape validation
        .route("/validate", post(validate::validate))
        .with_state(state.clone());

    // Add middleware
    router = router.layer(TraceLayer::new_for_http());

    // Add CORS if enabled
    if state.config.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}
