//! Admin endpoints: /health, /stats

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use geoconnex_mainstem::ServiceStatus;
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub mainstem_ready: bool,
}

/// Health check endpoint
///
/// GET /health
///
/// The process is healthy even when reference data failed to load;
/// `mainstem_ready` reports that separately.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    tracing::debug!("health check requested");
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        mainstem_ready: state.mainstem.is_ready(),
    })
}

/// Server statistics response
#[derive(Serialize)]
pub struct StatsResponse {
    /// Server uptime in seconds
    pub uptime_secs: u64,
    /// Reference data status and table sizes
    pub mainstem: ServiceStatus,
    /// Whether /validate is backed by a validator
    pub validator_configured: bool,
    /// Server version
    pub version: &'static str,
}

/// Server statistics endpoint
///
/// GET /stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    tracing::debug!("server stats requested");
    Json(StatsResponse {
        uptime_secs: state.uptime_secs(),
        mainstem: state.mainstem.status(),
        validator_configured: state.validator.is_some(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
