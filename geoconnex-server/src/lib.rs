//! Geoconnex mainstem HTTP server
//!
//! A thin HTTP wrapper around `geoconnex-mainstem`.
//!
//! # Endpoints
//!
//! - `GET /mainstem?point=lon,lat`, `?bbox=minx,miny,maxx,maxy` or `?wkt=<geometry>`
//! - `GET /mainstems?bbox=minx,miny,maxx,maxy`
//! - `POST /validate` (forwarded to an external shape validator)
//! - `GET /health`, `GET /stats`
//!
//! # Example
//!
//! ```ignore
//! use geoconnex_server::{GeoconnexServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let server = GeoconnexServer::new(config).await.unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod validator;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use state::AppState;
pub use telemetry::{init_logging, TelemetryConfig};
pub use validator::{RemoteShapeValidator, ShapeValidator, ValidationOutcome, ValidatorError};

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Geoconnex HTTP server
pub struct GeoconnexServer {
    /// Application state
    state: Arc<AppState>,
    /// Configured router
    router: Router,
}

impl GeoconnexServer {
    /// Create a new server with the given configuration.
    ///
    /// Loads reference data before returning.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let telemetry_config = TelemetryConfig::with_server_config(&config);
        let state = Arc::new(AppState::new(config, telemetry_config).await?);
        let router = routes::build_router(state.clone());

        Ok(Self { state, router })
    }

    /// Get a reference to the application state
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Get the router for testing
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until ctrl-c
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let addr = self.state.config.listen_addr;
        let listener = TcpListener::bind(addr).await?;

        info!(
            addr = %addr,
            mainstem_ready = self.state.mainstem.is_ready(),
            validator = self.state.validator.is_some(),
            "Geoconnex server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
