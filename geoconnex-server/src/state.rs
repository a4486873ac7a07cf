//! Application state management
//!
//! Everything here is immutable after startup, so handlers share it as
//! `Arc<AppState>` without locks.

use crate::config::ServerConfig;
use crate::telemetry::TelemetryConfig;
use crate::validator::{RemoteShapeValidator, ShapeValidator};
use geoconnex_mainstem::MainstemService;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Telemetry configuration
    pub telemetry_config: TelemetryConfig,

    /// Mainstem resolution service (ready or unavailable)
    pub mainstem: Arc<MainstemService>,

    /// External shape validator, when configured
    pub validator: Option<Arc<dyn ShapeValidator>>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Load reference data and build state from configuration.
    ///
    /// Reference data failures leave the mainstem service unavailable; only a
    /// malformed validator configuration is an error.
    pub async fn new(
        config: ServerConfig,
        telemetry_config: TelemetryConfig,
    ) -> crate::Result<Self> {
        let mainstem = MainstemService::initialize(&config.mainstem_config()).await;

        let validator: Option<Arc<dyn ShapeValidator>> = match &config.shacl_validator_url {
            Some(url) => {
                let remote = RemoteShapeValidator::new(url.clone())
                    .map_err(|e| crate::ServerError::internal(e.to_string()))?;
                Some(Arc::new(remote))
            }
            None => None,
        };

        Ok(Self::with_parts(
            config,
            telemetry_config,
            Arc::new(mainstem),
            validator,
        ))
    }

    /// Build state from an already constructed service.
    pub fn with_parts(
        config: ServerConfig,
        telemetry_config: TelemetryConfig,
        mainstem: Arc<MainstemService>,
        validator: Option<Arc<dyn ShapeValidator>>,
    ) -> Self {
        Self {
            config,
            telemetry_config,
            mainstem,
            validator,
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
