//! Geoconnex mainstem server CLI
//!
//! Run with: `cargo run -p geoconnex-server -- --help`

use geoconnex_server::{init_logging, GeoconnexServer, ServerConfig, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_args();

    let telemetry_config = TelemetryConfig::with_server_config(&config);
    init_logging(&telemetry_config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.listen_addr,
        catchments = ?config.catchments_file,
        flowlines = ?config.flowlines_file,
        mainstem_lookup = %config.mainstem_lookup_file,
        cors = config.cors_enabled,
        resolve_timeout_ms = config.resolve_timeout_ms,
        log_format = ?telemetry_config.log_format,
        "Starting Geoconnex server"
    );

    let server = GeoconnexServer::new(config).await?;
    server.run().await.map_err(Into::into)
}
