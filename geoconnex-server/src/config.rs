//! Server configuration

use clap::Parser;
use geoconnex_mainstem::{
    FeatureSchema, MainstemConfig, DEFAULT_MAINSTEM_LOOKUP, DEFAULT_MAINSTEM_URL_BASE,
};
use std::net::SocketAddr;
use std::time::Duration;

/// Geoconnex mainstem server configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "geoconnex-server")]
#[command(about = "Resolve points and bounding boxes to reference river mainstems")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "GEOCONNEX_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    /// Catchment GeoJSON (local path, http(s), s3:// or gs:// locator).
    /// Mainstem lookup is disabled when unset or missing.
    #[arg(long, env = "CATCHMENTS_FILE")]
    pub catchments_file: Option<String>,

    /// Optional flowline CSV with COMID and LevelPathI columns
    #[arg(long, env = "FLOWLINES_FILE")]
    pub flowlines_file: Option<String>,

    /// Mainstem lookup CSV with lp_mainstem and ref_mainstem_id columns
    #[arg(long, env = "MAINSTEM_LOOKUP_FILE", default_value = DEFAULT_MAINSTEM_LOOKUP)]
    pub mainstem_lookup_file: String,

    /// Base of the canonical mainstem URL
    #[arg(long, env = "MAINSTEM_URL_BASE", default_value = DEFAULT_MAINSTEM_URL_BASE)]
    pub mainstem_url_base: String,

    /// Catchment id property names, tried in order (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub catchment_id_property: Vec<String>,

    /// Enable CORS (Cross-Origin Resource Sharing)
    #[arg(long, env = "GEOCONNEX_CORS_ENABLED", default_value = "true")]
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GEOCONNEX_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Per-request resolve timeout in milliseconds (0 disables)
    #[arg(long, env = "GEOCONNEX_RESOLVE_TIMEOUT_MS", default_value = "0")]
    pub resolve_timeout_ms: u64,

    /// External shape validation service; /validate answers 501 when unset
    #[arg(long, env = "SHACL_VALIDATOR_URL")]
    pub shacl_validator_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            catchments_file: None,
            flowlines_file: None,
            mainstem_lookup_file: DEFAULT_MAINSTEM_LOOKUP.to_string(),
            mainstem_url_base: DEFAULT_MAINSTEM_URL_BASE.to_string(),
            catchment_id_property: Vec::new(),
            cors_enabled: true,
            log_level: "info".to_string(),
            resolve_timeout_ms: 0,
            shacl_validator_url: None,
        }
    }
}

impl ServerConfig {
    /// Create config from CLI args
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Resolve timeout, if enabled
    pub fn resolve_timeout(&self) -> Option<Duration> {
        (self.resolve_timeout_ms > 0).then(|| Duration::from_millis(self.resolve_timeout_ms))
    }

    /// Reference data settings for the mainstem service
    pub fn mainstem_config(&self) -> MainstemConfig {
        let mut feature_schema = FeatureSchema::default();
        if !self.catchment_id_property.is_empty() {
            feature_schema = feature_schema.with_id_keys(self.catchment_id_property.clone());
        }
        MainstemConfig {
            catchments: self.catchments_file.clone(),
            flowlines: self.flowlines_file.clone(),
            mainstem_lookup: self.mainstem_lookup_file.clone(),
            mainstem_url_base: self.mainstem_url_base.clone(),
            feature_schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parser() {
        let parsed = ServerConfig::try_parse_from(["geoconnex-server"]).unwrap();
        let default = ServerConfig::default();
        assert_eq!(parsed.listen_addr, default.listen_addr);
        assert_eq!(parsed.mainstem_lookup_file, default.mainstem_lookup_file);
        assert_eq!(parsed.mainstem_url_base, default.mainstem_url_base);
        assert_eq!(parsed.cors_enabled, default.cors_enabled);
        assert_eq!(parsed.resolve_timeout(), None);
    }

    #[test]
    fn test_mainstem_config() {
        let cfg = ServerConfig::try_parse_from([
            "geoconnex-server",
            "--catchments-file",
            "s3://bucket/catchments.geojson",
            "--catchment-id-property",
            "featureid,COMID",
            "--resolve-timeout-ms",
            "250",
        ])
        .unwrap();
        let ms = cfg.mainstem_config();
        assert_eq!(ms.catchments.as_deref(), Some("s3://bucket/catchments.geojson"));
        assert_eq!(ms.feature_schema.id_keys, vec!["featureid", "COMID"]);
        assert_eq!(cfg.resolve_timeout(), Some(Duration::from_millis(250)));
    }
}
