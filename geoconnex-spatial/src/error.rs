//! Error types for the catchment store and index.

use thiserror::Error;

/// Catchment geometry errors.
#[derive(Error, Debug)]
pub enum SpatialError {
    /// WKT parsing error.
    #[error("WKT parse error: {0}")]
    WktParse(String),

    /// GeoJSON parsing error.
    #[error("GeoJSON parse error: {0}")]
    GeoJson(String),

    /// The source document is not a FeatureCollection.
    #[error("Expected a GeoJSON FeatureCollection, found {0}")]
    NotFeatureCollection(&'static str),

    /// Invalid geometry (empty polygon, unsupported type).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Two features in the source carry the same catchment id.
    #[error("Duplicate catchment id {0}")]
    DuplicateCatchment(i64),
}

impl From<geojson::Error> for SpatialError {
    fn from(err: geojson::Error) -> Self {
        SpatialError::GeoJson(err.to_string())
    }
}

/// Result type for spatial operations.
pub type Result<T> = std::result::Result<T, SpatialError>;
