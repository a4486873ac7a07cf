//! Error types for reference loading and mainstem resolution.

use geoconnex_spatial::SpatialError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading reference data at startup.
///
/// Any of these puts the service into the unavailable state; none of them
/// escapes to the process.
#[derive(Error, Debug)]
pub enum ReferenceError {
    /// No location configured for a required dataset.
    #[error("No location configured for {0}")]
    NotConfigured(&'static str),

    /// Local reference file does not exist.
    #[error("Reference file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Location uses a scheme we cannot read.
    #[error("Unsupported reference location scheme '{0}'")]
    UnsupportedScheme(String),

    /// Malformed remote locator (e.g. `s3://` without a key).
    #[error("Invalid reference location '{0}'")]
    InvalidLocation(String),

    /// IO error reading a local file.
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote fetch failed (connect, status, body).
    #[error("Failed to fetch {url}: {message}")]
    Remote { url: String, message: String },

    /// Reference file is not valid UTF-8.
    #[error("Reference file {0} is not valid UTF-8")]
    Utf8(String),

    /// CSV decoding error.
    #[error("CSV error in {table} table: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    /// Required CSV column absent.
    #[error("{table} table has no '{column}' column")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    /// Geometry decoding or store construction error.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReferenceError {
    /// Create a remote fetch error.
    pub fn remote(url: impl Into<String>, message: impl ToString) -> Self {
        ReferenceError::Remote {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error only means "the data is not there" rather than
    /// "the data is broken".
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            ReferenceError::NotConfigured(_) | ReferenceError::NotFound(_)
        )
    }
}

/// Result type for reference loading.
pub type Result<T> = std::result::Result<T, ReferenceError>;

/// Stage-specific resolution failure.
///
/// The three not-found variants are ordinary negative results, not faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Missing, ambiguous or malformed query parameters.
    #[error("{0}")]
    InvalidInput(String),

    /// No catchment at the queried location.
    #[error("No catchment found at the given location")]
    CatchmentNotFound,

    /// The catchment has no associated flowline.
    #[error("No flowline found for catchment {catchment_id}")]
    FlowlineNotFound { catchment_id: i64 },

    /// The flowline's level path has no reference mainstem.
    #[error("No mainstem found for terminal path {terminal_path_id}")]
    MainstemNotFound {
        catchment_id: i64,
        terminal_path_id: i64,
    },

    /// Reference data did not load; persists until restart.
    #[error("Mainstem lookup is unavailable")]
    Unavailable,
}

/// Discriminant of [`ResolveError`] for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveErrorKind {
    InvalidInput,
    CatchmentNotFound,
    FlowlineNotFound,
    MainstemNotFound,
    Unavailable,
}

impl ResolveErrorKind {
    /// Stable name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveErrorKind::InvalidInput => "InvalidInput",
            ResolveErrorKind::CatchmentNotFound => "CatchmentNotFound",
            ResolveErrorKind::FlowlineNotFound => "FlowlineNotFound",
            ResolveErrorKind::MainstemNotFound => "MainstemNotFound",
            ResolveErrorKind::Unavailable => "Unavailable",
        }
    }
}

impl ResolveError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ResolveError::InvalidInput(msg.into())
    }

    /// The error kind.
    pub fn kind(&self) -> ResolveErrorKind {
        match self {
            ResolveError::InvalidInput(_) => ResolveErrorKind::InvalidInput,
            ResolveError::CatchmentNotFound => ResolveErrorKind::CatchmentNotFound,
            ResolveError::FlowlineNotFound { .. } => ResolveErrorKind::FlowlineNotFound,
            ResolveError::MainstemNotFound { .. } => ResolveErrorKind::MainstemNotFound,
            ResolveError::Unavailable => ResolveErrorKind::Unavailable,
        }
    }

    /// True for the three stage-specific negative results.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            ResolveErrorKind::CatchmentNotFound
                | ResolveErrorKind::FlowlineNotFound
                | ResolveErrorKind::MainstemNotFound
        )
    }
}
