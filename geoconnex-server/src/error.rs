//! Server error types with HTTP status code mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use geoconnex_mainstem::{ResolveError, ResolveErrorKind};
use serde::Serialize;
use thiserror::Error;

/// Compact error type IRIs reported in the `@type` field.
pub mod errors {
    pub const BAD_REQUEST: &str = "err:mainstem/BadRequest";
    pub const CATCHMENT_NOT_FOUND: &str = "err:mainstem/CatchmentNotFound";
    pub const FLOWLINE_NOT_FOUND: &str = "err:mainstem/FlowlineNotFound";
    pub const MAINSTEM_NOT_FOUND: &str = "err:mainstem/MainstemNotFound";
    pub const UNAVAILABLE: &str = "err:mainstem/Unavailable";
    pub const TIMEOUT: &str = "err:mainstem/Timeout";
    pub const INVALID_JSON: &str = "err:validate/InvalidJson";
    pub const VALIDATOR: &str = "err:validate/ValidatorError";
    pub const NOT_IMPLEMENTED: &str = "err:system/NotImplemented";
    pub const INTERNAL: &str = "err:system/Internal";
}

/// Server error type that wraps resolution errors and provides HTTP status mapping
#[derive(Error, Debug)]
pub enum ServerError {
    /// Mainstem resolution error
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// JSON parsing error
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic bad request error
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Feature not implemented or not configured
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Resolution did not finish within the configured timeout
    #[error("Mainstem resolution timed out")]
    Timeout,

    /// External validator failed
    #[error("Validation service error")]
    Validator(String),

    /// Internal error; the message is logged, never returned
    #[error("Internal server error")]
    Internal(String),
}

impl ServerError {
    /// Map error to error type IRI (compact form)
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Resolve(e) => match e.kind() {
                ResolveErrorKind::InvalidInput => errors::BAD_REQUEST,
                ResolveErrorKind::CatchmentNotFound => errors::CATCHMENT_NOT_FOUND,
                ResolveErrorKind::FlowlineNotFound => errors::FLOWLINE_NOT_FOUND,
                ResolveErrorKind::MainstemNotFound => errors::MAINSTEM_NOT_FOUND,
                ResolveErrorKind::Unavailable => errors::UNAVAILABLE,
            },
            ServerError::Json(_) => errors::INVALID_JSON,
            ServerError::BadRequest(_) => errors::BAD_REQUEST,
            ServerError::NotImplemented(_) => errors::NOT_IMPLEMENTED,
            ServerError::Timeout => errors::TIMEOUT,
            ServerError::Validator(_) => errors::VALIDATOR,
            ServerError::Internal(_) => errors::INTERNAL,
        }
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Resolve(e) => match e.kind() {
                ResolveErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ResolveErrorKind::CatchmentNotFound
                | ResolveErrorKind::FlowlineNotFound
                | ResolveErrorKind::MainstemNotFound => StatusCode::NOT_FOUND,
                ResolveErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            },
            ServerError::Json(_) => StatusCode::BAD_REQUEST,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ServerError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Validator(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create a not implemented error
    pub fn not_implemented(feature: impl Into<String>) -> Self {
        ServerError::NotImplemented(feature.into())
    }

    /// Create a bad request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ServerError::BadRequest(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        ServerError::Internal(msg.into())
    }
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// HTTP status code
    pub status: u16,
    /// Error type (compact IRI, e.g., "err:mainstem/CatchmentNotFound")
    #[serde(rename = "@type")]
    pub error_type: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();

        match &self {
            ServerError::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error")
            }
            ServerError::Validator(detail) => {
                tracing::warn!(error = %detail, "validation service error")
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
            error_type: error_type.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
