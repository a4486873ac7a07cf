//! Validation endpoint: /validate

use crate::error::{Result, ServerError};
use crate::state::AppState;
use crate::validator::ValidationOutcome;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Validate a JSON-LD document against the configured shapes
///
/// POST /validate
///
/// Answers `{ "valid": bool, "message": string }`. A non-conforming
/// document is a successful validation, not an error.
pub async fn validate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ValidationOutcome>> {
    let Some(validator) = state.validator.as_ref() else {
        return Err(ServerError::not_implemented("no shape validator configured"));
    };

    let document: JsonValue = serde_json::from_slice(&body)?;
    if !document.is_object() && !document.is_array() {
        return Err(ServerError::bad_request(
            "document must be a JSON-LD object or array",
        ));
    }

    let outcome = validator
        .validate(&document)
        .await
        .map_err(|e| ServerError::Validator(e.to_string()))?;
    tracing::debug!(conforms = outcome.conforms, "document validated");
    Ok(Json(outcome))
}
