//! Shape validation capability
//!
//! The server forwards JSON-LD documents to an external validation service.
//! Shape authoring and the validation itself live outside this process.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

/// Result of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether the document conforms to the shapes.
    #[serde(rename = "valid")]
    pub conforms: bool,
    /// Human-readable report; empty when the document conforms.
    #[serde(rename = "message", default)]
    pub diagnostic: String,
}

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("validator request failed: {0}")]
    Request(String),

    #[error("validator returned status {0}")]
    Status(u16),

    #[error("validator response malformed: {0}")]
    Response(String),
}

/// Validates a JSON-LD document against the configured shapes.
#[async_trait]
pub trait ShapeValidator: Send + Sync {
    async fn validate(&self, document: &JsonValue) -> Result<ValidationOutcome, ValidatorError>;
}

/// Posts documents to an HTTP validation service.
///
/// The service answers `{ "valid": bool, "message": string }`.
pub struct RemoteShapeValidator {
    client: Client,
    url: String,
}

impl RemoteShapeValidator {
    pub fn new(url: impl Into<String>) -> Result<Self, ValidatorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ValidatorError::Request(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ShapeValidator for RemoteShapeValidator {
    async fn validate(&self, document: &JsonValue) -> Result<ValidationOutcome, ValidatorError> {
        tracing::debug!(url = %self.url, "forwarding document to validator");
        let response = self
            .client
            .post(&self.url)
            .json(document)
            .send()
            .await
            .map_err(|e| ValidatorError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValidatorError::Status(status.as_u16()));
        }

        response
            .json::<ValidationOutcome>()
            .await
            .map_err(|e| ValidatorError::Response(e.to_string()))
    }
}
