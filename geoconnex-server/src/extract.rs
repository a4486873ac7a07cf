//! Request extractors

use crate::error::ServerError;
use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

/// Query string extractor rejecting with a JSON [`ServerError`].
///
/// Malformed query strings (duplicate keys, wrong types) answer 400 with the
/// usual error body instead of axum's plain-text rejection.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ServerError::bad_request(e.body_text()))?;
        Ok(QueryParams(params))
    }
}
