//! Mainstem endpoints: /mainstem, /mainstems
//!
//! Query parameters are the transport form of a mainstem query:
//! `point=lon,lat`, `bbox=minx,miny,maxx,maxy` or `wkt=<geometry>`, exactly
//! one of them.

use crate::error::{Result, ServerError};
use crate::extract::QueryParams;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use geoconnex_mainstem::{MainstemQuery, MainstemService, ResolutionResult, ResolveError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw query string parameters
#[derive(Debug, Default, Deserialize)]
pub struct MainstemParams {
    pub point: Option<String>,
    pub bbox: Option<String>,
    pub wkt: Option<String>,
}

impl MainstemParams {
    fn to_query(&self) -> Result<MainstemQuery> {
        Ok(MainstemQuery::from_params(
            self.point.as_deref(),
            self.bbox.as_deref(),
            self.wkt.as_deref(),
        )?)
    }
}

/// Response of the multi-result endpoint
#[derive(Debug, Serialize)]
pub struct MainstemsResponse {
    pub results: Vec<ResolutionResult>,
}

/// Resolve a point or bounding box to one mainstem
///
/// GET /mainstem?point=lon,lat
/// GET /mainstem?bbox=minx,miny,maxx,maxy
/// GET /mainstem?wkt=<geometry>
pub async fn mainstem(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<MainstemParams>,
) -> Result<Json<ResolutionResult>> {
    let query = params.to_query()?;
    let result = run_resolve(&state, move |service| service.resolve(&query)).await?;
    Ok(Json(result))
}

/// Resolve every catchment intersecting a bounding box
///
/// GET /mainstems?bbox=minx,miny,maxx,maxy
pub async fn mainstems(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<MainstemParams>,
) -> Result<Json<MainstemsResponse>> {
    let bbox = match params.to_query()? {
        MainstemQuery::BoundingBox(bbox) => bbox,
        MainstemQuery::Point(_) | MainstemQuery::Geometry(_) => {
            return Err(ServerError::bad_request(
                "/mainstems accepts a bounding box only",
            ))
        }
    };
    let results = run_resolve(&state, move |service| service.resolve_all(&bbox)).await?;
    Ok(Json(MainstemsResponse { results }))
}

/// Run a resolution, under the configured timeout when one is set.
async fn run_resolve<T, F>(state: &AppState, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&MainstemService) -> std::result::Result<T, ResolveError> + Send + 'static,
{
    let service = state.mainstem.clone();
    let result = match state.config.resolve_timeout() {
        None => f(service.as_ref()),
        Some(timeout) => {
            let task = tokio::task::spawn_blocking(move || f(service.as_ref()));
            match tokio::time::timeout(timeout, task).await {
                Ok(joined) => joined.map_err(|e| ServerError::internal(e.to_string()))?,
                Err(_) => {
                    tracing::warn!(timeout_ms = timeout.as_millis() as u64, "resolution timed out");
                    return Err(ServerError::Timeout);
                }
            }
        }
    };
    if let Err(e) = &result {
        tracing::debug!(kind = e.kind().as_str(), error = %e, "mainstem not resolved");
    }
    result.map_err(ServerError::from)
}
