//! Resolution pipeline.
//!
//! ```text
//! MainstemQuery ─► validate ─► CatchmentIndex ─► FlowlineTable ─► MainstemTable ─► ResolutionResult
//!                     │              │                 │                 │
//!                InvalidInput  CatchmentNotFound  FlowlineNotFound  MainstemNotFound
//! ```
//!
//! Every stage is a typed lookup against immutable data, so a resolver is
//! shared freely between threads and repeated queries return identical
//! results.

use crate::error::ResolveError;
use crate::query::{BoundingBox, MainstemQuery, Point};
use crate::tables::{FlowlineTable, MainstemTable};
use geoconnex_spatial::{BBox, CatchmentIndex};
use serde::{Deserialize, Serialize};

/// Default base of canonical mainstem URLs.
pub const DEFAULT_MAINSTEM_URL_BASE: &str =
    "https://reference.geoconnex.us/collections/mainstems/items";

/// Mainstem URL template: `{base}/{reference_mainstem_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainstemUrl {
    base: String,
}

impl MainstemUrl {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// URL for a reference mainstem id.
    pub fn for_id(&self, reference_mainstem_id: i64) -> String {
        format!("{}/{}", self.base, reference_mainstem_id)
    }
}

impl Default for MainstemUrl {
    fn default() -> Self {
        Self::new(DEFAULT_MAINSTEM_URL_BASE)
    }
}

/// Successful resolution of one catchment to its mainstem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub reference_mainstem_id: i64,
    pub mainstem_url: String,
    pub catchment_id: i64,
    #[serde(rename = "terminal_flowline_id")]
    pub terminal_path_id: i64,
}

/// The three reference datasets, loaded and immutable.
#[derive(Debug)]
pub struct ReferenceData {
    pub index: CatchmentIndex,
    pub flowlines: FlowlineTable,
    pub mainstems: MainstemTable,
}

/// Chains the spatial lookup and the two keyed joins.
#[derive(Debug)]
pub struct MainstemResolver {
    data: ReferenceData,
    urls: MainstemUrl,
}

impl MainstemResolver {
    pub fn new(data: ReferenceData, urls: MainstemUrl) -> Self {
        Self { data, urls }
    }

    /// Resolve a point, bounding box or WKT geometry to a single mainstem.
    ///
    /// A bounding box resolves through its best catchment: one whose
    /// envelope lies inside the box, else one whose polygon touches the box,
    /// lowest id on ties. A geometry resolves through its centroid.
    pub fn resolve(&self, query: &MainstemQuery) -> Result<ResolutionResult, ResolveError> {
        let catchment_id = match query {
            MainstemQuery::Point(p) => {
                p.validate()?;
                self.data.index.query_point(p.lon, p.lat)
            }
            MainstemQuery::BoundingBox(b) => {
                b.validate()?;
                self.data
                    .index
                    .best_in_bbox(&BBox::new(b.minx, b.miny, b.maxx, b.maxy))
            }
            MainstemQuery::Geometry(wkt) => {
                let p = Point::from_wkt_centroid(wkt)?;
                tracing::debug!(lon = p.lon, lat = p.lat, "resolving geometry by centroid");
                self.data.index.query_point(p.lon, p.lat)
            }
        }
        .ok_or(ResolveError::CatchmentNotFound)?;

        self.resolve_catchment(catchment_id)
    }

    /// Resolve every catchment whose envelope intersects the box.
    ///
    /// Catchments that fail the flowline or mainstem stage are omitted.
    /// Results are in ascending catchment id order.
    pub fn resolve_all(&self, bbox: &BoundingBox) -> Result<Vec<ResolutionResult>, ResolveError> {
        bbox.validate()?;

        let candidates = self
            .data
            .index
            .query_box(bbox.minx, bbox.miny, bbox.maxx, bbox.maxy);
        if candidates.is_empty() {
            return Err(ResolveError::CatchmentNotFound);
        }

        let total = candidates.len();
        let results: Vec<ResolutionResult> = candidates
            .into_iter()
            .filter_map(|id| self.resolve_catchment(id).ok())
            .collect();
        tracing::debug!(
            candidates = total,
            resolved = results.len(),
            "bbox resolution"
        );
        Ok(results)
    }

    /// Flowline and mainstem stages for a known catchment.
    pub fn resolve_catchment(&self, catchment_id: i64) -> Result<ResolutionResult, ResolveError> {
        let terminal_path_id = self
            .data
            .flowlines
            .lookup_terminal_path(catchment_id)
            .ok_or(ResolveError::FlowlineNotFound { catchment_id })?;

        let reference_mainstem_id = self
            .data
            .mainstems
            .lookup_mainstem(terminal_path_id)
            .ok_or(ResolveError::MainstemNotFound {
                catchment_id,
                terminal_path_id,
            })?;

        Ok(ResolutionResult {
            reference_mainstem_id,
            mainstem_url: self.urls.for_id(reference_mainstem_id),
            catchment_id,
            terminal_path_id,
        })
    }

    /// The loaded reference data.
    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    /// The URL template.
    pub fn urls(&self) -> &MainstemUrl {
        &self.urls
    }
}
