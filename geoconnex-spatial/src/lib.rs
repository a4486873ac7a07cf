//! Catchment geometry store and spatial index.
//!
//! This crate holds the land-surface catchment polygons of a reference
//! hydrofabric and answers two questions about them:
//!
//! - which catchment contains a longitude/latitude point
//! - which catchments have an envelope intersecting a bounding box
//!
//! # Architecture
//!
//! ```text
//! GeoJSON FeatureCollection
//!          │
//!          ▼
//! CatchmentStoreBuilder ──► (catchment_id, level path) pairs
//!          │
//!          ▼
//!    GeometryStore (immutable, keyed by id, bbox/centroid metadata)
//!          │
//!          ▼
//!    CatchmentIndex (rstar R-tree of envelopes)
//!          │
//!          ▼
//!    Envelope prefilter ──► exact refine (geo::Intersects) ──► lowest id
//! ```
//!
//! Everything is built once at startup and is read-only afterwards, so a
//! [`CatchmentIndex`] can be shared across threads without locking.
//!
//! # Modules
//!
//! - [`config`]: Feature property schema
//! - [`geometry`]: Catchment, bounding box, geometry store, WKT parsing
//! - [`index`]: R-tree index and queries
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod geometry;
pub mod index;

mod builder;

pub use builder::{
    parse_identifier, parse_identifier_str, BuildResult, BuildStats, CatchmentStoreBuilder,
};
pub use config::FeatureSchema;
pub use error::{Result, SpatialError};
pub use geometry::{parse_wkt, wkt_centroid, BBox, Catchment, CatchmentMetadata, GeometryStore};
pub use index::{CatchmentIndex, IndexStats};
