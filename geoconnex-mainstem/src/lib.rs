//! Point and bounding box to reference mainstem resolution.
//!
//! Resolution joins three read-only reference datasets:
//!
//! ```text
//! (lon, lat) | bbox | WKT centroid
//!       │
//!       ▼
//! CatchmentIndex  ── catchment_id ──►  FlowlineTable  ── terminal_path_id ──►  MainstemTable
//!                                                                                   │
//!                                                                     reference_mainstem_id
//!                                                                                   │
//!                                                                                   ▼
//!                                              ResolutionResult { mainstem_url, ... }
//! ```
//!
//! [`MainstemService`] owns the loaded data. It is built once at startup by
//! [`MainstemService::initialize`] and shared as `Arc<MainstemService>`.
//!
//! # Example
//!
//! ```no_run
//! use geoconnex_mainstem::{MainstemConfig, MainstemQuery, MainstemService};
//!
//! # async fn run() {
//! let config = MainstemConfig {
//!     catchments: Some("reference_catchments_and_flowlines.geojson".into()),
//!     ..Default::default()
//! };
//! let service = MainstemService::initialize(&config).await;
//! let query = MainstemQuery::from_params(Some("-105.2,40.1"), None, None).unwrap();
//! match service.resolve(&query) {
//!     Ok(result) => println!("{}", result.mainstem_url),
//!     Err(e) => println!("{e}"),
//! }
//! # }
//! ```

pub mod error;
pub mod query;
pub mod resolve;
pub mod service;
pub mod source;
pub mod tables;

pub use error::{ReferenceError, ResolveError, ResolveErrorKind};
pub use query::{BoundingBox, MainstemQuery, Point};
pub use resolve::{
    MainstemResolver, MainstemUrl, ReferenceData, ResolutionResult, DEFAULT_MAINSTEM_URL_BASE,
};
pub use service::{
    MainstemConfig, MainstemService, ServiceState, ServiceStatus, DEFAULT_MAINSTEM_LOOKUP,
};
pub use source::ReferenceLocation;
pub use tables::{FlowlineTable, MainstemTable, TableStats};

pub use geoconnex_spatial::{CatchmentIndex, FeatureSchema};
