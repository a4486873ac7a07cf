//! Service lifecycle.
//!
//! Reference data is loaded once at startup. A load failure does not stop
//! the process: the service enters the unavailable state, every resolve
//! call answers [`ResolveError::Unavailable`], and the state persists until
//! restart.

use crate::error::{ReferenceError, ResolveError, Result};
use crate::query::{BoundingBox, MainstemQuery};
use crate::resolve::{
    MainstemResolver, MainstemUrl, ReferenceData, ResolutionResult, DEFAULT_MAINSTEM_URL_BASE,
};
use crate::source::ReferenceLocation;
use crate::tables::{FlowlineTable, MainstemTable};
use geoconnex_spatial::{CatchmentIndex, CatchmentStoreBuilder, FeatureSchema};
use serde::Serialize;

/// Default mainstem lookup table (Internet of Water reference rivers).
pub const DEFAULT_MAINSTEM_LOOKUP: &str =
    "https://github.com/internetofwater/ref_rivers/releases/download/v2.1/mainstem_lookup.csv";

/// Reference data locations.
#[derive(Debug, Clone)]
pub struct MainstemConfig {
    /// Catchment GeoJSON (optionally joined with flowline attributes).
    pub catchments: Option<String>,

    /// Optional flowline CSV (`COMID,LevelPathI`).
    pub flowlines: Option<String>,

    /// Mainstem lookup CSV (`lp_mainstem,ref_mainstem_id`).
    pub mainstem_lookup: String,

    /// Base of the canonical mainstem URL.
    pub mainstem_url_base: String,

    /// Feature property names in the catchment file.
    pub feature_schema: FeatureSchema,
}

impl Default for MainstemConfig {
    fn default() -> Self {
        Self {
            catchments: None,
            flowlines: None,
            mainstem_lookup: DEFAULT_MAINSTEM_LOOKUP.to_string(),
            mainstem_url_base: DEFAULT_MAINSTEM_URL_BASE.to_string(),
            feature_schema: FeatureSchema::default(),
        }
    }
}

/// Whether reference data loaded.
#[derive(Debug)]
pub enum ServiceState {
    Ready(MainstemResolver),
    Unavailable { reason: String },
}

/// Snapshot for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub catchments: usize,
    pub flowlines: usize,
    pub mainstems: usize,
}

/// Mainstem resolution service.
#[derive(Debug)]
pub struct MainstemService {
    state: ServiceState,
}

impl MainstemService {
    /// Load reference data and build the service.
    ///
    /// Never fails. Errors are logged and produce an unavailable service.
    pub async fn initialize(config: &MainstemConfig) -> Self {
        match load(config).await {
            Ok(resolver) => {
                let data = resolver.data();
                tracing::info!(
                    catchments = data.index.len(),
                    polygons = data.index.stats().polygons,
                    flowlines = data.flowlines.len(),
                    mainstems = data.mainstems.len(),
                    "mainstem reference data loaded"
                );
                Self {
                    state: ServiceState::Ready(resolver),
                }
            }
            Err(e) if e.is_missing() => {
                tracing::warn!(
                    error = %e,
                    "mainstem reference data not found; mainstem lookup disabled"
                );
                Self::unavailable(e.to_string())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "failed to load mainstem reference data; mainstem lookup disabled"
                );
                Self::unavailable(e.to_string())
            }
        }
    }

    /// A service in the unavailable state.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ServiceState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// A ready service over in-memory data.
    pub fn from_parts(
        index: CatchmentIndex,
        flowlines: FlowlineTable,
        mainstems: MainstemTable,
        urls: MainstemUrl,
    ) -> Self {
        Self {
            state: ServiceState::Ready(MainstemResolver::new(
                ReferenceData {
                    index,
                    flowlines,
                    mainstems,
                },
                urls,
            )),
        }
    }

    pub fn resolve(
        &self,
        query: &MainstemQuery,
    ) -> std::result::Result<ResolutionResult, ResolveError> {
        self.resolver()?.resolve(query)
    }

    pub fn resolve_all(
        &self,
        bbox: &BoundingBox,
    ) -> std::result::Result<Vec<ResolutionResult>, ResolveError> {
        self.resolver()?.resolve_all(bbox)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ServiceState::Ready(_))
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    pub fn status(&self) -> ServiceStatus {
        match &self.state {
            ServiceState::Ready(resolver) => {
                let data = resolver.data();
                ServiceStatus {
                    ready: true,
                    reason: None,
                    catchments: data.index.len(),
                    flowlines: data.flowlines.len(),
                    mainstems: data.mainstems.len(),
                }
            }
            ServiceState::Unavailable { reason } => ServiceStatus {
                ready: false,
                reason: Some(reason.clone()),
                catchments: 0,
                flowlines: 0,
                mainstems: 0,
            },
        }
    }

    fn resolver(&self) -> std::result::Result<&MainstemResolver, ResolveError> {
        match &self.state {
            ServiceState::Ready(resolver) => Ok(resolver),
            ServiceState::Unavailable { .. } => Err(ResolveError::Unavailable),
        }
    }
}

async fn load(config: &MainstemConfig) -> Result<MainstemResolver> {
    let catchments: ReferenceLocation = config
        .catchments
        .as_deref()
        .ok_or(ReferenceError::NotConfigured("catchments"))?
        .parse()?;
    if !catchments.is_available() {
        return Err(match catchments {
            ReferenceLocation::Local(path) => ReferenceError::NotFound(path),
            other => ReferenceError::InvalidLocation(other.to_string()),
        });
    }
    let flowlines = config
        .flowlines
        .as_deref()
        .map(str::parse::<ReferenceLocation>)
        .transpose()?;
    let lookup: ReferenceLocation = config.mainstem_lookup.parse()?;

    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| ReferenceError::Internal(format!("HTTP client: {e}")))?;

    tracing::debug!(
        catchments = %catchments,
        flowlines = ?flowlines.as_ref().map(ToString::to_string),
        mainstem_lookup = %lookup,
        "loading mainstem reference data"
    );

    let (catchment_text, flowline_text, lookup_text) = tokio::try_join!(
        catchments.fetch_text(&client),
        async {
            match &flowlines {
                Some(loc) => loc.fetch_text(&client).await.map(Some),
                None => Ok(None),
            }
        },
        lookup.fetch_text(&client),
    )?;

    let schema = config.feature_schema.clone();
    let (index, embedded) = tokio::task::spawn_blocking(move || {
        let mut builder = CatchmentStoreBuilder::new(schema);
        builder.add_collection(&catchment_text)?;
        let built = builder.finish()?;
        let stats = &built.stats;
        if stats.skipped_missing_id > 0 || stats.skipped_geometry > 0 {
            tracing::debug!(
                features = stats.features_processed,
                skipped_missing_id = stats.skipped_missing_id,
                skipped_geometry = stats.skipped_geometry,
                "catchment features skipped"
            );
        }
        Ok::<_, ReferenceError>((CatchmentIndex::build(built.store), built.terminal_paths))
    })
    .await
    .map_err(|e| ReferenceError::Internal(format!("catchment build task: {e}")))??;

    let mut flowline_table = FlowlineTable::from_pairs(embedded);
    if let Some(text) = flowline_text {
        let (csv_table, stats) = FlowlineTable::from_csv(text.as_bytes())?;
        tracing::debug!(rows = stats.rows, loaded = stats.loaded, "flowline table read");
        flowline_table.merge(csv_table);
    }

    let (mainstem_table, stats) = MainstemTable::from_csv(lookup_text.as_bytes())?;
    tracing::debug!(
        rows = stats.rows,
        loaded = stats.loaded,
        skipped = stats.skipped,
        conflicts = stats.conflicts,
        "mainstem lookup table read"
    );

    Ok(MainstemResolver::new(
        ReferenceData {
            index,
            flowlines: flowline_table,
            mainstems: mainstem_table,
        },
        MainstemUrl::new(config.mainstem_url_base.clone()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Point;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CATCHMENTS: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {
          "type": "Feature",
          "properties": {"Catchment_featureid": 1000403, "Flowline_LevelPathI": 54321.0},
          "geometry": {"type": "Polygon", "coordinates": [[[-105.0, 40.0], [-104.9, 40.0], [-104.9, 40.1], [-105.0, 40.1], [-105.0, 40.0]]]}
        },
        {
          "type": "Feature",
          "properties": {"Catchment_featureid": 1000500, "Flowline_LevelPathI": null},
          "geometry": {"type": "Polygon", "coordinates": [[[-104.5, 40.0], [-104.4, 40.0], [-104.4, 40.1], [-104.5, 40.1], [-104.5, 40.0]]]}
        }
      ]
    }"#;

    fn temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn path(file: &NamedTempFile) -> String {
        file.path().to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_initialize_ready() {
        let catchments = temp(CATCHMENTS);
        let lookup = temp("lp_mainstem,ref_mainstem_id\n54321,77\n");
        let config = MainstemConfig {
            catchments: Some(path(&catchments)),
            mainstem_lookup: path(&lookup),
            ..Default::default()
        };

        let service = MainstemService::initialize(&config).await;
        assert!(service.is_ready());

        let result = service
            .resolve(&MainstemQuery::Point(Point::new(-104.95, 40.05)))
            .unwrap();
        assert_eq!(result.catchment_id, 1000403);
        assert_eq!(result.terminal_path_id, 54321);
        assert_eq!(result.reference_mainstem_id, 77);

        let err = service
            .resolve(&MainstemQuery::Point(Point::new(-104.45, 40.05)))
            .unwrap_err();
        assert_eq!(err, ResolveError::FlowlineNotFound { catchment_id: 1000500 });

        let status = service.status();
        assert!(status.ready);
        assert_eq!(status.catchments, 2);
        assert_eq!(status.flowlines, 1);
        assert_eq!(status.mainstems, 1);
    }

    #[tokio::test]
    async fn test_flowline_csv_overrides_embedded() {
        let catchments = temp(CATCHMENTS);
        let flowlines = temp("COMID,LevelPathI\n1000500,54321\n1000403,11111\n");
        let lookup = temp("lp_mainstem,ref_mainstem_id\n54321,77\n11111,12\n");
        let config = MainstemConfig {
            catchments: Some(path(&catchments)),
            flowlines: Some(path(&flowlines)),
            mainstem_lookup: path(&lookup),
            ..Default::default()
        };

        let service = MainstemService::initialize(&config).await;
        let a = service
            .resolve(&MainstemQuery::Point(Point::new(-104.95, 40.05)))
            .unwrap();
        assert_eq!(a.reference_mainstem_id, 12);
        let b = service
            .resolve(&MainstemQuery::Point(Point::new(-104.45, 40.05)))
            .unwrap();
        assert_eq!(b.reference_mainstem_id, 77);
    }

    #[tokio::test]
    async fn test_missing_catchments_is_unavailable() {
        let lookup = temp("lp_mainstem,ref_mainstem_id\n54321,77\n");
        let config = MainstemConfig {
            catchments: Some("/nonexistent/reference_catchments.geojson".into()),
            mainstem_lookup: path(&lookup),
            ..Default::default()
        };

        let service = MainstemService::initialize(&config).await;
        assert!(!service.is_ready());
        let q = MainstemQuery::Point(Point::new(-104.95, 40.05));
        // persists across calls
        for _ in 0..3 {
            assert_eq!(service.resolve(&q).unwrap_err(), ResolveError::Unavailable);
        }
        let status = service.status();
        assert!(!status.ready);
        assert!(status.reason.unwrap().contains("reference_catchments.geojson"));
    }

    #[tokio::test]
    async fn test_unconfigured_and_malformed() {
        let service = MainstemService::initialize(&MainstemConfig::default()).await;
        assert!(!service.is_ready());

        let catchments = temp("{\"type\": \"Point\", \"coordinates\": [0, 0]}");
        let lookup = temp("lp_mainstem,ref_mainstem_id\n");
        let config = MainstemConfig {
            catchments: Some(path(&catchments)),
            mainstem_lookup: path(&lookup),
            ..Default::default()
        };
        let service = MainstemService::initialize(&config).await;
        assert!(!service.is_ready());
        assert_eq!(
            service
                .resolve_all(&BoundingBox::new(-1.0, -1.0, 1.0, 1.0))
                .unwrap_err(),
            ResolveError::Unavailable
        );
    }

    #[test]
    fn test_invalid_input_when_unavailable() {
        // availability is checked before input validation
        let service = MainstemService::unavailable("not loaded");
        let q = MainstemQuery::Point(Point::new(500.0, 0.0));
        assert_eq!(service.resolve(&q).unwrap_err(), ResolveError::Unavailable);
    }
}
