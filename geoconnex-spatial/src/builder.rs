//! Catchment store builder.
//!
//! Builds a [`GeometryStore`] from reference GeoJSON. The builder:
//! 1. Accepts catchment features (id property + polygonal geometry)
//! 2. Resolves the id via the configured [`FeatureSchema`] keys
//! 3. Collects the optional level path attribute of joined files
//! 4. Skips (and counts) features it cannot use
//! 5. Produces an immutable store plus the collected attribute pairs
//!
//! # Usage
//!
//! ```ignore
//! let mut builder = CatchmentStoreBuilder::new(FeatureSchema::default());
//! builder.add_collection(&geojson_text)?;
//! let result = builder.finish()?;
//! let index = CatchmentIndex::build(result.store);
//! ```

use crate::config::FeatureSchema;
use crate::error::{Result, SpatialError};
use crate::geometry::{Catchment, GeometryStore};
use geojson::{Feature, GeoJson};
use geo_types::Geometry;
use serde_json::Value as JsonValue;

/// Statistics collected while building.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of features processed.
    pub features_processed: u64,

    /// Number of catchments added.
    pub catchments_added: u64,

    /// Features without a usable id.
    pub skipped_missing_id: u64,

    /// Features without geometry or with a non-polygonal geometry.
    pub skipped_geometry: u64,

    /// Catchments carrying a level path attribute.
    pub terminal_paths: u64,
}

/// Output of [`CatchmentStoreBuilder::finish`].
#[derive(Debug)]
pub struct BuildResult {
    /// The immutable catchment store.
    pub store: GeometryStore,

    /// `(catchment_id, terminal_path_id)` pairs read from feature properties.
    pub terminal_paths: Vec<(i64, i64)>,

    /// Build statistics.
    pub stats: BuildStats,
}

/// Builder for catchment stores.
pub struct CatchmentStoreBuilder {
    schema: FeatureSchema,
    catchments: Vec<Catchment>,
    terminal_paths: Vec<(i64, i64)>,
    stats: BuildStats,
}

impl CatchmentStoreBuilder {
    /// Create a new builder with the given feature schema.
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            catchments: Vec::new(),
            terminal_paths: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    /// Add every feature of a GeoJSON FeatureCollection document.
    pub fn add_collection(&mut self, text: &str) -> Result<()> {
        let geojson: GeoJson = text.parse()?;
        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            GeoJson::Feature(_) => return Err(SpatialError::NotFeatureCollection("Feature")),
            GeoJson::Geometry(_) => return Err(SpatialError::NotFeatureCollection("Geometry")),
        };
        self.catchments.reserve(collection.features.len());
        for feature in collection.features {
            self.add_feature(feature);
        }
        Ok(())
    }

    /// Add one feature. Returns the catchment id when the feature was kept.
    pub fn add_feature(&mut self, feature: Feature) -> Option<i64> {
        self.stats.features_processed += 1;

        let Some(id) = self.feature_id(&feature) else {
            self.stats.skipped_missing_id += 1;
            tracing::debug!("skipping catchment feature without id");
            return None;
        };

        let terminal_path = self
            .schema
            .terminal_path_keys
            .iter()
            .find_map(|key| feature.property(key).and_then(parse_identifier));

        let Some(geometry) = feature.geometry else {
            self.stats.skipped_geometry += 1;
            tracing::debug!(catchment_id = id, "skipping catchment feature without geometry");
            return None;
        };

        let catchment = Geometry::<f64>::try_from(geometry)
            .map_err(SpatialError::from)
            .and_then(|g| Catchment::new(id, g));
        match catchment {
            Ok(c) => {
                self.catchments.push(c);
                self.stats.catchments_added += 1;
                if let Some(tp) = terminal_path {
                    self.terminal_paths.push((id, tp));
                    self.stats.terminal_paths += 1;
                }
                Some(id)
            }
            Err(e) => {
                self.stats.skipped_geometry += 1;
                tracing::debug!(catchment_id = id, error = %e, "skipping catchment feature");
                None
            }
        }
    }

    /// Add an already-constructed catchment.
    pub fn add_catchment(&mut self, catchment: Catchment) {
        self.stats.features_processed += 1;
        self.stats.catchments_added += 1;
        self.catchments.push(catchment);
    }

    /// Current statistics.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Finalize into an immutable store.
    pub fn finish(self) -> Result<BuildResult> {
        let store = GeometryStore::new(self.catchments)?;
        Ok(BuildResult {
            store,
            terminal_paths: self.terminal_paths,
            stats: self.stats,
        })
    }

    fn feature_id(&self, feature: &Feature) -> Option<i64> {
        let from_props = self
            .schema
            .id_keys
            .iter()
            .find_map(|key| feature.property(key).and_then(parse_identifier));
        if from_props.is_some() || !self.schema.use_feature_id {
            return from_props;
        }
        match feature.id.as_ref()? {
            geojson::feature::Id::Number(n) => number_to_identifier(n),
            geojson::feature::Id::String(s) => parse_identifier_str(s),
        }
    }
}

/// Interpret a JSON property as an integer identifier.
///
/// Accepts integers, floats with no fractional part (`1000403.0`, as written
/// by dataframe exports with nullable columns) and numeric strings.
pub fn parse_identifier(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => number_to_identifier(n),
        JsonValue::String(s) => parse_identifier_str(s),
        _ => None,
    }
}

/// String form of [`parse_identifier`]. Empty and `NA` values yield `None`.
pub fn parse_identifier_str(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("null") {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    s.parse::<f64>().ok().and_then(float_to_identifier)
}

fn number_to_identifier(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| n.as_f64().and_then(float_to_identifier))
}

fn float_to_identifier(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
