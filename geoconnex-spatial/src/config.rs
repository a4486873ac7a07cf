//! Catchment source configuration.
//!
//! Describes which GeoJSON feature properties carry the catchment id and,
//! for the joined catchments+flowlines reference file, the routed level path.

use serde::{Deserialize, Serialize};

/// Property names read from each catchment feature.
///
/// Keys are tried in order; the first present, non-null value wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Properties holding the catchment feature id.
    /// Default: `Catchment_featureid`, `featureid`
    pub id_keys: Vec<String>,

    /// Properties holding the flowline level path (terminal path) id.
    /// Default: `Flowline_LevelPathI`, `LevelPathI`
    pub terminal_path_keys: Vec<String>,

    /// Fall back to the GeoJSON feature `id` member when no id property is set.
    pub use_feature_id: bool,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self {
            id_keys: vec!["Catchment_featureid".into(), "featureid".into()],
            terminal_path_keys: vec!["Flowline_LevelPathI".into(), "LevelPathI".into()],
            use_feature_id: true,
        }
    }
}

impl FeatureSchema {
    /// Replace the id property names.
    pub fn with_id_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the terminal path property names.
    pub fn with_terminal_path_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminal_path_keys = keys.into_iter().map(Into::into).collect();
        self
    }
}
