//! Query configuration.
//!
//! Configuration can be built in code or loaded from YAML. Every field has a
//! default, so a file only needs to name what it changes:
//!
//! ```yaml
//! zoom: 14
//! dataset: dem_png
//! ```

use crate::decode::{DemEncoding, DEFAULT_RESOLUTION};
use crate::fetch::{TileDataset, TileUrlTemplate, DEFAULT_URL_TEMPLATE};
use crate::projection::MAX_ZOOM;
use crate::{DemError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default zoom level, the native resolution of the 5 m DEM.
pub const DEFAULT_ZOOM: u8 = 15;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for elevation queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Zoom level at which tiles are fetched.
    pub zoom: u8,
    /// Dataset identifier substituted into the URL template.
    pub dataset: String,
    /// Tile file extension.
    pub extension: String,
    /// URL template with `{dataset}`, `{z}`, `{x}`, `{y}` and `{ext}` placeholders.
    pub url_template: String,
    /// Meters per encoded unit.
    pub resolution: f64,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with tile requests.
    pub user_agent: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        let dataset = TileDataset::default();
        Self {
            zoom: DEFAULT_ZOOM,
            dataset: dataset.id,
            extension: dataset.extension,
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            resolution: DEFAULT_RESOLUTION,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("demtile/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl QueryConfig {
    /// Parse a configuration from YAML and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| DemError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.zoom > MAX_ZOOM {
            return Err(DemError::InvalidZoomLevel(self.zoom));
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(DemError::Config(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        if self.dataset.is_empty() {
            return Err(DemError::Config("dataset must not be empty".to_string()));
        }
        if self.extension.is_empty() {
            return Err(DemError::Config("extension must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(DemError::Config("timeout_secs must be at least 1".to_string()));
        }
        TileUrlTemplate::new(&self.url_template)?;
        Ok(())
    }

    /// Dataset selected by this configuration.
    pub fn tile_dataset(&self) -> TileDataset {
        TileDataset::new(&self.dataset, &self.extension)
    }

    /// Encoding selected by this configuration.
    pub fn encoding(&self) -> DemEncoding {
        DemEncoding::new(self.resolution)
    }
}
