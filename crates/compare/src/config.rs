use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use foundation::view::ViewState;
use layers::{
    BasemapRegistry, DEFAULT_BASEMAP, GIBS_ENDPOINT, GIBS_MATRIX_SET, GIBS_MAX_ZOOM,
    TileLayerFactory,
};
use tracing::warn;

use crate::error::ConfigError;
use crate::slider::DEFAULT_SLIDER_POSITION;

/// Viewer settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub gibs_endpoint: String,
    pub matrix_set: String,
    pub imagery_max_zoom: u8,
    pub basemap: String,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub zoom: f64,
    pub slider_position: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let view = ViewState::default();
        Self {
            gibs_endpoint: GIBS_ENDPOINT.to_string(),
            matrix_set: GIBS_MATRIX_SET.to_string(),
            imagery_max_zoom: GIBS_MAX_ZOOM,
            basemap: DEFAULT_BASEMAP.to_string(),
            center_latitude: view.center_latitude,
            center_longitude: view.center_longitude,
            zoom: view.zoom_level,
            slider_position: DEFAULT_SLIDER_POSITION,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Applies `COMPARE_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup`; values that do not parse are
    /// ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("COMPARE_GIBS_ENDPOINT") {
            self.gibs_endpoint = v;
        }
        if let Some(v) = lookup("COMPARE_MATRIX_SET") {
            self.matrix_set = v;
        }
        if let Some(v) = lookup("COMPARE_BASEMAP") {
            self.basemap = v;
        }
        self.center_latitude = var_f64(&lookup, "COMPARE_CENTER_LAT", self.center_latitude);
        self.center_longitude = var_f64(&lookup, "COMPARE_CENTER_LON", self.center_longitude);
        self.zoom = var_f64(&lookup, "COMPARE_ZOOM", self.zoom);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gibs_endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("gibs_endpoint is empty".to_string()));
        }
        if self.matrix_set.trim().is_empty() {
            return Err(ConfigError::Invalid("matrix_set is empty".to_string()));
        }
        if !self.default_view().is_finite() {
            return Err(ConfigError::Invalid("default view is not finite".to_string()));
        }
        if !(-90.0..=90.0).contains(&self.center_latitude) {
            return Err(ConfigError::Invalid(format!(
                "center_latitude {} outside -90..=90",
                self.center_latitude
            )));
        }
        if !(0.0..=100.0).contains(&self.slider_position) {
            return Err(ConfigError::Invalid(format!(
                "slider_position {} outside 0..=100",
                self.slider_position
            )));
        }
        Ok(())
    }

    pub fn default_view(&self) -> ViewState {
        ViewState::new(self.center_latitude, self.center_longitude, self.zoom)
    }

    pub fn tile_factory(&self) -> TileLayerFactory {
        TileLayerFactory::new(self.gibs_endpoint.as_str(), self.matrix_set.as_str())
            .with_max_zoom(self.imagery_max_zoom)
    }

    /// Standard basemaps with the configured default; an unknown id keeps
    /// the built-in default.
    pub fn basemaps(&self) -> BasemapRegistry {
        match BasemapRegistry::standard().with_default(&self.basemap) {
            Ok(registry) => registry,
            Err(e) => {
                warn!(error = %e, "configured basemap ignored");
                BasemapRegistry::standard()
            }
        }
    }
}

fn var_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
