use serde::{Deserialize, Serialize};

/// Center and zoom of one map surface.
///
/// The core stores whatever it is given; zoom clamping is the render path's
/// job (tiles over-zoom past a layer's `max_zoom`).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub zoom_level: f64,
}

impl ViewState {
    pub const fn new(center_latitude: f64, center_longitude: f64, zoom_level: f64) -> Self {
        Self {
            center_latitude,
            center_longitude,
            zoom_level,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.center_latitude.is_finite()
            && self.center_longitude.is_finite()
            && self.zoom_level.is_finite()
    }

    pub fn with_zoom(self, zoom_level: f64) -> Self {
        Self { zoom_level, ..self }
    }

    pub fn with_center(self, center_latitude: f64, center_longitude: f64) -> Self {
        Self {
            center_latitude,
            center_longitude,
            ..self
        }
    }
}

impl Default for ViewState {
    /// West Africa at regional zoom.
    fn default() -> Self {
        Self::new(4.5, 8.5, 6.0)
    }
}
