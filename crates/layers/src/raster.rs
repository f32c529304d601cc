use bytes::Bytes;
use foundation::bounds::GeoBounds;
use streaming::TileCoord;

use crate::fallback::error_tile_png;
use crate::layer::{Layer, LayerId, LayerKind};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    /// File extension used in tile paths (the mime subtype).
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }
}

/// Immutable description of one tiled raster source.
///
/// `url_template` is fully resolved except for the per-tile placeholders
/// `{z}`, `{x}`, `{y}` and, for sharded hosts, `{s}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageryLayerDescriptor {
    id: LayerId,
    kind: LayerKind,
    name: String,
    url_template: String,
    format: ImageFormat,
    min_zoom: u8,
    max_zoom: u8,
    tile_size: u32,
    bounds: GeoBounds,
    attribution: String,
    subdomains: Vec<String>,
    error_fallback: Bytes,
}

impl ImageryLayerDescriptor {
    pub fn new(
        id: LayerId,
        kind: LayerKind,
        url_template: impl Into<String>,
        format: ImageFormat,
    ) -> Self {
        Self {
            name: id.to_string(),
            id,
            kind,
            url_template: url_template.into(),
            format,
            min_zoom: 0,
            max_zoom: 18,
            tile_size: 256,
            bounds: GeoBounds::WORLD,
            attribution: String::new(),
            subdomains: Vec::new(),
            error_fallback: error_tile_png(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom.min(max_zoom);
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }

    pub fn with_bounds(mut self, bounds: GeoBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = attribution.into();
        self
    }

    pub fn with_subdomains(mut self, subdomains: &[&str]) -> Self {
        self.subdomains = subdomains.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_error_fallback(mut self, image: Bytes) -> Self {
        self.error_fallback = image;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    pub fn attribution(&self) -> &str {
        &self.attribution
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    pub fn error_fallback(&self) -> &Bytes {
        &self.error_fallback
    }

    /// Resolves the per-tile placeholders for `coord`.
    ///
    /// Subdomains rotate by `(x + y) % n` so neighbouring tiles spread over
    /// hosts deterministically.
    pub fn tile_url(&self, coord: TileCoord) -> String {
        let mut url = self
            .url_template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());
        if url.contains("{s}") {
            let sub = if self.subdomains.is_empty() {
                ""
            } else {
                let idx = (coord.x as usize + coord.y as usize) % self.subdomains.len();
                self.subdomains[idx].as_str()
            };
            url = url.replace("{s}", sub);
        }
        url
    }
}

impl Layer for ImageryLayerDescriptor {
    fn id(&self) -> &LayerId {
        &self.id
    }

    fn kind(&self) -> LayerKind {
        self.kind
    }
}
