use tracing::warn;

use crate::error::LayerError;
use crate::layer::{LayerId, LayerKind};
use crate::raster::{ImageFormat, ImageryLayerDescriptor};

pub const DEFAULT_BASEMAP: &str = "esri";
pub const BASEMAP_MAX_ZOOM: u8 = 19;

#[derive(Debug, Clone, PartialEq)]
struct BasemapEntry {
    id: &'static str,
    descriptor: ImageryLayerDescriptor,
}

/// Fixed table of background maps, in menu order.
#[derive(Debug, Clone, PartialEq)]
pub struct BasemapRegistry {
    entries: Vec<BasemapEntry>,
    default_index: usize,
}

impl Default for BasemapRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl BasemapRegistry {
    /// Satellite imagery, OSM streets and two CartoDB vector styles.
    pub fn standard() -> Self {
        let entries = vec![
            entry(
                "esri",
                "ESRI Imagery",
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                ImageFormat::Jpeg,
                "© Esri",
                &[],
            ),
            entry(
                "osm",
                "OpenStreetMap",
                "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
                ImageFormat::Png,
                "© OpenStreetMap contributors",
                &["a", "b", "c"],
            ),
            entry(
                "light",
                "Light Map",
                "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
                ImageFormat::Png,
                "© CartoDB",
                &["a", "b", "c"],
            ),
            entry(
                "dark",
                "Dark Map",
                "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
                ImageFormat::Png,
                "© CartoDB",
                &["a", "b", "c"],
            ),
        ];
        let default_index = entries
            .iter()
            .position(|e| e.id == DEFAULT_BASEMAP)
            .unwrap_or(0);
        Self {
            entries,
            default_index,
        }
    }

    /// Makes `id` the fallback entry.
    pub fn with_default(mut self, id: &str) -> Result<Self, LayerError> {
        self.default_index = self
            .index_of(id)
            .ok_or_else(|| LayerError::UnknownBasemap(id.to_string()))?;
        Ok(self)
    }

    pub fn default_id(&self) -> &'static str {
        self.entries[self.default_index].id
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// `(id, display name)` pairs in menu order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.entries.iter().map(|e| (e.id, e.descriptor.name()))
    }

    pub fn try_lookup(&self, id: &str) -> Result<&ImageryLayerDescriptor, LayerError> {
        self.index_of(id)
            .map(|i| &self.entries[i].descriptor)
            .ok_or_else(|| LayerError::UnknownBasemap(id.to_string()))
    }

    /// Looks up a basemap that is known to exist.
    ///
    /// An unknown id is a programming error: debug builds assert, release
    /// builds fall back to the default entry.
    pub fn lookup(&self, id: &str) -> &ImageryLayerDescriptor {
        debug_assert!(self.contains(id), "unknown basemap id {id:?}");
        self.lookup_or_default(id)
    }

    /// Lookup for untrusted input; unknown ids resolve to the default.
    pub fn lookup_or_default(&self, id: &str) -> &ImageryLayerDescriptor {
        &self.entries[self.resolve_index(id)].descriptor
    }

    /// Canonical id for `id`, or the default id when unknown.
    pub fn resolve_id(&self, id: &str) -> &'static str {
        self.entries[self.resolve_index(id)].id
    }

    fn resolve_index(&self, id: &str) -> usize {
        match self.index_of(id) {
            Some(i) => i,
            None => {
                warn!(
                    basemap = id,
                    fallback = self.entries[self.default_index].id,
                    "unknown basemap, using default"
                );
                self.default_index
            }
        }
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        let id = id.trim();
        self.entries
            .iter()
            .position(|e| e.id.eq_ignore_ascii_case(id))
    }
}

fn entry(
    id: &'static str,
    name: &str,
    template: &str,
    format: ImageFormat,
    attribution: &str,
    subdomains: &[&str],
) -> BasemapEntry {
    let descriptor = ImageryLayerDescriptor::new(
        LayerId::new(format!("basemap:{id}")),
        LayerKind::Basemap,
        template,
        format,
    )
    .with_name(name)
    .with_zoom_range(0, BASEMAP_MAX_ZOOM)
    .with_attribution(attribution)
    .with_subdomains(subdomains);
    BasemapEntry { id, descriptor }
}
