use std::fmt;

/// Stable layer identity, e.g. `basemap:osm` or `modis@2024-03-15`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which slot of a viewport a layer occupies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    /// Background reference map; at most one per viewport.
    Basemap,
    /// Dated imagery drawn above the basemap; at most one per viewport.
    Imagery,
}

pub trait Layer {
    fn id(&self) -> &LayerId;
    fn kind(&self) -> LayerKind;
}
