#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    UnknownBasemap(String),
    UnknownImagery(String),
}

impl std::fmt::Display for LayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerError::UnknownBasemap(id) => write!(f, "unknown basemap id: {id:?}"),
            LayerError::UnknownImagery(id) => write!(f, "unknown imagery type: {id:?}"),
        }
    }
}

impl std::error::Error for LayerError {}
