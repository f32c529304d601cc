/// Load lifecycle of a single requested tile.
///
/// Requested → Loaded | Failed. A failed tile shows its layer's fallback
/// image; there are no retries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TileLoadState {
    Requested,
    Loaded,
    Failed,
}

impl TileLoadState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, TileLoadState::Requested)
    }

    pub fn shows_fallback(&self) -> bool {
        matches!(self, TileLoadState::Failed)
    }
}
