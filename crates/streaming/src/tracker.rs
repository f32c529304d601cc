use std::collections::{BTreeMap, BTreeSet};

use crate::request::TileCoord;
use crate::residency::TileLoadState;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileKey<K> {
    pub layer: K,
    pub coord: TileCoord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    UnknownTile,
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerError::UnknownTile => write!(f, "tile was never requested"),
        }
    }
}

impl std::error::Error for TrackerError {}

/// Per-surface bookkeeping of requested tiles and their outcomes.
///
/// Notes on determinism:
/// - Entries live in a `BTreeMap`, so iteration is ordered by layer then
///   coordinate.
/// - A failed tile is not re-requested while it stays tracked; it keeps
///   showing the fallback. Once evicted by [`TileTracker::retain_only`] a
///   later request starts it fresh.
#[derive(Debug)]
pub struct TileTracker<K> {
    entries: BTreeMap<TileKey<K>, TileLoadState>,
}

impl<K: Ord + Clone> Default for TileTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> TileTracker<K> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self, layer: &K, coord: TileCoord) -> Option<TileLoadState> {
        self.entries.get(&key(layer, coord)).copied()
    }

    /// Records a request; returns `true` if the tile was not tracked yet.
    pub fn request(&mut self, layer: &K, coord: TileCoord) -> bool {
        let k = key(layer, coord);
        if self.entries.contains_key(&k) {
            return false;
        }
        self.entries.insert(k, TileLoadState::Requested);
        true
    }

    pub fn mark_loaded(&mut self, layer: &K, coord: TileCoord) -> Result<(), TrackerError> {
        let state = self
            .entries
            .get_mut(&key(layer, coord))
            .ok_or(TrackerError::UnknownTile)?;
        *state = TileLoadState::Loaded;
        Ok(())
    }

    /// Marks a tile failed; `Ok(true)` only for the first failure of that
    /// request so callers notify once per failing tile.
    pub fn mark_failed(&mut self, layer: &K, coord: TileCoord) -> Result<bool, TrackerError> {
        let state = self
            .entries
            .get_mut(&key(layer, coord))
            .ok_or(TrackerError::UnknownTile)?;
        if *state == TileLoadState::Failed {
            return Ok(false);
        }
        *state = TileLoadState::Failed;
        Ok(true)
    }

    pub fn count(&self, state: TileLoadState) -> usize {
        self.entries.values().filter(|s| **s == state).count()
    }

    pub fn in_flight(&self) -> usize {
        self.entries.values().filter(|s| !s.is_settled()).count()
    }

    /// Drops every tile of `layer` (layer detached or replaced).
    pub fn forget_layer(&mut self, layer: &K) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| &k.layer != layer);
        before - self.entries.len()
    }

    /// Evicts tiles of `layer` that are not in `keep` (the layer's current
    /// coverage). Returns how many were dropped.
    pub fn retain_only(&mut self, layer: &K, keep: &[TileCoord]) -> usize {
        let keep: BTreeSet<TileCoord> = keep.iter().copied().collect();
        let before = self.entries.len();
        self.entries
            .retain(|k, _| &k.layer != layer || keep.contains(&k.coord));
        before - self.entries.len()
    }

    /// Drops everything, including in-flight requests whose outcomes will
    /// then be rejected as unknown.
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }
}

fn key<K: Clone>(layer: &K, coord: TileCoord) -> TileKey<K> {
    TileKey {
        layer: layer.clone(),
        coord,
    }
}
