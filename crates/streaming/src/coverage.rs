use std::collections::BTreeSet;

use foundation::math::mercator::{TILE_SIZE, project};
use foundation::view::ViewState;

use crate::request::TileCoord;

/// Zoom at which a layer's tiles are fetched for a view: the rounded view
/// zoom clamped into the layer's range (tiles over-zoom past `max_zoom`).
pub fn tile_zoom(view_zoom: f64, min_zoom: u8, max_zoom: u8) -> u8 {
    view_zoom
        .round()
        .clamp(f64::from(min_zoom), f64::from(max_zoom.max(min_zoom))) as u8
}

/// Tiles of a layer needed to cover a `size_px` surface showing `view`.
///
/// Returns nothing for degenerate surfaces, non-finite views, or views
/// zoomed out past the layer's `min_zoom`. Columns wrap around the
/// antimeridian; rows outside the pyramid are skipped. Output is sorted and
/// free of duplicates.
pub fn covering_tiles(
    view: &ViewState,
    size_px: [f64; 2],
    tile_size: u32,
    min_zoom: u8,
    max_zoom: u8,
) -> Vec<TileCoord> {
    let [w, h] = size_px;
    if !view.is_finite() || !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Vec::new();
    }
    if view.zoom_level < f64::from(min_zoom) - 0.5 {
        return Vec::new();
    }

    let z = tile_zoom(view.zoom_level, min_zoom, max_zoom);
    let scale = 2f64.powf(view.zoom_level - f64::from(z));
    let ts = f64::from(tile_size.max(1));
    let factor = ts / TILE_SIZE;

    let center = project(view.center_latitude, view.center_longitude, f64::from(z));
    let (cx, cy) = (center[0] * factor, center[1] * factor);
    let half_w = w / (2.0 * scale);
    let half_h = h / (2.0 * scale);

    let n = i64::from(TileCoord::axis_count(z));
    let min_tx = ((cx - half_w) / ts).floor() as i64;
    let max_tx = (((cx + half_w) / ts).ceil() as i64 - 1).min(min_tx + n - 1);
    let min_ty = (((cy - half_h) / ts).floor() as i64).max(0);
    let max_ty = (((cy + half_h) / ts).ceil() as i64 - 1).min(n - 1);

    let mut out = BTreeSet::new();
    for y in min_ty..=max_ty {
        for x in min_tx..=max_tx {
            out.insert(TileCoord::new(z, x.rem_euclid(n) as u32, y as u32));
        }
    }
    out.into_iter().collect()
}
