//! Spherical (web) mercator in world-pixel space.
//!
//! World pixel space at zoom `z` is a square of `TILE_SIZE * 2^z` pixels with
//! the origin at the north-west corner (lat ≈ 85.05, lon = -180).

/// Square tile edge in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude where the mercator square ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Projects degrees to world pixels at `zoom`.
pub fn project(lat_deg: f64, lon_deg: f64, zoom: f64) -> [f64; 2] {
    let size = world_size(zoom);
    let lat = lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let sin = lat.to_radians().sin();
    let x = (lon_deg + 180.0) / 360.0 * size;
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * std::f64::consts::PI)) * size;
    [x, y]
}

/// Inverse of [`project`]. Returns `(lat_deg, lon_deg)`.
pub fn unproject(px: [f64; 2], zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lon = px[0] / size * 360.0 - 180.0;
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * px[1] / size;
    let lat = n.sinh().atan().to_degrees();
    (lat, lon)
}

/// Wraps a longitude into [-180, 180).
pub fn wrap_longitude(lon_deg: f64) -> f64 {
    (lon_deg + 180.0).rem_euclid(360.0) - 180.0
}
