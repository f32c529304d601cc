use foundation::bounds::GeoBounds;
use foundation::math::mercator::{TILE_SIZE, unproject};

/// Tile address in an XYZ pyramid (`y` grows southward).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub const fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Tiles per axis at this zoom.
    pub fn axis_count(z: u8) -> u32 {
        1u32 << z.min(31)
    }

    /// Geographic extent of the tile.
    pub fn bounds(&self) -> GeoBounds {
        let z = f64::from(self.z);
        let (north, west) = unproject(
            [f64::from(self.x) * TILE_SIZE, f64::from(self.y) * TILE_SIZE],
            z,
        );
        let (south, east) = unproject(
            [f64::from(self.x + 1) * TILE_SIZE, f64::from(self.y + 1) * TILE_SIZE],
            z,
        );
        GeoBounds::new(south, west, north, east)
    }
}

/// One tile a surface has to fetch for a given layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileRequest<K> {
    pub layer: K,
    pub coord: TileCoord,
    pub url: String,
}
