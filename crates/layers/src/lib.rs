pub mod basemap;
pub mod error;
pub mod fallback;
pub mod imagery;
pub mod layer;
pub mod raster;

pub use basemap::*;
pub use error::*;
pub use imagery::*;
pub use layer::*;
pub use raster::*;
