pub mod coverage;
pub mod request;
pub mod residency;
pub mod tracker;

pub use coverage::*;
pub use request::*;
pub use residency::*;
pub use tracker::*;
