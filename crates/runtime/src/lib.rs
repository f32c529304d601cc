pub mod event_bus;
pub mod metrics;
pub mod scope;

pub use event_bus::*;
pub use metrics::*;
pub use scope::*;
