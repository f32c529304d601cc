//! Synchronized split-view comparison of dated imagery.
//!
//! A [`ComparisonView`] owns either one map viewport or a before/after pair
//! kept in lockstep by a [`ViewSyncCoordinator`], plus the slider that
//! splits the container between the two panes.

pub mod comparison;
pub mod config;
pub mod error;
pub mod notify;
pub mod registry;
pub mod selection;
pub mod slider;
pub mod surface;
pub mod sync;
pub mod viewport;

pub use comparison::*;
pub use config::*;
pub use error::*;
pub use notify::*;
pub use registry::*;
pub use selection::*;
pub use slider::*;
pub use surface::*;
pub use sync::*;
pub use viewport::*;
