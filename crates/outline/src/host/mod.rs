//! Adapters between the pipeline and the application hosting it: reading the
//! host's image, building its annotations, and the plugin entry point.

pub mod annotation;
pub mod pixels;
pub mod plugin;

pub use annotation::*;
pub use pixels::*;
pub use plugin::*;
