pub mod preprocessing;
pub mod threshold;
pub mod labeling;
pub mod extraction;
pub mod simplification;

pub use preprocessing::*;
pub use threshold::*;
pub use labeling::*;
pub use extraction::*;
pub use simplification::*;
