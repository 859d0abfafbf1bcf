//! # Outline Extraction Library
//!
//! Turns a greyscale image into closed, editable spline outlines of its
//! foreground regions, ready for manual refinement in an annotation tool.
//!
//! ## Core Features
//!
//! - **Trait-based Architecture**: every stage (threshold, labelling, tracing,
//!   simplification) sits behind a trait and can be swapped
//! - **Otsu Thresholding**: automatic global cutoff from the intensity histogram
//! - **Topology-aware Tracing**: marching squares yields one loop per outer
//!   boundary and per hole, with labelling and tracing sharing one connectivity
//! - **Arc-length Simplification**: few, evenly spread control points per outline
//! - **Host Adapters**: plugin entry point over host images and annotation factories
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use outline::{Metadata, OutlineConfig, OutlinePlugin};
//!
//! let plugin = OutlinePlugin::with_json_annotations(OutlineConfig::default())?;
//! let image = image::open("cells.png")?;
//! let (_image, metadata, annotations) = plugin.call(image, Metadata::new(), Vec::new())?;
//! println!("{} outlines, {} metadata keys", annotations.len(), metadata.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use outline::{Connectivity, Pipeline, algorithms::*};
//!
//! let pipeline = Pipeline::builder()
//!     .set_threshold_selector(FixedThresholdSelector { value: 0.3 })
//!     .with_connectivity(Connectivity::Four)
//!     .with_simplification(0.1)
//!     .build();
//! let result = pipeline.process(&image::open("cells.png")?)?;
//! println!("{} regions", result.region_count);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod host;

// Re-exports for convenience
pub use error::{OutlineError, Result};
pub use types::{
    BinaryMask, BoundaryCurve, ComputedOutline, GridPoint, IntensityField, LabelField,
    RegionMeasurement, SimplifiedCurve, Threshold,
};
pub use config::{Connectivity, OutlineConfig, ThresholdMethod};
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use host::{
    AnnotationFactory, HostImage, Metadata, OutlinePlugin, PixelBuffer, Samples, Spline,
    SplineAnnotation, SplineAnnotationFactory, Toolbox, XyPoint, MEASUREMENTS_KEY,
};
