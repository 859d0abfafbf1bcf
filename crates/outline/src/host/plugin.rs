use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    config::OutlineConfig,
    error::Result,
    host::{build_annotation, AnnotationFactory, HostImage, SplineAnnotationFactory},
    pipeline::{builder::PipelineBuilder, Pipeline},
    types::RegionMeasurement,
};

/// Free-form invocation metadata, passed through the plugin.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key holding the per-region measurement table.
pub const MEASUREMENTS_KEY: &str = "particle_measurements";

/// Columnar `{label, area, equivalent_diameter}` table, one entry per region.
pub fn measurement_table(measurements: &[RegionMeasurement]) -> Value {
    let label: Vec<u32> = measurements.iter().map(|m| m.label).collect();
    let area: Vec<usize> = measurements.iter().map(|m| m.area).collect();
    let equivalent_diameter: Vec<f64> = measurements.iter().map(|m| m.equivalent_diameter).collect();
    json!({
        "label": label,
        "area": area,
        "equivalent_diameter": equivalent_diameter,
    })
}

/// The annotation plugin: configuration and pipeline are built once, then
/// every [`call`](Self::call) borrows them immutably.
pub struct OutlinePlugin<F: AnnotationFactory = SplineAnnotationFactory> {
    config: OutlineConfig,
    pipeline: Pipeline,
    factory: F,
}

impl OutlinePlugin<SplineAnnotationFactory> {
    /// Plugin producing serialisable [`SplineAnnotation`](crate::host::SplineAnnotation)s.
    pub fn with_json_annotations(config: OutlineConfig) -> Result<Self> {
        Self::new(config, SplineAnnotationFactory)
    }
}

impl<F: AnnotationFactory> OutlinePlugin<F> {
    /// Validate `config` and build the pipeline it describes.
    pub fn new(config: OutlineConfig, factory: F) -> Result<Self> {
        config.validate()?;
        let pipeline = PipelineBuilder::from_config(&config).build();
        debug!("Outline plugin ready: {}", pipeline.info());
        Ok(Self {
            config,
            pipeline,
            factory,
        })
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Outline the foreground of `image`.
    ///
    /// Incoming annotations are replaced by one closed spline per traced
    /// boundary. The image is returned untouched. When at least one region
    /// is found the measurement table is written under [`MEASUREMENTS_KEY`],
    /// replacing any value the caller stored there; otherwise the metadata
    /// is returned unchanged.
    pub fn call<I: HostImage>(
        &self,
        image: I,
        mut metadata: Metadata,
        annotations: Vec<F::Annotation>,
    ) -> Result<(I, Metadata, Vec<F::Annotation>)> {
        let outline = self.pipeline.process(&image)?;
        if !annotations.is_empty() {
            debug!("Discarding {} incoming annotations", annotations.len());
        }

        let annotations: Vec<F::Annotation> = outline
            .curves
            .iter()
            .map(|curve| build_annotation(&self.factory, curve))
            .collect();

        if self.config.record_measurements && outline.region_count > 0 {
            let table = measurement_table(&outline.measurements);
            if metadata.insert(MEASUREMENTS_KEY.to_string(), table).is_some() {
                debug!("Replaced existing {MEASUREMENTS_KEY} metadata entry");
            }
        }

        info!(
            "Created {} spline annotations for {}x{} image",
            annotations.len(),
            outline.image_width,
            outline.image_height
        );
        Ok((image, metadata, annotations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ThresholdMethod, host::Toolbox, OutlineError};
    use image::{GrayImage, Luma};

    fn plugin() -> OutlinePlugin {
        OutlinePlugin::with_json_annotations(OutlineConfig::default()).unwrap()
    }

    fn two_squares() -> GrayImage {
        GrayImage::from_fn(30, 20, |x, y| {
            let a = (2..8).contains(&x) && (2..8).contains(&y);
            let b = (15..25).contains(&x) && (10..15).contains(&y);
            Luma([if a || b { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_call_replaces_annotations_and_records_measurements() {
        let mut metadata = Metadata::new();
        metadata.insert("sample".to_string(), json!("slide-7"));

        let stale = vec![build_annotation(
            &SplineAnnotationFactory,
            &crate::types::SimplifiedCurve::new(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
        )];
        let (image, metadata, annotations) = plugin().call(two_squares(), metadata, stale).unwrap();

        assert_eq!(image.dimensions(), (30, 20));
        assert_eq!(annotations.len(), 2);
        assert!(annotations.iter().all(|a| a.toolbox == Toolbox::Spline && a.spline.is_closed));

        assert_eq!(metadata["sample"], "slide-7");
        let table = &metadata[MEASUREMENTS_KEY];
        assert_eq!(table["label"], json!([1, 2]));
        assert_eq!(table["area"], json!([36, 50]));
        assert_eq!(table["equivalent_diameter"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_black_image_leaves_metadata_unchanged() {
        let mut metadata = Metadata::new();
        metadata.insert("sample".to_string(), json!(1));

        let black = GrayImage::new(50, 50);
        let (_, out_metadata, annotations) = plugin().call(black, metadata.clone(), Vec::new()).unwrap();

        assert!(annotations.is_empty());
        assert_eq!(out_metadata, metadata);
    }

    #[test]
    fn test_uniform_mask_leaves_metadata_unchanged() {
        let config = OutlineConfig {
            threshold: ThresholdMethod::Fixed { value: 0.0 },
            ..OutlineConfig::default()
        };
        let plugin = OutlinePlugin::with_json_annotations(config).unwrap();
        let mut metadata = Metadata::new();
        metadata.insert("sample".to_string(), json!("bright"));

        let bright = GrayImage::from_pixel(8, 8, Luma([200u8]));
        let (_, out_metadata, annotations) = plugin.call(bright, metadata.clone(), Vec::new()).unwrap();
        assert!(annotations.is_empty());
        assert_eq!(out_metadata, metadata);
    }

    #[test]
    fn test_existing_measurements_are_replaced() {
        let mut metadata = Metadata::new();
        metadata.insert(MEASUREMENTS_KEY.to_string(), json!("stale"));
        let (_, metadata, _) = plugin().call(two_squares(), metadata, Vec::new()).unwrap();
        assert_eq!(metadata[MEASUREMENTS_KEY]["label"], json!([1, 2]));
    }

    #[test]
    fn test_measurements_can_be_disabled() {
        let config = OutlineConfig {
            record_measurements: false,
            ..OutlineConfig::default()
        };
        let plugin = OutlinePlugin::with_json_annotations(config).unwrap();
        let (_, metadata, annotations) = plugin.call(two_squares(), Metadata::new(), Vec::new()).unwrap();
        assert_eq!(annotations.len(), 2);
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = OutlineConfig {
            threshold: ThresholdMethod::Fixed { value: 2.0 },
            ..OutlineConfig::default()
        };
        assert!(matches!(
            OutlinePlugin::with_json_annotations(config),
            Err(OutlineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_measurement_table_is_columnar() {
        let table = measurement_table(&[RegionMeasurement {
            label: 1,
            area: 4,
            equivalent_diameter: 2.0,
            centroid: [0.5, 0.5],
            bbox: [0, 0, 1, 1],
        }]);
        assert_eq!(table, json!({ "label": [1], "area": [4], "equivalent_diameter": [2.0] }));
    }
}
