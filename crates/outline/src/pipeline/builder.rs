use crate::{
    pipeline::Pipeline,
    traits::{BoundaryExtractor, CurveSimplifier, RegionLabeler, ThresholdSelector},
    config::{Connectivity, OutlineConfig, ThresholdMethod},
    algorithms::{
        ArcLengthSimplifier,
        FixedThresholdSelector,
        IntensityNormalizer,
        MarchingSquaresExtractor,
        OtsuThresholdSelector,
        ComponentLabeler,
    },
};

/// Builder for creating processing pipelines with a fluent API
///
/// Unset stages fall back to Otsu thresholding, connected-component labelling and
/// marching squares at the builder's connectivity, and arc-length
/// simplification at the builder's ratio.
pub struct PipelineBuilder {
    channel: usize,
    connectivity: Connectivity,
    simplification_ratio: f64,
    record_measurements: bool,
    threshold_selector: Option<Box<dyn ThresholdSelector>>,
    labeler: Option<Box<dyn RegionLabeler>>,
    extractor: Option<Box<dyn BoundaryExtractor>>,
    simplifier: Option<Box<dyn CurveSimplifier>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        let defaults = OutlineConfig::default();
        Self {
            channel: defaults.channel,
            connectivity: defaults.connectivity,
            simplification_ratio: defaults.simplification_ratio,
            record_measurements: defaults.record_measurements,
            threshold_selector: None,
            labeler: None,
            extractor: None,
            simplifier: None,
        }
    }

    /// Start from a configuration. The configuration is not validated here.
    pub fn from_config(config: &OutlineConfig) -> Self {
        let builder = Self::new()
            .with_channel(config.channel)
            .with_connectivity(config.connectivity)
            .with_simplification(config.simplification_ratio)
            .with_measurements(config.record_measurements);

        match config.threshold {
            ThresholdMethod::Otsu => builder,
            ThresholdMethod::Fixed { value } => builder.with_fixed_threshold(value),
        }
    }

    /// Channel read from multi-channel images
    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = channel;
        self
    }

    /// Connectivity used by the default labeller and extractor
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Fraction of boundary points kept by the default simplifier
    pub fn with_simplification(mut self, ratio: f64) -> Self {
        self.simplification_ratio = ratio;
        self
    }

    /// Record per-region measurements alongside the outlines
    pub fn with_measurements(mut self, enabled: bool) -> Self {
        self.record_measurements = enabled;
        self
    }

    /// Use a fixed cutoff instead of Otsu's method
    pub fn with_fixed_threshold(self, value: f32) -> Self {
        self.set_threshold_selector(FixedThresholdSelector { value })
    }

    /// Set the threshold selector (replaces any existing one)
    pub fn set_threshold_selector<T>(mut self, selector: T) -> Self
    where
        T: ThresholdSelector + 'static,
    {
        self.threshold_selector = Some(Box::new(selector));
        self
    }

    /// Set the region labeller (replaces any existing one)
    pub fn set_region_labeler<L>(mut self, labeler: L) -> Self
    where
        L: RegionLabeler + 'static,
    {
        self.labeler = Some(Box::new(labeler));
        self
    }

    /// Set the boundary extractor (replaces any existing one)
    pub fn set_boundary_extractor<E>(mut self, extractor: E) -> Self
    where
        E: BoundaryExtractor + 'static,
    {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Set the curve simplifier (replaces any existing one)
    pub fn set_curve_simplifier<S>(mut self, simplifier: S) -> Self
    where
        S: CurveSimplifier + 'static,
    {
        self.simplifier = Some(Box::new(simplifier));
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let threshold_selector = self
            .threshold_selector
            .unwrap_or_else(|| Box::new(OtsuThresholdSelector::default()));

        let labeler = self
            .labeler
            .unwrap_or_else(|| Box::new(ComponentLabeler::new(self.connectivity)));

        let extractor = self
            .extractor
            .unwrap_or_else(|| Box::new(MarchingSquaresExtractor::new(self.connectivity)));

        let simplifier = self
            .simplifier
            .unwrap_or_else(|| Box::new(ArcLengthSimplifier::new(self.simplification_ratio)));

        Pipeline::new(
            IntensityNormalizer::new(self.channel),
            threshold_selector,
            labeler,
            extractor,
            simplifier,
            self.record_measurements,
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_from_config_applies_fixed_threshold() {
        let config = OutlineConfig {
            threshold: ThresholdMethod::Fixed { value: 0.25 },
            ..OutlineConfig::default()
        };
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 0 } else { 100 }]));
        let result = PipelineBuilder::from_config(&config).build().process(&img).unwrap();
        assert_eq!(result.threshold.value, 0.25);
        assert_eq!(result.region_count, 1);
    }

    #[test]
    fn test_from_config_disables_measurements() {
        let config = OutlineConfig {
            record_measurements: false,
            ..OutlineConfig::default()
        };
        let img = GrayImage::from_fn(10, 10, |x, y| {
            Luma([if (3..7).contains(&x) && (3..7).contains(&y) { 255 } else { 0 }])
        });
        let result = PipelineBuilder::from_config(&config).build().process(&img).unwrap();
        assert_eq!(result.region_count, 1);
        assert!(result.measurements.is_empty());
    }

    #[test]
    fn test_channel_selection() {
        // Red channel carries a square, green is uniform.
        let img = image::RgbImage::from_fn(12, 12, |x, y| {
            let inside = (4..8).contains(&x) && (4..8).contains(&y);
            image::Rgb([if inside { 255 } else { 0 }, 128, 0])
        });
        let img = image::DynamicImage::ImageRgb8(img);

        let red = Pipeline::builder().with_channel(0).build().process(&img).unwrap();
        assert_eq!(red.region_count, 1);

        let green = Pipeline::builder().with_channel(1).build().process(&img).unwrap();
        assert!(green.threshold.degenerate);
        assert!(green.curves.is_empty());
    }

    #[test]
    fn test_out_of_range_channel_is_fatal() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 4));
        assert!(Pipeline::builder().with_channel(3).build().process(&img).is_err());
    }
}
