pub mod builder;

use tracing::{debug, info, warn};

use crate::{
    algorithms::{measure_regions, IntensityNormalizer},
    error::{OutlineError, Result},
    host::HostImage,
    traits::{BoundaryExtractor, CurveSimplifier, RegionLabeler, ThresholdSelector},
    types::{BinaryMask, ComputedOutline, IntensityField},
};

/// The segmentation-to-curve pipeline: normalise, threshold, label, trace,
/// simplify. Each stage consumes the previous stage's complete output.
pub struct Pipeline {
    normalizer: IntensityNormalizer,
    threshold_selector: Box<dyn ThresholdSelector>,
    labeler: Box<dyn RegionLabeler>,
    extractor: Box<dyn BoundaryExtractor>,
    simplifier: Box<dyn CurveSimplifier>,
    record_measurements: bool,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        normalizer: IntensityNormalizer,
        threshold_selector: Box<dyn ThresholdSelector>,
        labeler: Box<dyn RegionLabeler>,
        extractor: Box<dyn BoundaryExtractor>,
        simplifier: Box<dyn CurveSimplifier>,
        record_measurements: bool,
    ) -> Self {
        Self {
            normalizer,
            threshold_selector,
            labeler,
            extractor,
            simplifier,
            record_measurements,
        }
    }

    /// Run the whole pipeline on a host image.
    ///
    /// Fails only on structurally invalid input; degenerate thresholds and
    /// curves are absorbed into an empty or reduced result.
    pub fn process<I: HostImage + ?Sized>(&self, image: &I) -> Result<ComputedOutline> {
        let buffer = image.pixel_buffer()?;
        let field = self.normalizer.normalize(&buffer)?;
        debug!(
            "Normalized {}x{} image from buffer of shape {:?}",
            field.width(),
            field.height(),
            buffer.shape()
        );
        self.process_field(&field)
    }

    /// Run every stage after normalisation.
    pub fn process_field(&self, field: &IntensityField) -> Result<ComputedOutline> {
        let threshold = self.threshold_selector.select(field);
        if threshold.degenerate {
            let err = OutlineError::DegenerateThreshold { value: threshold.value };
            warn!("{err}; no regions found");
            return Ok(ComputedOutline::empty(threshold, field.width(), field.height()));
        }
        debug!("Selected threshold {:.4}", threshold.value);

        let mask = BinaryMask::from_threshold(field, threshold.value);
        if mask.is_empty() || mask.is_full() {
            let side = if mask.is_full() { "foreground" } else { "background" };
            debug!("Mask is entirely {side}, no regions found");
            return Ok(ComputedOutline::empty(threshold, field.width(), field.height()));
        }

        let labels = self.labeler.label(&mask);
        debug!(
            "Labelled {} regions covering {} foreground pixels",
            labels.count(),
            mask.foreground_count()
        );
        let measurements = if self.record_measurements {
            measure_regions(&labels)
        } else {
            Vec::new()
        };

        let boundaries = self.extractor.extract(&mask);
        let mut curves = Vec::with_capacity(boundaries.len());
        let mut dropped_curves = 0;
        for (index, boundary) in boundaries.iter().enumerate() {
            match self.simplifier.simplify(boundary) {
                Ok(curve) => curves.push(curve),
                Err(err) if err.is_recoverable() => {
                    warn!(curve = index, "Dropping boundary curve: {err}");
                    dropped_curves += 1;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            "Extracted {} outlines from {} regions ({} dropped)",
            curves.len(),
            labels.count(),
            dropped_curves
        );

        Ok(ComputedOutline {
            threshold,
            region_count: labels.count(),
            measurements,
            curves,
            dropped_curves,
            image_width: field.width(),
            image_height: field.height(),
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: channel {}, measurements {}",
            self.normalizer.channel,
            if self.record_measurements { "on" } else { "off" }
        )
    }
}
