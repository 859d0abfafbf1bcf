use crate::{
    error::Result,
    types::{BinaryMask, BoundaryCurve, IntensityField, LabelField, SimplifiedCurve, Threshold},
};

/// Trait for global threshold selection algorithms
pub trait ThresholdSelector: Send + Sync {
    /// Choose the foreground cutoff for the given field. Never fails: a field
    /// without variance yields a [`Threshold`] flagged as degenerate.
    fn select(&self, field: &IntensityField) -> Threshold;
}

/// Trait for connected-component labelling algorithms
pub trait RegionLabeler: Send + Sync {
    /// Partition the foreground of `mask` into labelled regions
    fn label(&self, mask: &BinaryMask) -> LabelField;
}

/// Trait for boundary extraction algorithms
pub trait BoundaryExtractor: Send + Sync {
    /// Trace every closed foreground/background boundary in `mask`
    fn extract(&self, mask: &BinaryMask) -> Vec<BoundaryCurve>;
}

/// Trait for curve simplification algorithms
pub trait CurveSimplifier: Send + Sync {
    /// Reduce the curve to a small control-point set.
    ///
    /// Returns [`OutlineError::DegenerateCurve`](crate::OutlineError::DegenerateCurve)
    /// when the curve cannot form a closed outline.
    fn simplify(&self, curve: &BoundaryCurve) -> Result<SimplifiedCurve>;
}
