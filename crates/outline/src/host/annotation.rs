use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::types::SimplifiedCurve;

/// Annotation tool an outline is handed to in the host application.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Toolbox {
    Spline,
}

/// Host-side constructors for annotation objects.
///
/// The pipeline never builds host objects itself; it only calls into this
/// factory, so any annotation model can sit behind it.
pub trait AnnotationFactory: Send + Sync {
    type Point;
    type Spline;
    type Annotation;

    fn create_xypoint(&self, x: f64, y: f64) -> Self::Point;
    fn create_spline(&self, points: Vec<Self::Point>, is_closed: bool) -> Self::Spline;
    fn create_annotation(&self, toolbox: Toolbox, spline: Self::Spline) -> Self::Annotation;
}

/// Turn a simplified curve into a closed spline annotation.
pub fn build_annotation<F>(factory: &F, curve: &SimplifiedCurve) -> F::Annotation
where
    F: AnnotationFactory + ?Sized,
{
    let points = curve
        .points
        .iter()
        .map(|&[x, y]| factory.create_xypoint(x, y))
        .collect();
    let spline = factory.create_spline(points, true);
    factory.create_annotation(Toolbox::Spline, spline)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct XyPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Spline {
    pub coordinates: Vec<XyPoint>,
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SplineAnnotation {
    pub toolbox: Toolbox,
    pub spline: Spline,
}

/// Factory producing plain serialisable annotations, for hosts that consume
/// JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplineAnnotationFactory;

impl AnnotationFactory for SplineAnnotationFactory {
    type Point = XyPoint;
    type Spline = Spline;
    type Annotation = SplineAnnotation;

    fn create_xypoint(&self, x: f64, y: f64) -> XyPoint {
        XyPoint { x, y }
    }

    fn create_spline(&self, points: Vec<XyPoint>, is_closed: bool) -> Spline {
        Spline {
            coordinates: points,
            is_closed,
        }
    }

    fn create_annotation(&self, toolbox: Toolbox, spline: Spline) -> SplineAnnotation {
        SplineAnnotation { toolbox, spline }
    }
}
