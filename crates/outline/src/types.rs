use geo_types::{Coord, LineString, Polygon};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{OutlineError, Result};

/// Single-channel intensity image with values in `[0, 1]`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityField {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl IntensityField {
    /// Build a field from row-major values. Non-finite values become 0 and
    /// everything else is clamped into `[0, 1]`.
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> Result<Self> {
        if values.len() != width * height {
            return Err(OutlineError::BufferSizeMismatch {
                expected: width * height,
                actual: values.len(),
            });
        }
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 })
            .collect();
        Ok(Self { width, height, values })
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                let v = f(row, col);
                values.push(if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 });
            }
        }
        Self { width, height, values }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.width + col]
    }

    /// Smallest and largest intensity, `None` for an empty field.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.values.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Foreground/background partition of an [`IntensityField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl BinaryMask {
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                cells.push(f(row, col));
            }
        }
        Self { width, height, cells }
    }

    /// Cells strictly brighter than `threshold` are foreground.
    pub fn from_threshold(field: &IntensityField, threshold: f32) -> Self {
        Self {
            width: field.width(),
            height: field.height(),
            cells: field.values().iter().map(|&v| v > threshold).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.width + col]
    }

    /// Like [`get`](Self::get) but anything outside the image is background.
    pub fn is_foreground(&self, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        let (row, col) = (row as usize, col as usize);
        row < self.height && col < self.width && self.get(row, col)
    }

    pub fn foreground_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| !c)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c)
    }
}

/// Connected-component labels, 0 for background and `1..=count` for regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelField {
    width: usize,
    height: usize,
    labels: Vec<u32>,
    count: u32,
}

impl LabelField {
    pub(crate) fn new(width: usize, height: usize, labels: Vec<u32>, count: u32) -> Self {
        Self { width, height, labels, count }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.labels[row * self.width + col]
    }

    /// Number of distinct regions.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Binarization of the labels (`label > 0`).
    pub fn to_mask(&self) -> BinaryMask {
        BinaryMask {
            width: self.width,
            height: self.height,
            cells: self.labels.iter().map(|&l| l > 0).collect(),
        }
    }
}

/// Global cutoff chosen by a threshold selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Threshold {
    pub value: f32,
    /// Set when the image had no intensity variance to split.
    pub degenerate: bool,
}

impl Threshold {
    pub fn new(value: f32) -> Self {
        Self { value, degenerate: false }
    }

    pub fn degenerate(value: f32) -> Self {
        Self { value, degenerate: true }
    }
}

/// Sub-pixel position in image array convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GridPoint {
    pub row: f64,
    pub col: f64,
}

impl GridPoint {
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }

    /// Screen convention used by annotation hosts: `x` is the column, `y` the row.
    pub fn to_xy(self) -> [f64; 2] {
        [self.col, self.row]
    }
}

/// Closed polyline traced along a foreground/background boundary.
///
/// Closure is implicit: the last point connects back to the first, which is
/// not repeated. Outer boundaries keep the foreground on their right-hand side
/// in screen orientation, so holes wind the other way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCurve {
    pub points: Vec<GridPoint>,
}

impl BoundaryCurve {
    pub fn new(points: Vec<GridPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length of the closed polyline, including the closing segment.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                (b.row - a.row).hypot(b.col - a.col)
            })
            .sum()
    }

    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|p| Coord { x: p.col, y: p.row })
            .collect();
        Polygon::new(LineString::new(coords), vec![])
    }

    /// Shoelace area in `(x = col, y = row)` space: positive for outer
    /// boundaries, negative for holes.
    pub fn signed_area(&self) -> f64 {
        use geo::Area;
        self.to_geo_polygon().signed_area()
    }

    pub fn is_hole(&self) -> bool {
        self.signed_area() < 0.0
    }
}

/// Reduced control-point set for a closed spline, as `[x, y]` pairs
/// (`x` = column, `y` = row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SimplifiedCurve {
    pub points: Vec<[f64; 2]>,
}

impl SimplifiedCurve {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();
        Polygon::new(LineString::new(coords), vec![])
    }

    /// Area-weighted centroid as `[x, y]`, falling back to the vertex mean for
    /// collapsed polygons.
    pub fn centroid(&self) -> [f64; 2] {
        use geo::Centroid;
        if let Some(c) = self.to_geo_polygon().centroid() {
            return [c.x(), c.y()];
        }
        let n = self.points.len().max(1) as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &[x, y]| (sx + x, sy + y));
        [sx / n, sy / n]
    }

    pub fn area(&self) -> f64 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }
}

/// Per-region measurements recorded into the invocation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegionMeasurement {
    pub label: u32,
    /// Pixel count.
    pub area: usize,
    /// Diameter of the circle with the same area as the region.
    pub equivalent_diameter: f64,
    /// Mean pixel position as `[row, col]`.
    pub centroid: [f64; 2],
    /// Inclusive `[min_row, min_col, max_row, max_col]`.
    pub bbox: [usize; 4],
}

/// Everything one pipeline pass produces for a single image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedOutline {
    pub threshold: Threshold,
    pub region_count: u32,
    pub measurements: Vec<RegionMeasurement>,
    /// Simplified curves in tracing order, degenerate ones removed.
    pub curves: Vec<SimplifiedCurve>,
    /// Number of traced curves dropped as degenerate.
    pub dropped_curves: usize,
    pub image_width: usize,
    pub image_height: usize,
}

impl ComputedOutline {
    pub(crate) fn empty(threshold: Threshold, image_width: usize, image_height: usize) -> Self {
        Self {
            threshold,
            region_count: 0,
            measurements: Vec::new(),
            curves: Vec::new(),
            dropped_curves: 0,
            image_width,
            image_height,
        }
    }
}
