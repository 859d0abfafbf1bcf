use crate::{
    error::{OutlineError, Result},
    traits::CurveSimplifier,
    types::{BoundaryCurve, GridPoint, SimplifiedCurve},
};

/// Smallest control-point count that still describes a closed outline.
pub const MIN_CURVE_POINTS: usize = 3;

/// Number of points kept when simplifying a curve of `points` points at
/// `ratio`: `max(3, round(points × ratio))`.
pub fn target_len(points: usize, ratio: f64) -> usize {
    ((points as f64 * ratio).round() as usize).max(MIN_CURVE_POINTS)
}

/// Uniform arc-length resampling with box-filter averaging.
///
/// Output samples sit at equal arc-length spacing `P / n` around the closed
/// curve, starting at its first point. Each sample is the mean position of
/// the curve over the arc window of length `P / n` centred on it, integrated
/// exactly along the polyline. Densely traced stretches therefore do not pull
/// extra samples towards themselves, and merged points are anti-aliased
/// rather than dropped.
#[derive(Debug, Clone)]
pub struct ArcLengthSimplifier {
    pub ratio: f64,
}

impl Default for ArcLengthSimplifier {
    fn default() -> Self {
        Self { ratio: 0.05 }
    }
}

impl ArcLengthSimplifier {
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }
}

/// A closed polyline with cumulative arc lengths, `arc[i]` being the distance
/// from point 0 to point `i` and `arc[n]` the full perimeter.
struct ArcTable<'a> {
    points: &'a [GridPoint],
    arc: Vec<f64>,
}

impl<'a> ArcTable<'a> {
    fn new(points: &'a [GridPoint]) -> Self {
        let n = points.len();
        let mut arc = Vec::with_capacity(n + 1);
        arc.push(0.0);
        for i in 0..n {
            let a = points[i];
            let b = points[(i + 1) % n];
            let last = arc[i];
            arc.push(last + (b.row - a.row).hypot(b.col - a.col));
        }
        Self { points, arc }
    }

    fn perimeter(&self) -> f64 {
        self.arc[self.points.len()]
    }

    /// Position at arc length `s` along segment `j`.
    fn point_on(&self, j: usize, s: f64) -> (f64, f64) {
        let a = self.points[j];
        let b = self.points[(j + 1) % self.points.len()];
        let length = self.arc[j + 1] - self.arc[j];
        let t = if length > 0.0 { (s - self.arc[j]) / length } else { 0.0 };
        (a.row + t * (b.row - a.row), a.col + t * (b.col - a.col))
    }

    /// Integral of the position over arc lengths `[from, to]`, with
    /// `0 <= from <= to <= perimeter`.
    fn integrate(&self, from: f64, to: f64) -> (f64, f64) {
        let n = self.points.len();
        let mut j = self.arc.partition_point(|&s| s <= from).saturating_sub(1).min(n - 1);
        let (mut row, mut col) = (0.0, 0.0);
        while j < n && self.arc[j] < to {
            let lo = from.max(self.arc[j]);
            let hi = to.min(self.arc[j + 1]);
            if hi > lo {
                let (r0, c0) = self.point_on(j, lo);
                let (r1, c1) = self.point_on(j, hi);
                row += (hi - lo) * (r0 + r1) / 2.0;
                col += (hi - lo) * (c0 + c1) / 2.0;
            }
            j += 1;
        }
        (row, col)
    }

    /// Mean position over the window `[centre - width / 2, centre + width / 2]`,
    /// wrapping around the closed curve.
    fn window_mean(&self, centre: f64, width: f64) -> GridPoint {
        let perimeter = self.perimeter();
        let (from, to) = (centre - width / 2.0, centre + width / 2.0);
        let (row, col) = if from < 0.0 {
            let (r0, c0) = self.integrate(from + perimeter, perimeter);
            let (r1, c1) = self.integrate(0.0, to);
            (r0 + r1, c0 + c1)
        } else if to > perimeter {
            let (r0, c0) = self.integrate(from, perimeter);
            let (r1, c1) = self.integrate(0.0, to - perimeter);
            (r0 + r1, c0 + c1)
        } else {
            self.integrate(from, to)
        };
        GridPoint::new(row / width, col / width)
    }
}

impl CurveSimplifier for ArcLengthSimplifier {
    fn simplify(&self, curve: &BoundaryCurve) -> Result<SimplifiedCurve> {
        if curve.len() < MIN_CURVE_POINTS {
            return Err(OutlineError::DegenerateCurve { points: curve.len() });
        }

        let table = ArcTable::new(&curve.points);
        let perimeter = table.perimeter();
        if !(perimeter > 0.0) {
            return Err(OutlineError::DegenerateCurve { points: curve.len() });
        }

        let count = target_len(curve.len(), self.ratio);
        let spacing = perimeter / count as f64;
        let points = (0..count)
            .map(|k| table.window_mean(k as f64 * spacing, spacing).to_xy())
            .collect();

        Ok(SimplifiedCurve::new(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn circle(points: usize, radius: f64, centre: (f64, f64)) -> BoundaryCurve {
        BoundaryCurve::new(
            (0..points)
                .map(|i| {
                    let angle = 2.0 * PI * i as f64 / points as f64;
                    GridPoint::new(centre.0 + radius * angle.sin(), centre.1 + radius * angle.cos())
                })
                .collect(),
        )
    }

    #[test]
    fn test_target_len() {
        assert_eq!(target_len(400, 0.05), 20);
        assert_eq!(target_len(30, 0.05), 3);
        assert_eq!(target_len(50, 0.05), 3);
        assert_eq!(target_len(70, 0.05), 4);
        assert_eq!(target_len(17, 1.0), 17);
    }

    #[test]
    fn test_output_length_law() {
        for (points, ratio) in [(400, 0.05), (125, 0.1), (64, 0.5), (9, 0.2), (250, 0.33)] {
            let simplified = ArcLengthSimplifier::new(ratio)
                .simplify(&circle(points, 10.0, (0.0, 0.0)))
                .unwrap();
            assert_eq!(simplified.len(), target_len(points, ratio));
        }
    }

    #[test]
    fn test_unit_ratio_keeps_length() {
        let curve = circle(37, 5.0, (2.0, 3.0));
        let simplified = ArcLengthSimplifier::new(1.0).simplify(&curve).unwrap();
        assert_eq!(simplified.len(), curve.len());
    }

    #[test]
    fn test_circle_keeps_its_radius() {
        let simplified = ArcLengthSimplifier::new(0.05)
            .simplify(&circle(400, 20.0, (50.0, 50.0)))
            .unwrap();
        assert_eq!(simplified.len(), 20);
        for &[x, y] in &simplified.points {
            let r = (x - 50.0).hypot(y - 50.0);
            assert!((r - 20.0).abs() < 0.5, "radius {r}");
        }
    }

    #[test]
    fn test_axes_are_swapped() {
        // Square centred on row 5, column 10.
        let square = BoundaryCurve::new(vec![
            GridPoint::new(4.0, 9.0),
            GridPoint::new(4.0, 11.0),
            GridPoint::new(6.0, 11.0),
            GridPoint::new(6.0, 9.0),
        ]);
        let simplified = ArcLengthSimplifier::new(1.0).simplify(&square).unwrap();
        let [x, y] = simplified.centroid();
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_resampling_follows_arc_length_not_index() {
        // Top side densely traced, the other three sides only by their corners.
        let mut points: Vec<GridPoint> = (0..=100).map(|i| GridPoint::new(0.0, i as f64 * 0.1)).collect();
        points.push(GridPoint::new(10.0, 10.0));
        points.push(GridPoint::new(10.0, 0.0));
        let curve = BoundaryCurve::new(points);

        let simplified = ArcLengthSimplifier::new(0.1).simplify(&curve).unwrap();
        assert_eq!(simplified.len(), 10);
        let near_top = simplified.points.iter().filter(|&&[_, y]| y < 1.0).count();
        assert!(near_top <= 4, "{near_top} of 10 samples on the dense side");
    }

    #[test]
    fn test_short_curves_are_degenerate() {
        let curve = BoundaryCurve::new(vec![GridPoint::new(0.0, 0.0), GridPoint::new(1.0, 1.0)]);
        let err = ArcLengthSimplifier::default().simplify(&curve).unwrap_err();
        assert!(matches!(err, OutlineError::DegenerateCurve { points: 2 }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_collapsed_curve_is_degenerate() {
        let curve = BoundaryCurve::new(vec![GridPoint::new(3.0, 3.0); 5]);
        assert!(matches!(
            ArcLengthSimplifier::default().simplify(&curve),
            Err(OutlineError::DegenerateCurve { points: 5 })
        ));
    }
}
