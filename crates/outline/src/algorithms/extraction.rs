use std::collections::HashMap;

use tracing::debug;

use crate::{
    config::Connectivity,
    traits::BoundaryExtractor,
    types::{BinaryMask, BoundaryCurve, GridPoint},
};

/// Isovalue between background (0.0) and foreground (1.0).
const LEVEL: f64 = 0.5;

/// Corner offsets of a marching-squares cell: top-left, top-right,
/// bottom-right, bottom-left. Edge `i` joins corner `i` and corner `i + 1`.
const CORNERS: [(usize, usize); 4] = [(0, 0), (0, 1), (1, 1), (1, 0)];

/// Marching-squares contour tracing at the 0.5 level of a binary mask.
///
/// The mask is surrounded by a virtual ring of background so that regions
/// touching the image border still produce closed loops. Ambiguous saddle
/// cells are split according to `connectivity`, matching the region labeller:
/// with [`Connectivity::Eight`] diagonal foreground pixels share one outline.
#[derive(Debug, Clone, Default)]
pub struct MarchingSquaresExtractor {
    pub connectivity: Connectivity,
}

/// A grid edge in padded coordinates, named by its top/left endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeKey {
    Horizontal(usize, usize),
    Vertical(usize, usize),
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    from: EdgeKey,
    to: EdgeKey,
    start: GridPoint,
}

impl MarchingSquaresExtractor {
    pub fn new(connectivity: Connectivity) -> Self {
        Self { connectivity }
    }

    fn segments(&self, mask: &BinaryMask) -> Vec<Segment> {
        let value = |pr: usize, pc: usize| mask.is_foreground(pr as isize - 1, pc as isize - 1);
        let mut segments = Vec::new();

        for cr in 0..=mask.height() {
            for cc in 0..=mask.width() {
                let corner = |i: usize| (cr + CORNERS[i].0, cc + CORNERS[i].1);
                let fg: [bool; 4] = std::array::from_fn(|i| {
                    let (r, c) = corner(i);
                    value(r, c)
                });

                let mut crossing = [0usize; 4];
                let mut crossings = 0;
                for edge in (0..4).filter(|&e| fg[e] != fg[(e + 1) % 4]) {
                    crossing[crossings] = edge;
                    crossings += 1;
                }

                let mut pairs = [(0usize, 0usize); 2];
                let pair_count = match crossings {
                    2 => {
                        pairs[0] = (crossing[0], crossing[1]);
                        1
                    }
                    4 => {
                        // Saddle: cut off the corners that must stay disconnected.
                        let cut_foreground = self.connectivity == Connectivity::Four;
                        let mut n = 0;
                        for i in (0..4).filter(|&i| fg[i] == cut_foreground) {
                            pairs[n] = ((i + 3) % 4, i);
                            n += 1;
                        }
                        n
                    }
                    _ => continue,
                };

                for &(a, b) in &pairs[..pair_count] {
                    let pa = crossing_point(&fg, corner, a);
                    let pb = crossing_point(&fg, corner, b);

                    // Keep the foreground on the right-hand side (x = col, y = row).
                    let (fr, fc) = if fg[a] { corner(a) } else { corner((a + 1) % 4) };
                    let (fx, fy) = (fc as f64 - 1.0, fr as f64 - 1.0);
                    let cross = (pb.col - pa.col) * (fy - pa.row) - (pb.row - pa.row) * (fx - pa.col);

                    let (from, to, start) = if cross > 0.0 {
                        (edge_key(cr, cc, a), edge_key(cr, cc, b), pa)
                    } else {
                        (edge_key(cr, cc, b), edge_key(cr, cc, a), pb)
                    };
                    segments.push(Segment { from, to, start });
                }
            }
        }

        segments
    }
}

fn edge_key(cr: usize, cc: usize, edge: usize) -> EdgeKey {
    match edge {
        0 => EdgeKey::Horizontal(cr, cc),
        1 => EdgeKey::Vertical(cr, cc + 1),
        2 => EdgeKey::Horizontal(cr + 1, cc),
        _ => EdgeKey::Vertical(cr, cc),
    }
}

/// Linear interpolation of the level crossing along `edge`, in image
/// (unpadded) coordinates.
fn crossing_point(
    fg: &[bool; 4],
    corner: impl Fn(usize) -> (usize, usize),
    edge: usize,
) -> GridPoint {
    let (r0, c0) = corner(edge);
    let (r1, c1) = corner((edge + 1) % 4);
    let v0 = if fg[edge] { 1.0 } else { 0.0 };
    let v1 = if fg[(edge + 1) % 4] { 1.0 } else { 0.0 };
    let t = (LEVEL - v0) / (v1 - v0);
    GridPoint::new(
        r0 as f64 + t * (r1 as f64 - r0 as f64) - 1.0,
        c0 as f64 + t * (c1 as f64 - c0 as f64) - 1.0,
    )
}

/// Chain oriented segments into closed loops. Every crossing edge starts
/// exactly one segment and ends exactly one other.
fn assemble(segments: &[Segment]) -> Vec<BoundaryCurve> {
    let starts: HashMap<EdgeKey, usize> = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| (segment.from, i))
        .collect();

    let mut visited = vec![false; segments.len()];
    let mut curves = Vec::new();

    for first in 0..segments.len() {
        if visited[first] {
            continue;
        }

        let mut points = Vec::new();
        let mut current = first;
        loop {
            visited[current] = true;
            points.push(segments[current].start);
            match starts.get(&segments[current].to) {
                Some(&next) if next != first && !visited[next] => current = next,
                _ => break,
            }
        }
        curves.push(BoundaryCurve::new(points));
    }

    curves
}

impl BoundaryExtractor for MarchingSquaresExtractor {
    fn extract(&self, mask: &BinaryMask) -> Vec<BoundaryCurve> {
        if mask.width() == 0 || mask.height() == 0 || mask.is_empty() || mask.is_full() {
            debug!("Mask has no foreground/background crossings, no boundaries to trace");
            return Vec::new();
        }

        let segments = self.segments(mask);
        let curves = assemble(&segments);
        debug!(
            "Traced {} boundary curves from {} segments ({} connectivity)",
            curves.len(),
            segments.len(),
            self.connectivity
        );
        curves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algorithms::ComponentLabeler, traits::RegionLabeler};

    fn mask_from(rows: &[&str]) -> BinaryMask {
        let height = rows.len();
        let width = rows[0].len();
        BinaryMask::from_fn(width, height, |r, c| rows[r].as_bytes()[c] == b'#')
    }

    fn is_adjacent(a: GridPoint, b: GridPoint) -> bool {
        (a.row - b.row).abs() <= 1.0 + 1e-9 && (a.col - b.col).abs() <= 1.0 + 1e-9
    }

    #[test]
    fn test_empty_and_full_masks_have_no_curves() {
        let extractor = MarchingSquaresExtractor::default();
        assert!(extractor.extract(&BinaryMask::from_fn(6, 6, |_, _| false)).is_empty());
        assert!(extractor.extract(&BinaryMask::from_fn(6, 6, |_, _| true)).is_empty());
    }

    #[test]
    fn test_single_pixel_is_a_diamond() {
        let mask = mask_from(&["...", ".#.", "..."]);
        let curves = MarchingSquaresExtractor::default().extract(&mask);
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].len(), 4);
        assert!((curves[0].signed_area() - 0.5).abs() < 1e-12);
        for p in &curves[0].points {
            assert!(((p.row - 1.0).abs() + (p.col - 1.0).abs() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rectangle_yields_one_closed_curve() {
        let mask = BinaryMask::from_fn(10, 10, |r, c| (3..6).contains(&r) && (4..7).contains(&c));
        let curves = MarchingSquaresExtractor::default().extract(&mask);
        assert_eq!(curves.len(), 1);

        let curve = &curves[0];
        assert_eq!(curve.len(), 12);
        assert!((curve.signed_area() - 8.5).abs() < 1e-9);

        let n = curve.len();
        for i in 0..n {
            assert!(is_adjacent(curve.points[i], curve.points[(i + 1) % n]));
        }
    }

    #[test]
    fn test_region_touching_border_is_closed() {
        let mask = mask_from(&["####", "####", "....", "...."]);
        let curves = MarchingSquaresExtractor::default().extract(&mask);
        assert_eq!(curves.len(), 1);
        assert!(curves[0].points.iter().any(|p| p.row == -0.5));
        assert!(curves[0].signed_area() > 0.0);
    }

    #[test]
    fn test_hole_has_its_own_reversed_curve() {
        let mask = mask_from(&[
            ".......",
            ".#####.",
            ".#####.",
            ".##.##.",
            ".#####.",
            ".#####.",
            ".......",
        ]);
        let curves = MarchingSquaresExtractor::default().extract(&mask);
        assert_eq!(curves.len(), 2);
        assert_eq!(curves.iter().filter(|c| c.is_hole()).count(), 1);
        assert_eq!(curves.iter().filter(|c| !c.is_hole()).count(), 1);
    }

    #[test]
    fn test_saddle_follows_connectivity() {
        let mask = mask_from(&["....", ".#..", "..#.", "...."]);
        let four = MarchingSquaresExtractor::new(Connectivity::Four).extract(&mask);
        let eight = MarchingSquaresExtractor::new(Connectivity::Eight).extract(&mask);
        assert_eq!(four.len(), 2);
        assert_eq!(eight.len(), 1);
        assert_eq!(eight[0].len(), 8);
    }

    #[test]
    fn test_outer_curves_match_labelled_regions() {
        let mask = mask_from(&[
            "##..#...#.",
            "#.#..#.#..",
            "##...##...",
            "....#..#.#",
            "###.#..#..",
            "#.#..##...",
            "###......#",
        ]);
        for connectivity in [Connectivity::Four, Connectivity::Eight] {
            let regions = ComponentLabeler::new(connectivity).label(&mask).count() as usize;
            let curves = MarchingSquaresExtractor::new(connectivity).extract(&mask);
            let outer = curves.iter().filter(|c| !c.is_hole()).count();
            assert_eq!(outer, regions, "{connectivity} connectivity");
        }
    }
}
