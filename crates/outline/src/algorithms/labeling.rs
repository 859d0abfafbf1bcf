use image::{GrayImage, Luma};
use imageproc::region_labelling::connected_components;

use crate::{
    config::Connectivity,
    traits::RegionLabeler,
    types::{BinaryMask, LabelField, RegionMeasurement},
};

/// Connected-component labelling on top of imageproc.
///
/// Final labels are numbered in row-major order of each region's first pixel,
/// so the output is identical across runs for the same mask.
#[derive(Debug, Clone, Default)]
pub struct ComponentLabeler {
    pub connectivity: Connectivity,
}

impl ComponentLabeler {
    pub fn new(connectivity: Connectivity) -> Self {
        Self { connectivity }
    }
}

impl RegionLabeler for ComponentLabeler {
    fn label(&self, mask: &BinaryMask) -> LabelField {
        let (width, height) = (mask.width(), mask.height());
        let image = GrayImage::from_fn(width as u32, height as u32, |x, y| {
            Luma([if mask.get(y as usize, x as usize) { 255 } else { 0 }])
        });
        let components = connected_components(&image, self.connectivity.into(), Luma([0u8]));

        // Renumber by first occurrence in row-major order.
        let mut final_label: Vec<u32> = Vec::new();
        let mut count = 0u32;
        let labels = components
            .pixels()
            .map(|&Luma([raw])| {
                if raw == 0 {
                    return 0;
                }
                let raw = raw as usize;
                if raw >= final_label.len() {
                    final_label.resize(raw + 1, 0);
                }
                if final_label[raw] == 0 {
                    count += 1;
                    final_label[raw] = count;
                }
                final_label[raw]
            })
            .collect();

        LabelField::new(width, height, labels, count)
    }
}

/// Area, equivalent diameter, centroid and bounding box of every labelled
/// region, ordered by label.
pub fn measure_regions(labels: &LabelField) -> Vec<RegionMeasurement> {
    struct Accumulator {
        area: usize,
        row_sum: f64,
        col_sum: f64,
        bbox: [usize; 4],
    }

    let mut regions: Vec<Accumulator> = (0..labels.count())
        .map(|_| Accumulator {
            area: 0,
            row_sum: 0.0,
            col_sum: 0.0,
            bbox: [usize::MAX, usize::MAX, 0, 0],
        })
        .collect();

    for row in 0..labels.height() {
        for col in 0..labels.width() {
            let label = labels.get(row, col);
            if label == 0 {
                continue;
            }
            let region = &mut regions[label as usize - 1];
            region.area += 1;
            region.row_sum += row as f64;
            region.col_sum += col as f64;
            region.bbox[0] = region.bbox[0].min(row);
            region.bbox[1] = region.bbox[1].min(col);
            region.bbox[2] = region.bbox[2].max(row);
            region.bbox[3] = region.bbox[3].max(col);
        }
    }

    regions
        .into_iter()
        .enumerate()
        .map(|(i, region)| {
            let area = region.area as f64;
            RegionMeasurement {
                label: i as u32 + 1,
                area: region.area,
                equivalent_diameter: (4.0 * area / std::f64::consts::PI).sqrt(),
                centroid: [region.row_sum / area, region.col_sum / area],
                bbox: region.bbox,
            }
        })
        .collect()
}
