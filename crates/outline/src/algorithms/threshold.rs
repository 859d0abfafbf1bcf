use crate::{
    traits::ThresholdSelector,
    types::{IntensityField, Threshold},
};

/// Otsu's method over a histogram spanning the observed intensity range.
///
/// For every split after bin `t` the score is `ω_A·ω_B·(μ_A − μ_B)²`, with
/// class A holding bins `≤ t`. The threshold is the centre of the best bin.
/// Splits that fall inside an empty stretch of the histogram all score the
/// same, so a tied run is resolved to its middle bin: for a two-valued image
/// the cutoff lands halfway between the two populations.
#[derive(Debug, Clone)]
pub struct OtsuThresholdSelector {
    pub bins: usize,
}

impl Default for OtsuThresholdSelector {
    fn default() -> Self {
        Self { bins: 256 }
    }
}

impl OtsuThresholdSelector {
    fn histogram(&self, field: &IntensityField, min: f32, max: f32) -> Vec<u64> {
        let bins = self.bins.max(2);
        let scale = bins as f64 / f64::from(max - min);
        let mut histogram = vec![0u64; bins];
        for &v in field.values() {
            let bin = ((f64::from(v - min)) * scale) as usize;
            histogram[bin.min(bins - 1)] += 1;
        }
        histogram
    }
}

impl ThresholdSelector for OtsuThresholdSelector {
    fn select(&self, field: &IntensityField) -> Threshold {
        let Some((min, max)) = field.min_max() else {
            return Threshold::degenerate(0.0);
        };
        if max <= min {
            return Threshold::degenerate(min);
        }

        let histogram = self.histogram(field, min, max);
        let bins = histogram.len();
        let bin_width = f64::from(max - min) / bins as f64;
        let centre = |i: usize| f64::from(min) + (i as f64 + 0.5) * bin_width;

        let total: u64 = histogram.iter().sum();
        let total_f = total as f64;
        let total_sum: f64 = histogram
            .iter()
            .enumerate()
            .map(|(i, &count)| count as f64 * centre(i))
            .sum();

        let mut weight_a = 0u64;
        let mut sum_a = 0.0;
        let mut best_score = f64::NEG_INFINITY;
        let mut run = (0usize, 0usize);

        for t in 0..bins - 1 {
            weight_a += histogram[t];
            sum_a += histogram[t] as f64 * centre(t);
            let weight_b = total - weight_a;
            if weight_a == 0 || weight_b == 0 {
                continue;
            }

            let mean_a = sum_a / weight_a as f64;
            let mean_b = (total_sum - sum_a) / weight_b as f64;
            let score = (weight_a as f64 / total_f)
                * (weight_b as f64 / total_f)
                * (mean_a - mean_b).powi(2);

            if score > best_score {
                best_score = score;
                run = (t, t);
            } else if score == best_score && t == run.1 + 1 {
                run.1 = t;
            }
        }

        let chosen = (run.0 + run.1) / 2;
        Threshold::new(centre(chosen) as f32)
    }
}

/// Always returns the configured cutoff.
#[derive(Debug, Clone)]
pub struct FixedThresholdSelector {
    pub value: f32,
}

impl Default for FixedThresholdSelector {
    fn default() -> Self {
        Self { value: 0.5 }
    }
}

impl ThresholdSelector for FixedThresholdSelector {
    fn select(&self, _field: &IntensityField) -> Threshold {
        Threshold::new(self.value)
    }
}
