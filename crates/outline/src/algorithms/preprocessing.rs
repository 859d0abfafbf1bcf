use tracing::debug;

use crate::{
    error::{OutlineError, Result},
    host::PixelBuffer,
    types::IntensityField,
};

/// Converts a host pixel buffer into a single-channel [`IntensityField`].
///
/// Multi-channel buffers are reduced by picking one channel, not by averaging:
/// greyscale sources are often stored redundantly across RGB channels and
/// picking one keeps their exact values. This is not a colour-to-grey
/// conversion.
#[derive(Debug, Clone, Default)]
pub struct IntensityNormalizer {
    pub channel: usize,
}

impl IntensityNormalizer {
    pub fn new(channel: usize) -> Self {
        Self { channel }
    }

    pub fn normalize(&self, buffer: &PixelBuffer<'_>) -> Result<IntensityField> {
        let shape = buffer.shape();
        let invalid = |reason: String| OutlineError::InvalidImageShape {
            shape: shape.to_vec(),
            reason,
        };

        let (height, width, channels) = match *shape {
            [height, width] => (height, width, 1),
            [height, width, channels] => (height, width, channels),
            [] | [_] => {
                return Err(invalid("fewer than two spatial dimensions".to_string()));
            }
            _ => {
                return Err(invalid(
                    "expected [height, width] or [height, width, channels]".to_string(),
                ));
            }
        };
        if height == 0 || width == 0 {
            return Err(invalid("image has no pixels".to_string()));
        }
        if channels == 0 {
            return Err(invalid("image has no channels".to_string()));
        }
        if self.channel >= channels {
            return Err(invalid(format!(
                "channel {} requested from a {}-channel image",
                self.channel, channels
            )));
        }

        let samples = buffer.samples();
        let expected = height * width * channels;
        if samples.len() != expected {
            return Err(OutlineError::BufferSizeMismatch {
                expected,
                actual: samples.len(),
            });
        }

        let mut values: Vec<f32> = (0..height * width)
            .map(|i| samples.normalized(i * channels + self.channel))
            .collect();
        if samples.is_float() {
            rescale_out_of_range(&mut values);
        }
        IntensityField::new(width, height, values)
    }
}

/// Min-max rescale float samples stored in raw units. Values already inside
/// `[0, 1]` are left alone; non-finite values are skipped and later become 0.
fn rescale_out_of_range(values: &mut [f32]) {
    let Some((min, max)) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f32, f32)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    else {
        return;
    };
    if min >= 0.0 && max <= 1.0 {
        return;
    }

    let range = max - min;
    debug!("Rescaling float samples from [{min}, {max}] to [0, 1]");
    for v in values.iter_mut().filter(|v| v.is_finite()) {
        *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
    }
}
