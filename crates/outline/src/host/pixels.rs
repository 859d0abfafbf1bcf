use std::borrow::Cow;

use image::{DynamicImage, GrayImage};

use crate::error::Result;

/// Raw samples of a host image, row-major and channel-last.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples<'a> {
    U8(Cow<'a, [u8]>),
    U16(Cow<'a, [u16]>),
    F32(Cow<'a, [f32]>),
    F64(Cow<'a, [f64]>),
}

impl Samples<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::U8(s) => s.len(),
            Self::U16(s) => s.len(),
            Self::F32(s) => s.len(),
            Self::F64(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Float samples carry no storage range of their own.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32(_) | Self::F64(_))
    }

    /// Sample `index` rescaled from its storage range to `[0, 1]`. Float
    /// samples are returned as stored.
    pub fn normalized(&self, index: usize) -> f32 {
        match self {
            Self::U8(s) => f32::from(s[index]) / f32::from(u8::MAX),
            Self::U16(s) => f32::from(s[index]) / f32::from(u16::MAX),
            Self::F32(s) => s[index],
            Self::F64(s) => s[index] as f32,
        }
    }

    fn view(&self) -> Samples<'_> {
        match self {
            Self::U8(s) => Samples::U8(Cow::Borrowed(&**s)),
            Self::U16(s) => Samples::U16(Cow::Borrowed(&**s)),
            Self::F32(s) => Samples::F32(Cow::Borrowed(&**s)),
            Self::F64(s) => Samples::F64(Cow::Borrowed(&**s)),
        }
    }
}

/// Shape plus samples: the multi-dimensional numeric array a host image
/// exposes. The shape is `[height, width]` or `[height, width, channels]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<'a> {
    shape: Vec<usize>,
    samples: Samples<'a>,
}

impl<'a> PixelBuffer<'a> {
    pub fn new(shape: Vec<usize>, samples: Samples<'a>) -> Self {
        Self { shape, samples }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn samples(&self) -> &Samples<'a> {
        &self.samples
    }
}

/// Capability the pipeline needs from a host image: read its pixel buffer.
pub trait HostImage {
    fn pixel_buffer(&self) -> Result<PixelBuffer<'_>>;
}

impl HostImage for PixelBuffer<'_> {
    fn pixel_buffer(&self) -> Result<PixelBuffer<'_>> {
        Ok(PixelBuffer::new(self.shape.clone(), self.samples.view()))
    }
}

impl HostImage for GrayImage {
    fn pixel_buffer(&self) -> Result<PixelBuffer<'_>> {
        Ok(PixelBuffer::new(
            vec![self.height() as usize, self.width() as usize],
            Samples::U8(Cow::Borrowed(self.as_raw().as_slice())),
        ))
    }
}

impl HostImage for DynamicImage {
    fn pixel_buffer(&self) -> Result<PixelBuffer<'_>> {
        let height = self.height() as usize;
        let width = self.width() as usize;
        let shape = |channels: usize| {
            if channels == 1 {
                vec![height, width]
            } else {
                vec![height, width, channels]
            }
        };

        let buffer = match self {
            DynamicImage::ImageLuma8(img) => {
                PixelBuffer::new(shape(1), Samples::U8(Cow::Borrowed(img.as_raw().as_slice())))
            }
            DynamicImage::ImageLumaA8(img) => {
                PixelBuffer::new(shape(2), Samples::U8(Cow::Borrowed(img.as_raw().as_slice())))
            }
            DynamicImage::ImageRgb8(img) => {
                PixelBuffer::new(shape(3), Samples::U8(Cow::Borrowed(img.as_raw().as_slice())))
            }
            DynamicImage::ImageRgba8(img) => {
                PixelBuffer::new(shape(4), Samples::U8(Cow::Borrowed(img.as_raw().as_slice())))
            }
            DynamicImage::ImageLuma16(img) => {
                PixelBuffer::new(shape(1), Samples::U16(Cow::Borrowed(img.as_raw().as_slice())))
            }
            DynamicImage::ImageLumaA16(img) => {
                PixelBuffer::new(shape(2), Samples::U16(Cow::Borrowed(img.as_raw().as_slice())))
            }
            DynamicImage::ImageRgb16(img) => {
                PixelBuffer::new(shape(3), Samples::U16(Cow::Borrowed(img.as_raw().as_slice())))
            }
            DynamicImage::ImageRgba16(img) => {
                PixelBuffer::new(shape(4), Samples::U16(Cow::Borrowed(img.as_raw().as_slice())))
            }
            DynamicImage::ImageRgb32F(img) => {
                PixelBuffer::new(shape(3), Samples::F32(Cow::Borrowed(img.as_raw().as_slice())))
            }
            DynamicImage::ImageRgba32F(img) => {
                PixelBuffer::new(shape(4), Samples::F32(Cow::Borrowed(img.as_raw().as_slice())))
            }
            other => PixelBuffer::new(
                shape(1),
                Samples::F32(Cow::Owned(other.to_luma32f().into_raw())),
            ),
        };
        Ok(buffer)
    }
}
