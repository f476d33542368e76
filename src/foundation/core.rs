use std::fmt;

use crate::foundation::error::{FlowpaintError, FlowpaintResult};

/// An 8-bit RGB video frame.
pub type Frame = image::RgbImage;

/// Spatial size shared by frames, masks and displacement fields of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Dims {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dims {
    /// Build a size from width and height.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size of an 8-bit RGB frame.
    pub fn of_frame(frame: &Frame) -> Self {
        let (width, height) = frame.dimensions();
        Self { width, height }
    }

    /// Number of pixels (`width * height`).
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Real-valued raster: row-major, channels interleaved per pixel.
///
/// Color content uses three channels in the 0..=255 range; masks and luma planes use one.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    dims: Dims,
    channels: usize,
    data: Vec<f32>,
}

impl Raster {
    /// Zero-filled raster.
    pub fn new(dims: Dims, channels: usize) -> FlowpaintResult<Self> {
        if channels == 0 {
            return Err(FlowpaintError::shape("raster channel count must be >= 1"));
        }
        Ok(Self {
            dims,
            channels,
            data: vec![0.0; dims.pixel_count() * channels],
        })
    }

    /// Wrap existing samples; `data.len()` must equal `width * height * channels`.
    pub fn from_vec(dims: Dims, channels: usize, data: Vec<f32>) -> FlowpaintResult<Self> {
        if channels == 0 {
            return Err(FlowpaintError::shape("raster channel count must be >= 1"));
        }
        let expected = dims.pixel_count() * channels;
        if data.len() != expected {
            return Err(FlowpaintError::shape(format!(
                "raster {dims}x{channels} expects {expected} samples, got {}",
                data.len()
            )));
        }
        Ok(Self {
            dims,
            channels,
            data,
        })
    }

    /// Three-channel raster holding the frame's raw byte values.
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            dims: Dims::of_frame(frame),
            channels: 3,
            data: frame.as_raw().iter().map(|&v| f32::from(v)).collect(),
        }
    }

    /// Spatial size.
    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// Channels per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// All samples, row-major and interleaved.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access to all samples.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Samples of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let start = self.offset(x, y);
        &self.data[start..start + self.channels]
    }

    /// Mutable samples of pixel `(x, y)`.
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [f32] {
        let start = self.offset(x, y);
        &mut self.data[start..start + self.channels]
    }

    /// One sample.
    pub fn get(&self, x: u32, y: u32, channel: usize) -> f32 {
        self.data[self.offset(x, y) + channel]
    }

    /// Round and clamp a three-channel raster back into an 8-bit frame.
    pub fn to_frame(&self) -> FlowpaintResult<Frame> {
        if self.channels != 3 {
            return Err(FlowpaintError::shape(format!(
                "cannot convert a {}-channel raster to an RGB frame",
                self.channels
            )));
        }
        let bytes = self.data.iter().map(|&v| quantize_u8(v)).collect();
        Frame::from_raw(self.dims.width, self.dims.height, bytes)
            .ok_or_else(|| FlowpaintError::shape("raster buffer does not fit its dimensions"))
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.dims.width as usize + x as usize) * self.channels
    }
}

/// Round to nearest and saturate into `0..=255`. NaN maps to 0.
pub(crate) fn quantize_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Single-channel per-pixel coverage in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask(Raster);

impl Mask {
    /// Validate a one-channel raster whose values lie in `[0, 1]`.
    pub fn from_raster(raster: Raster) -> FlowpaintResult<Self> {
        if raster.channels() != 1 {
            return Err(FlowpaintError::shape(format!(
                "mask must have exactly one channel, got {}",
                raster.channels()
            )));
        }
        if let Some(v) = raster
            .data()
            .iter()
            .find(|v| !v.is_finite() || **v < 0.0 || **v > 1.0)
        {
            return Err(FlowpaintError::shape(format!(
                "mask values must be finite and within [0, 1], found {v}"
            )));
        }
        Ok(Self(raster))
    }

    /// Like [`Mask::from_raster`] but clamps out-of-range values instead of rejecting them.
    pub(crate) fn from_raster_clamped(mut raster: Raster) -> FlowpaintResult<Self> {
        if raster.channels() != 1 {
            return Err(FlowpaintError::shape(format!(
                "mask must have exactly one channel, got {}",
                raster.channels()
            )));
        }
        for v in raster.data_mut() {
            *v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        }
        Ok(Self(raster))
    }

    /// Normalize an 8-bit mask image (`byte / 255`).
    pub fn from_luma8(img: &image::GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self(Raster {
            dims: Dims::new(width, height),
            channels: 1,
            data: img.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect(),
        })
    }

    /// Constant mask; `value` is clamped into `[0, 1]`.
    pub fn filled(dims: Dims, value: f32) -> Self {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self(Raster {
            dims,
            channels: 1,
            data: vec![value; dims.pixel_count()],
        })
    }

    /// Spatial size.
    pub fn dims(&self) -> Dims {
        self.0.dims()
    }

    /// Coverage at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.0.get(x, y, 0)
    }

    /// Set coverage at `(x, y)`, clamped into `[0, 1]`.
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        self.0.pixel_mut(x, y)[0] = value.clamp(0.0, 1.0);
    }

    /// Row-major coverage values.
    pub fn values(&self) -> &[f32] {
        self.0.data()
    }

    /// Borrow as a one-channel raster.
    pub fn as_raster(&self) -> &Raster {
        &self.0
    }

    /// Hard mask: `1` where coverage is strictly above `threshold`, `0` elsewhere.
    pub fn binarize(&self, threshold: f32) -> Mask {
        let data = self
            .0
            .data()
            .iter()
            .map(|&v| if v > threshold { 1.0 } else { 0.0 })
            .collect();
        Mask(Raster {
            dims: self.dims(),
            channels: 1,
            data,
        })
    }

    /// True when every value is exactly 0 or 1.
    pub fn is_binary(&self) -> bool {
        self.0.data().iter().all(|&v| v == 0.0 || v == 1.0)
    }

    /// Sum of coverage over all pixels.
    pub fn coverage(&self) -> f64 {
        self.0.data().iter().map(|&v| f64::from(v)).sum()
    }

    /// Quantize to an 8-bit grayscale image.
    pub fn to_luma8(&self) -> image::GrayImage {
        let Dims { width, height } = self.dims();
        image::GrayImage::from_fn(width, height, |x, y| {
            image::Luma([quantize_u8(self.get(x, y) * 255.0)])
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
