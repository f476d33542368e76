//! Pull-warping of rasters and masks by a displacement field.
//!
//! Output pixel `x` is sampled from the input at `x + field(x)`.

use crate::foundation::core::{Mask, Raster};
use crate::foundation::error::{FlowpaintError, FlowpaintResult};
use crate::motion::field::DisplacementField;

/// Threshold used to re-binarize warped masks unless configured otherwise.
pub const DEFAULT_MASK_THRESHOLD: f32 = 0.5;

// Keeps integer neighbour arithmetic in range for absurdly large displacements.
const SAMPLE_LIMIT: f32 = 1.0e7;

/// Resampling kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    /// Nearest input sample.
    Nearest,
    /// Bilinear blend of the four surrounding samples.
    #[default]
    Bilinear,
}

/// How samples outside the input grid are produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BorderMode {
    /// Mirror the image with the edge sample repeated (`cba|abc|cba`).
    Reflect,
    /// Every outside sample has this value.
    Constant(f32),
}

/// Pull-warp `image` by `field`. The output has the same size and channel count as the input.
pub fn warp(
    image: &Raster,
    field: &DisplacementField,
    interpolation: Interpolation,
    border: BorderMode,
) -> FlowpaintResult<Raster> {
    let dims = image.dims();
    field.validate_for(dims)?;

    let channels = image.channels();
    let mut out = Raster::new(dims, channels)?;
    if dims.is_empty() {
        return Ok(out);
    }

    let sampler = Sampler { image, border };
    for y in 0..dims.height {
        for x in 0..dims.width {
            let [dx, dy] = field.get(x, y);
            let sx = (x as f32 + dx).clamp(-SAMPLE_LIMIT, SAMPLE_LIMIT);
            let sy = (y as f32 + dy).clamp(-SAMPLE_LIMIT, SAMPLE_LIMIT);
            let px = out.pixel_mut(x, y);
            match interpolation {
                Interpolation::Nearest => sampler.nearest(sx, sy, px),
                Interpolation::Bilinear => sampler.bilinear(sx, sy, px),
            }
        }
    }
    Ok(out)
}

/// Warp a mask with zero border and bilinear interpolation, then re-binarize it:
/// `1` where the warped coverage is strictly above `threshold`, `0` elsewhere.
pub fn warp_mask(
    mask: &Mask,
    field: &DisplacementField,
    threshold: f32,
) -> FlowpaintResult<Mask> {
    check_threshold(threshold)?;
    Ok(warp_mask_soft(mask, field, Interpolation::Bilinear)?.binarize(threshold))
}

/// Warp a mask with zero border and no re-binarization; values are clipped to `[0, 1]`.
pub fn warp_mask_soft(
    mask: &Mask,
    field: &DisplacementField,
    interpolation: Interpolation,
) -> FlowpaintResult<Mask> {
    let warped = warp(
        mask.as_raster(),
        field,
        interpolation,
        BorderMode::Constant(0.0),
    )?;
    Mask::from_raster_clamped(warped)
}

pub(crate) fn check_threshold(threshold: f32) -> FlowpaintResult<()> {
    if !threshold.is_finite() || !(0.0..1.0).contains(&threshold) {
        return Err(FlowpaintError::validation(format!(
            "mask threshold must be within [0, 1), got {threshold}"
        )));
    }
    Ok(())
}

struct Sampler<'a> {
    image: &'a Raster,
    border: BorderMode,
}

impl Sampler<'_> {
    fn nearest(&self, sx: f32, sy: f32, out: &mut [f32]) {
        let ix = sx.round() as i64;
        let iy = sy.round() as i64;
        for (c, o) in out.iter_mut().enumerate() {
            *o = self.texel(ix, iy, c);
        }
    }

    fn bilinear(&self, sx: f32, sy: f32, out: &mut [f32]) {
        let x0 = sx.floor();
        let y0 = sy.floor();
        let fx = sx - x0;
        let fy = sy - y0;
        let ix = x0 as i64;
        let iy = y0 as i64;
        for (c, o) in out.iter_mut().enumerate() {
            let top = self.texel(ix, iy, c) * (1.0 - fx) + self.texel(ix + 1, iy, c) * fx;
            let bottom =
                self.texel(ix, iy + 1, c) * (1.0 - fx) + self.texel(ix + 1, iy + 1, c) * fx;
            *o = top * (1.0 - fy) + bottom * fy;
        }
    }

    fn texel(&self, ix: i64, iy: i64, c: usize) -> f32 {
        let dims = self.image.dims();
        let (w, h) = (i64::from(dims.width), i64::from(dims.height));
        match self.border {
            BorderMode::Reflect => {
                self.image
                    .get(reflect_index(ix, w), reflect_index(iy, h), c)
            }
            BorderMode::Constant(v) => {
                if ix < 0 || iy < 0 || ix >= w || iy >= h {
                    v
                } else {
                    self.image.get(ix as u32, iy as u32, c)
                }
            }
        }
    }
}

/// Map any integer coordinate into `0..n` by mirroring with the edge sample repeated.
fn reflect_index(i: i64, n: i64) -> u32 {
    if n <= 1 {
        return 0;
    }
    let period = 2 * n;
    let m = i.rem_euclid(period);
    (if m < n { m } else { period - 1 - m }) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/warp/warp.rs"]
mod tests;
