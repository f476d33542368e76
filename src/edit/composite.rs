use crate::foundation::core::{Dims, Frame, Mask, Raster, quantize_u8};
use crate::foundation::error::{FlowpaintError, FlowpaintResult};

/// `mask * logo + (1 - mask) * frame` per pixel and channel, rounded back to 8 bits.
///
/// Where the mask is 0 the frame pixel is returned unchanged; where it is 1 the logo pixel is.
pub fn composite(logo: &Raster, mask: &Mask, frame: &Frame) -> FlowpaintResult<Frame> {
    let dims = Dims::of_frame(frame);
    if logo.channels() != 3 {
        return Err(FlowpaintError::shape(format!(
            "logo must have three channels, got {}",
            logo.channels()
        )));
    }
    if logo.dims() != dims || mask.dims() != dims {
        return Err(FlowpaintError::shape(format!(
            "cannot composite a {} logo with a {} mask over a {dims} frame",
            logo.dims(),
            mask.dims()
        )));
    }

    let mut out = frame.clone();
    for ((dst, src), &m) in out
        .chunks_exact_mut(3)
        .zip(logo.data().chunks_exact(3))
        .zip(mask.values())
    {
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = quantize_u8(m * s + (1.0 - m) * f32::from(*d));
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/edit/composite.rs"]
mod tests;
