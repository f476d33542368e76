use crate::foundation::core::{Dims, Frame, Mask, Raster};
use crate::foundation::error::{FlowpaintError, FlowpaintResult};

/// The edited content isolated from the reference frame, computed once per run.
///
/// `logo` is the edited reference multiplied by the normalized mask, so pixels outside the
/// edit are zero before any warp can blend them in.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceEdit {
    logo: Raster,
    mask: Mask,
}

impl ReferenceEdit {
    /// Extract from the edited reference frame and its 8-bit mask image.
    pub fn extract(edited: &Frame, mask: &image::GrayImage) -> FlowpaintResult<Self> {
        let (w, h) = mask.dimensions();
        let mask_dims = Dims::new(w, h);
        let frame_dims = Dims::of_frame(edited);
        if mask_dims != frame_dims {
            return Err(FlowpaintError::validation(format!(
                "mask is {mask_dims} but the edited reference frame is {frame_dims}"
            )));
        }
        Self::from_mask(edited, Mask::from_luma8(mask))
    }

    /// Extract from the edited reference frame and an already normalized mask.
    pub fn from_mask(edited: &Frame, mask: Mask) -> FlowpaintResult<Self> {
        let frame_dims = Dims::of_frame(edited);
        if mask.dims() != frame_dims {
            return Err(FlowpaintError::validation(format!(
                "mask is {} but the edited reference frame is {frame_dims}",
                mask.dims()
            )));
        }

        let mut logo = Raster::from_frame(edited);
        for (px, &m) in logo.data_mut().chunks_exact_mut(3).zip(mask.values()) {
            for c in px {
                *c *= m;
            }
        }
        Ok(Self { logo, mask })
    }

    /// Masked edit content (three channels, 0..=255).
    pub fn logo(&self) -> &Raster {
        &self.logo
    }

    /// Normalized mask in `[0, 1]`.
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Spatial size.
    pub fn dims(&self) -> Dims {
        self.mask.dims()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/extract.rs"]
mod tests;
