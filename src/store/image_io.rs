use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::Frame;
use crate::foundation::error::{FlowpaintError, FlowpaintResult};

fn open(path: &Path) -> FlowpaintResult<image::DynamicImage> {
    if !path.is_file() {
        return Err(FlowpaintError::validation(format!(
            "image '{}' does not exist",
            path.display()
        )));
    }
    image::open(path)
        .map_err(|e| FlowpaintError::codec(format!("failed to decode '{}': {e}", path.display())))
}

/// Decode any supported image file into 8-bit RGB.
pub fn load_rgb_image(path: impl AsRef<Path>) -> FlowpaintResult<Frame> {
    Ok(open(path.as_ref())?.to_rgb8())
}

/// Decode an image file as a single-channel 8-bit mask. Colour inputs are converted to luma.
pub fn load_mask_image(path: impl AsRef<Path>) -> FlowpaintResult<image::GrayImage> {
    Ok(open(path.as_ref())?.to_luma8())
}

/// Encode `frame` as PNG at `path` without ever exposing a partially written file there.
///
/// The image goes to a hidden sibling first and is renamed into place once complete.
pub(crate) fn save_png_atomic(frame: &Frame, path: &Path) -> FlowpaintResult<()> {
    let tmp = hidden_sibling(path)?;
    if let Err(e) = frame.save_with_format(&tmp, image::ImageFormat::Png) {
        let _ = std::fs::remove_file(&tmp);
        return Err(FlowpaintError::codec(format!(
            "failed to encode '{}': {e}",
            path.display()
        )));
    }
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move '{}' into place", path.display()))?;
    Ok(())
}

fn hidden_sibling(path: &Path) -> FlowpaintResult<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            FlowpaintError::validation(format!("'{}' has no usable file name", path.display()))
        })?;
    Ok(path.with_file_name(format!(".{name}.partial")))
}

#[cfg(test)]
#[path = "../../tests/unit/store/image_io.rs"]
mod tests;
