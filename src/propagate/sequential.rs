use crate::edit::composite::composite;
use crate::edit::extract::ReferenceEdit;
use crate::foundation::core::{Dims, Frame, Mask, Raster};
use crate::foundation::error::FlowpaintResult;
use crate::motion::estimator::MotionEstimator;
use crate::motion::field::DisplacementField;
use crate::propagate::reference::reference_output;
use crate::propagate::validate_inputs;
use crate::warp::{BorderMode, Interpolation, warp, warp_mask};

/// Edit content carried from one frame to the next in sequential propagation.
///
/// Each step builds a new state from the previous one; nothing is mutated in place.
#[derive(Clone, Debug, PartialEq)]
pub struct CarriedEdit {
    logo: Raster,
    mask: Mask,
}

impl CarriedEdit {
    /// Starting state: the reference edit as extracted.
    pub fn from_reference(edit: &ReferenceEdit) -> Self {
        Self {
            logo: edit.logo().clone(),
            mask: edit.mask().clone(),
        }
    }

    /// Carried logo content.
    pub fn logo(&self) -> &Raster {
        &self.logo
    }

    /// Carried mask.
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// One propagation step onto `frame`.
    ///
    /// `field` lives in `frame`'s coordinates and points toward the frame this state belongs
    /// to. The warped mask is re-binarized with `mask_threshold`. Returns the next state and
    /// the composited frame.
    pub fn step(
        &self,
        field: &DisplacementField,
        frame: &Frame,
        mask_threshold: f32,
    ) -> FlowpaintResult<(CarriedEdit, Frame)> {
        field.validate_for(Dims::of_frame(frame))?;
        let logo = warp(&self.logo, field, Interpolation::Bilinear, BorderMode::Reflect)?;
        let mask = warp_mask(&self.mask, field, mask_threshold)?;
        let out = composite(&logo, &mask, frame)?;
        Ok((CarriedEdit { logo, mask }, out))
    }
}

/// Sequential propagation: walk forward from the reference to the last frame and backward to
/// the first, carrying the edit between neighbours.
///
/// Strictly ordered; each step consumes the previous step's state.
///
/// Every step estimates `motion(frame_t -> neighbour)`, where `frame_t` is the frame being
/// produced and `neighbour` the already-produced frame next to it (`t - 1` walking forward,
/// `t + 1` walking backward). The field therefore lives in the coordinates of the frame being
/// produced, which is what a pull warp needs: output `x` is sampled at `x + field(x)` in the
/// neighbour's carried edit.
pub fn propagate_sequential(
    frames: &[Frame],
    edit: &ReferenceEdit,
    reference_index: usize,
    estimator: &dyn MotionEstimator,
    mask_threshold: f32,
) -> FlowpaintResult<Vec<Frame>> {
    validate_inputs(frames, edit, reference_index, mask_threshold)?;

    let start = CarriedEdit::from_reference(edit);
    let forward = carry(
        frames,
        &start,
        (reference_index + 1..frames.len()).map(|t| (t, t - 1)),
        estimator,
        mask_threshold,
    )?;
    let backward = carry(
        frames,
        &start,
        (0..reference_index).rev().map(|t| (t, t + 1)),
        estimator,
        mask_threshold,
    )?;

    let mut out = Vec::with_capacity(frames.len());
    out.extend(backward.into_iter().rev());
    out.push(reference_output(edit, &frames[reference_index])?);
    out.extend(forward);
    Ok(out)
}

/// Fold over `(target, previous)` index pairs. Outputs are returned in visiting order.
fn carry(
    frames: &[Frame],
    start: &CarriedEdit,
    mut steps: impl Iterator<Item = (usize, usize)>,
    estimator: &dyn MotionEstimator,
    mask_threshold: f32,
) -> FlowpaintResult<Vec<Frame>> {
    let (_, outputs) = steps.try_fold(
        (start.clone(), Vec::new()),
        |(state, mut outputs), (t, prev)| -> FlowpaintResult<_> {
            let step = || -> FlowpaintResult<(CarriedEdit, Frame)> {
                let field = estimator.estimate(&frames[t], &frames[prev])?;
                tracing::debug!(
                    frame = t,
                    from = prev,
                    mean = field.stats().mean_magnitude,
                    "sequential step"
                );
                state.step(&field, &frames[t], mask_threshold)
            };
            let (next, frame) = step().map_err(|e| e.at_frame(t))?;
            outputs.push(frame);
            Ok((next, outputs))
        },
    )?;
    Ok(outputs)
}

#[cfg(test)]
#[path = "../../tests/unit/propagate/sequential.rs"]
mod tests;
