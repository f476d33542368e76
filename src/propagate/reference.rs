use rayon::prelude::*;

use crate::edit::composite::composite;
use crate::edit::extract::ReferenceEdit;
use crate::foundation::core::{Dims, Frame};
use crate::foundation::error::{FlowpaintError, FlowpaintResult};
use crate::motion::estimator::MotionEstimator;
use crate::propagate::{PropagationThreading, validate_inputs};
use crate::warp::{BorderMode, Interpolation, warp, warp_mask};

/// Reference-based propagation: frame `t` gets the edit warped by `motion(frame_t -> reference)`.
///
/// The reference frame itself is composited straight from the edit, without any field.
pub fn propagate_reference(
    frames: &[Frame],
    edit: &ReferenceEdit,
    reference_index: usize,
    estimator: &dyn MotionEstimator,
    mask_threshold: f32,
    threading: &PropagationThreading,
) -> FlowpaintResult<Vec<Frame>> {
    let dims = validate_inputs(frames, edit, reference_index, mask_threshold)?;
    let reference = &frames[reference_index];

    let job = |t: usize| -> FlowpaintResult<Frame> {
        if t == reference_index {
            return reference_output(edit, reference);
        }
        propagate_frame(t, &frames[t], reference, edit, estimator, mask_threshold, dims)
            .map_err(|e| e.at_frame(t))
    };

    if !threading.parallel {
        return (0..frames.len()).map(job).collect();
    }

    let pool = build_thread_pool(threading.threads)?;
    tracing::debug!(threads = pool.current_num_threads(), "propagating in parallel");
    pool.install(|| (0..frames.len()).into_par_iter().map(job).collect())
}

/// Output for the reference frame: `mask * logo + (1 - mask) * reference`.
pub fn reference_output(edit: &ReferenceEdit, reference: &Frame) -> FlowpaintResult<Frame> {
    composite(edit.logo(), edit.mask(), reference)
}

fn propagate_frame(
    t: usize,
    frame: &Frame,
    reference: &Frame,
    edit: &ReferenceEdit,
    estimator: &dyn MotionEstimator,
    mask_threshold: f32,
    dims: Dims,
) -> FlowpaintResult<Frame> {
    let field = estimator.estimate(frame, reference)?;
    field.validate_for(dims)?;
    let stats = field.stats();
    tracing::debug!(
        frame = t,
        mean = stats.mean_magnitude,
        max = stats.max_magnitude,
        "field to reference"
    );

    let logo = warp(edit.logo(), &field, Interpolation::Bilinear, BorderMode::Reflect)?;
    let mask = warp_mask(edit.mask(), &field, mask_threshold)?;
    composite(&logo, &mask, frame)
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> FlowpaintResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FlowpaintError::validation(
            "propagation threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| FlowpaintError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/propagate/reference.rs"]
mod tests;
