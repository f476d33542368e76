//! Propagation of a reference edit across a frame sequence.
//!
//! Two strategies are offered:
//!
//! - [`PropagationStrategy::Reference`]: every frame is warped directly from the reference
//!   edit using the field `frame_t -> reference`. Frames are independent and can run in
//!   parallel; each frame carries one estimation and one resampling error.
//! - [`PropagationStrategy::Sequential`]: the edit is carried frame to frame using fields
//!   between neighbours. Each step consumes the previous step's output, so this strategy is a
//!   serialization point and accumulates resampling error along the chain.

use std::{fmt, str::FromStr};

use crate::edit::extract::ReferenceEdit;
use crate::foundation::core::{Dims, Frame};
use crate::foundation::error::{FlowpaintError, FlowpaintResult};
use crate::motion::estimator::MotionEstimator;
use crate::warp::{DEFAULT_MASK_THRESHOLD, check_threshold};

pub(crate) mod reference;
pub(crate) mod sequential;

/// How the edit travels through the sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropagationStrategy {
    /// Warp every frame directly from the reference edit.
    #[default]
    Reference,
    /// Carry the warped edit from neighbour to neighbour.
    Sequential,
}

impl PropagationStrategy {
    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            PropagationStrategy::Reference => "reference",
            PropagationStrategy::Sequential => "sequential",
        }
    }
}

impl fmt::Display for PropagationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PropagationStrategy {
    type Err = FlowpaintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reference" => Ok(PropagationStrategy::Reference),
            "sequential" => Ok(PropagationStrategy::Sequential),
            other => Err(FlowpaintError::validation(format!(
                "unknown propagation strategy '{other}' (expected 'reference' or 'sequential')"
            ))),
        }
    }
}

/// Frame-level parallelism for reference-based propagation.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PropagationThreading {
    /// Process frames on a rayon pool.
    pub parallel: bool,
    /// Worker count; `None` uses rayon's default.
    pub threads: Option<usize>,
}

/// Everything the engine needs besides the frames, the edit and the estimator.
#[derive(Clone, Debug, PartialEq)]
pub struct PropagationOptions {
    /// Strategy to run.
    pub strategy: PropagationStrategy,
    /// Re-binarization threshold for warped masks.
    pub mask_threshold: f32,
    /// Parallelism (reference strategy only).
    pub threading: PropagationThreading,
}

impl Default for PropagationOptions {
    fn default() -> Self {
        Self {
            strategy: PropagationStrategy::Reference,
            mask_threshold: DEFAULT_MASK_THRESHOLD,
            threading: PropagationThreading::default(),
        }
    }
}

/// Propagate `edit` (made on `frames[reference_index]`) to every frame.
///
/// The output has one frame per input frame, in the same order. Any failing frame aborts the
/// whole call.
#[tracing::instrument(
    skip(frames, edit, estimator, opts),
    fields(frames = frames.len(), strategy = %opts.strategy, estimator = estimator.name())
)]
pub fn propagate(
    frames: &[Frame],
    edit: &ReferenceEdit,
    reference_index: usize,
    estimator: &dyn MotionEstimator,
    opts: &PropagationOptions,
) -> FlowpaintResult<Vec<Frame>> {
    match opts.strategy {
        PropagationStrategy::Reference => reference::propagate_reference(
            frames,
            edit,
            reference_index,
            estimator,
            opts.mask_threshold,
            &opts.threading,
        ),
        PropagationStrategy::Sequential => sequential::propagate_sequential(
            frames,
            edit,
            reference_index,
            estimator,
            opts.mask_threshold,
        ),
    }
}

/// Checks shared by both strategies; returns the common frame size.
pub(crate) fn validate_inputs(
    frames: &[Frame],
    edit: &ReferenceEdit,
    reference_index: usize,
    mask_threshold: f32,
) -> FlowpaintResult<Dims> {
    check_threshold(mask_threshold)?;
    let Some(first) = frames.first() else {
        return Err(FlowpaintError::validation("frame sequence is empty"));
    };
    if reference_index >= frames.len() {
        return Err(FlowpaintError::validation(format!(
            "reference index {reference_index} is out of range for {} frames",
            frames.len()
        )));
    }
    let dims = Dims::of_frame(first);
    if dims.is_empty() {
        return Err(FlowpaintError::validation("frames must not be empty images"));
    }
    if let Some((i, f)) = frames
        .iter()
        .enumerate()
        .find(|(_, f)| Dims::of_frame(f) != dims)
    {
        return Err(FlowpaintError::validation(format!(
            "frame {i} is {} but frame 0 is {dims}",
            Dims::of_frame(f)
        )));
    }
    if edit.dims() != dims {
        return Err(FlowpaintError::validation(format!(
            "reference edit is {} but frames are {dims}",
            edit.dims()
        )));
    }
    Ok(dims)
}

#[cfg(test)]
#[path = "../../tests/unit/propagate/mod.rs"]
mod tests;
