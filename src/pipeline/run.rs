use std::path::PathBuf;

use crate::edit::extract::ReferenceEdit;
use crate::encode::ffmpeg::export_video;
use crate::foundation::core::Dims;
use crate::foundation::error::{FlowpaintError, FlowpaintResult};
use crate::motion::estimator::{MotionEstimator, MotionMethod, create_estimator};
use crate::pipeline::config::PipelineConfig;
use crate::propagate::{PropagationStrategy, propagate};
use crate::store::image_io::{load_mask_image, load_rgb_image};
use crate::store::sequence::{load_frames, save_frames};

/// What a finished run produced.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PipelineReport {
    /// Number of frames processed (and written).
    pub frames: usize,
    /// File index of the first frame.
    pub first_index: u64,
    /// Frame size.
    pub dims: Dims,
    /// Position of the reference frame.
    pub reference_index: usize,
    /// Strategy that ran.
    pub strategy: PropagationStrategy,
    /// Estimation method named by the config.
    pub method: MotionMethod,
    /// Written frame files, in order.
    pub output_frames: Vec<PathBuf>,
    /// Exported video, if one was requested.
    pub video: Option<PathBuf>,
}

/// Run the whole pipeline described by `cfg` with the built-in estimator it names.
pub fn run_pipeline(cfg: &PipelineConfig) -> FlowpaintResult<PipelineReport> {
    let estimator = create_estimator(cfg.method);
    run_pipeline_with(cfg, estimator.as_ref())
}

/// Same as [`run_pipeline`] with a caller-supplied estimator in place of `cfg.method`.
///
/// All inputs are loaded and checked before the first field is estimated.
#[tracing::instrument(
    skip_all,
    fields(frames_dir = %cfg.frames_dir.display(), estimator = estimator.name())
)]
pub fn run_pipeline_with(
    cfg: &PipelineConfig,
    estimator: &dyn MotionEstimator,
) -> FlowpaintResult<PipelineReport> {
    cfg.validate()?;

    let seq = load_frames(&cfg.frames_dir)?;
    if seq.len() < 2 {
        return Err(FlowpaintError::validation(format!(
            "at least two frames are required, found {} in '{}'",
            seq.len(),
            cfg.frames_dir.display()
        )));
    }
    if cfg.reference_index >= seq.len() {
        return Err(FlowpaintError::validation(format!(
            "reference index {} is out of range for {} frames",
            cfg.reference_index,
            seq.len()
        )));
    }

    let dims = seq.dims();
    let edited = load_rgb_image(&cfg.edited_reference)?;
    if Dims::of_frame(&edited) != dims {
        return Err(FlowpaintError::validation(format!(
            "edited reference '{}' is {} but frames are {dims}",
            cfg.edited_reference.display(),
            Dims::of_frame(&edited)
        )));
    }
    let mask = load_mask_image(&cfg.mask)?;
    let mask_dims = Dims::new(mask.width(), mask.height());
    if mask_dims != dims {
        return Err(FlowpaintError::validation(format!(
            "mask '{}' is {mask_dims} but frames are {dims}",
            cfg.mask.display()
        )));
    }

    let edit = ReferenceEdit::extract(&edited, &mask)?;
    tracing::info!(
        coverage = edit.mask().coverage(),
        reference_index = cfg.reference_index,
        "reference edit extracted"
    );

    let opts = cfg.propagation_options();
    let outputs = propagate(seq.frames(), &edit, cfg.reference_index, estimator, &opts)?;
    let out_seq = seq.with_frames(outputs)?;
    let output_frames = save_frames(&cfg.output_dir, &out_seq)?;

    if let Some(video) = &cfg.video {
        export_video(out_seq.frames(), video, cfg.fps)?;
    }

    let report = PipelineReport {
        frames: seq.len(),
        first_index: seq.first_index(),
        dims,
        reference_index: cfg.reference_index,
        strategy: cfg.strategy,
        method: cfg.method,
        output_frames,
        video: cfg.video.clone(),
    };
    tracing::info!(
        frames = report.frames,
        dims = %report.dims,
        strategy = %report.strategy,
        method = %report.method,
        output_dir = %cfg.output_dir.display(),
        "pipeline finished"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/config/pipeline_run.rs"]
mod tests;
