//! flowpaint propagates a single-frame edit (typically a logo) across a video.
//!
//! The edit is made once on a reference frame. For every other frame a dense motion field is
//! estimated, the edit is pulled into that frame's coordinates with the field, and the result is
//! composited over the original pixels.
//!
//! Field convention: a field from `A` to `B` lives in `A`'s coordinates and satisfies
//! `A(x) ~ B(x + field(x))`. Every warp samples its input at `x + field(x)` ("pull" warp).
//!
//! Main entry points:
//! - [`run_pipeline`]: load frames, propagate, save, optionally export an MP4.
//! - [`propagate`]: the propagation engine over in-memory frames.
//! - [`warp`] / [`warp_mask`]: field-driven resampling.
//! - [`create_estimator`]: built-in motion estimators selected by [`MotionMethod`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod edit;
mod encode;
mod foundation;
mod motion;
mod pipeline;
mod propagate;
mod store;
mod warp;

pub use edit::composite::composite;
pub use edit::extract::ReferenceEdit;
pub use encode::ffmpeg::{
    EncodeConfig, FfmpegEncoder, export_video, export_video_from_dir, is_ffmpeg_on_path,
};
pub use foundation::core::{Dims, Frame, Mask, Raster};
pub use foundation::error::{FlowpaintError, FlowpaintResult};
pub use motion::estimator::{MotionEstimator, MotionMethod, create_estimator, estimate_motion};
pub use motion::field::{DisplacementField, FieldStats};
pub use motion::inverse_search::{InverseSearch, InverseSearchParams};
pub use motion::lucas_kanade::{PyramidalLk, PyramidalLkParams};
pub use pipeline::config::PipelineConfig;
pub use pipeline::run::{PipelineReport, run_pipeline, run_pipeline_with};
pub use propagate::reference::{propagate_reference, reference_output};
pub use propagate::sequential::{CarriedEdit, propagate_sequential};
pub use propagate::{PropagationOptions, PropagationStrategy, PropagationThreading, propagate};
pub use store::image_io::{load_mask_image, load_rgb_image};
pub use store::sequence::{FrameSequence, frame_file_name, load_frames, save_frames};
pub use warp::{BorderMode, DEFAULT_MASK_THRESHOLD, Interpolation, warp, warp_mask, warp_mask_soft};
