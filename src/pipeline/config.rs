use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::foundation::error::{FlowpaintError, FlowpaintResult};
use crate::motion::estimator::MotionMethod;
use crate::propagate::{PropagationOptions, PropagationStrategy, PropagationThreading};
use crate::warp::DEFAULT_MASK_THRESHOLD;

fn default_mask_threshold() -> f32 {
    DEFAULT_MASK_THRESHOLD
}

/// Immutable description of one pipeline run.
///
/// Every path is required. `reference_index` is the 0-based position of the reference frame in
/// the loaded sequence, not its file number.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding `frame_<digits>.png` inputs.
    pub frames_dir: PathBuf,
    /// Position of the edited frame in the sequence.
    pub reference_index: usize,
    /// The reference frame with the edit applied.
    pub edited_reference: PathBuf,
    /// Single-channel mask of the edited region.
    pub mask: PathBuf,
    /// Motion estimation method.
    pub method: MotionMethod,
    /// Where propagated frames are written.
    pub output_dir: PathBuf,
    /// Optional MP4 assembled from the propagated frames.
    #[serde(default)]
    pub video: Option<PathBuf>,
    /// Frame rate of the exported video.
    pub fps: u32,
    /// Propagation strategy.
    #[serde(default)]
    pub strategy: PropagationStrategy,
    /// Re-binarization threshold for warped masks.
    #[serde(default = "default_mask_threshold")]
    pub mask_threshold: f32,
    /// Frame-level parallelism.
    #[serde(default)]
    pub threading: PropagationThreading,
}

impl PipelineConfig {
    /// Parse a JSON config. An unknown method name is a [`FlowpaintError::Method`] error.
    pub fn from_reader<R: std::io::Read>(r: R) -> FlowpaintResult<Self> {
        let value: serde_json::Value = serde_json::from_reader(r)
            .map_err(|e| FlowpaintError::validation(format!("parse pipeline config JSON: {e}")))?;
        if let Some(name) = value.get("method").and_then(serde_json::Value::as_str) {
            MotionMethod::parse(name)?;
        }
        serde_json::from_value(value)
            .map_err(|e| FlowpaintError::validation(format!("parse pipeline config JSON: {e}")))
    }

    /// Parse a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> FlowpaintResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FlowpaintError::validation(format!("open pipeline config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Value checks that need no filesystem access.
    pub fn validate(&self) -> FlowpaintResult<()> {
        if self.fps == 0 {
            return Err(FlowpaintError::validation("fps must be > 0"));
        }
        if !(self.mask_threshold > 0.0 && self.mask_threshold < 1.0) {
            return Err(FlowpaintError::validation(format!(
                "mask_threshold must be in (0, 1), got {}",
                self.mask_threshold
            )));
        }
        if self.threading.threads == Some(0) {
            return Err(FlowpaintError::validation(
                "threading.threads must be >= 1 when set",
            ));
        }
        for (name, path) in [
            ("frames_dir", &self.frames_dir),
            ("edited_reference", &self.edited_reference),
            ("mask", &self.mask),
            ("output_dir", &self.output_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(FlowpaintError::validation(format!("{name} must not be empty")));
            }
        }
        if self
            .video
            .as_ref()
            .is_some_and(|v| v.as_os_str().is_empty())
        {
            return Err(FlowpaintError::validation("video path must not be empty"));
        }
        Ok(())
    }

    /// Engine options derived from this config.
    pub fn propagation_options(&self) -> PropagationOptions {
        PropagationOptions {
            strategy: self.strategy,
            mask_threshold: self.mask_threshold,
            threading: self.threading.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/pipeline_config.rs"]
mod tests;
