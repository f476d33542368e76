use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::foundation::core::{Dims, Frame};
use crate::foundation::error::{FlowpaintError, FlowpaintResult};
use crate::store::sequence::load_frames;

/// Settings for one MP4 encode.
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    /// Frame size of the incoming RGB frames.
    pub dims: Dims,
    /// Output frame rate.
    pub fps: u32,
    /// Destination file.
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`.
    pub overwrite: bool,
}

impl EncodeConfig {
    /// Overwriting MP4 output.
    pub fn mp4(out_path: impl Into<PathBuf>, dims: Dims, fps: u32) -> Self {
        Self {
            dims,
            fps,
            out_path: out_path.into(),
            overwrite: true,
        }
    }

    /// Reject zero sizes and a zero frame rate.
    pub fn validate(&self) -> FlowpaintResult<()> {
        if self.dims.is_empty() {
            return Err(FlowpaintError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(FlowpaintError::validation("encode fps must be non-zero"));
        }
        Ok(())
    }
}

/// yuv420p needs even sizes; odd frames get one black row/column of padding.
fn pad_filter(dims: Dims) -> Option<&'static str> {
    if dims.width.is_multiple_of(2) && dims.height.is_multiple_of(2) {
        None
    } else {
        Some("pad=ceil(iw/2)*2:ceil(ih/2)*2")
    }
}

/// Whether an `ffmpeg` binary can be started.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub(crate) fn ensure_parent_dir(path: &Path) -> FlowpaintResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams raw RGB24 frames into a system `ffmpeg` process.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfmpegEncoder {
    /// Spawn `ffmpeg` for `cfg`.
    pub fn new(cfg: EncodeConfig) -> FlowpaintResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(FlowpaintError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(FlowpaintError::codec(
                "ffmpeg is required for MP4 export, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if cfg.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &cfg.dims.to_string(),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
        ]);
        if let Some(filter) = pad_filter(cfg.dims) {
            cmd.args(["-vf", filter]);
        }
        cmd.args([
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd
            .spawn()
            .map_err(|e| FlowpaintError::codec(format!("failed to spawn ffmpeg: {e}")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FlowpaintError::codec("failed to open ffmpeg stdin"))?;

        Ok(Self {
            cfg,
            child,
            stdin: Some(stdin),
        })
    }

    /// Write one frame; its size must match the configured one.
    pub fn encode_frame(&mut self, frame: &Frame) -> FlowpaintResult<()> {
        let dims = Dims::of_frame(frame);
        if dims != self.cfg.dims {
            return Err(FlowpaintError::validation(format!(
                "frame size mismatch: got {dims}, expected {}",
                self.cfg.dims
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(FlowpaintError::codec("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(frame.as_raw()).map_err(|e| {
            FlowpaintError::codec(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    /// Close the pipe and wait for ffmpeg; a non-zero exit is a codec error.
    pub fn finish(mut self) -> FlowpaintResult<()> {
        drop(self.stdin.take());

        let output = self.child.wait_with_output().map_err(|e| {
            FlowpaintError::codec(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FlowpaintError::codec(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Encode `frames` into an MP4 at `out_path`.
#[tracing::instrument(
    skip(frames, out_path),
    fields(frames = frames.len(), out = %out_path.as_ref().display())
)]
pub fn export_video(
    frames: &[Frame],
    out_path: impl AsRef<Path>,
    fps: u32,
) -> FlowpaintResult<()> {
    let Some(first) = frames.first() else {
        return Err(FlowpaintError::validation("cannot export an empty frame sequence"));
    };
    let dims = Dims::of_frame(first);
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

    let mut enc = FfmpegEncoder::new(EncodeConfig::mp4(out_path.as_ref(), dims, fps))?;
    for (i, frame) in frames.iter().enumerate() {
        enc.encode_frame(frame).map_err(|e| e.at_frame(i))?;
    }
    enc.finish()?;
    tracing::info!(dims = %dims, fps, "video exported");
    Ok(())
}

/// Load a saved sequence from `frames_dir` and encode it.
pub fn export_video_from_dir(
    frames_dir: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
    fps: u32,
) -> FlowpaintResult<()> {
    let seq = load_frames(frames_dir)?;
    export_video(seq.frames(), out_path, fps)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
