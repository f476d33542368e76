use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Dims, Frame};
use crate::foundation::error::{FlowpaintError, FlowpaintResult};
use crate::store::image_io::{load_rgb_image, save_png_atomic};

const FRAME_PREFIX: &str = "frame_";

/// Non-empty, equally sized frames plus the file index of the first one.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSequence {
    first_index: u64,
    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Checks that `frames` is non-empty, that every frame has the size of the first and that
    /// the last file index fits in a `u64`.
    pub fn new(first_index: u64, frames: Vec<Frame>) -> FlowpaintResult<Self> {
        check_uniform(&frames)?;
        if first_index.checked_add(frames.len() as u64 - 1).is_none() {
            return Err(FlowpaintError::validation(format!(
                "{} frames starting at index {first_index} overflow the frame numbering",
                frames.len()
            )));
        }
        Ok(Self {
            first_index,
            frames,
        })
    }

    /// File index of `frames()[0]`.
    pub fn first_index(&self) -> u64 {
        self.first_index
    }

    /// Frames in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Take the frames, dropping the index.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false for a constructed sequence.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Common frame size.
    pub fn dims(&self) -> Dims {
        self.frames
            .first()
            .map(Dims::of_frame)
            .unwrap_or(Dims::new(0, 0))
    }

    /// Same index range, new pixels.
    pub fn with_frames(&self, frames: Vec<Frame>) -> FlowpaintResult<Self> {
        if frames.len() != self.frames.len() {
            return Err(FlowpaintError::validation(format!(
                "expected {} frames, got {}",
                self.frames.len(),
                frames.len()
            )));
        }
        Self::new(self.first_index, frames)
    }
}

/// File name used for frame `index`.
pub fn frame_file_name(index: u64) -> String {
    format!("{FRAME_PREFIX}{index:03}.png")
}

/// Parse `frame_<digits>.png`; `None` for anything else.
fn parse_frame_name(name: &str) -> Option<u64> {
    let stem = name.strip_prefix(FRAME_PREFIX)?;
    let (digits, ext) = stem.rsplit_once('.')?;
    if !ext.eq_ignore_ascii_case("png")
        || digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// Load every `frame_<digits>.png` in `dir`, ordered by index.
///
/// Fails on a missing or empty directory, a PNG with another name, duplicate or missing
/// indices, an undecodable file, or frames of different sizes.
#[tracing::instrument(skip_all, fields(dir = %dir.as_ref().display()))]
pub fn load_frames(dir: impl AsRef<Path>) -> FlowpaintResult<FrameSequence> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(FlowpaintError::validation(format!(
            "frame directory '{}' does not exist",
            dir.display()
        )));
    }

    let mut indexed: Vec<(u64, PathBuf)> = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list frame directory '{}'", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list frame directory '{}'", dir.display()))?
            .path();
        if !path.is_file() || !is_png(&path) {
            continue;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let index = parse_frame_name(name).ok_or_else(|| {
            FlowpaintError::validation(format!(
                "unexpected image '{}' in frame directory (expected frame_<digits>.png)",
                path.display()
            ))
        })?;
        indexed.push((index, path));
    }

    if indexed.is_empty() {
        return Err(FlowpaintError::validation(format!(
            "no frame_<digits>.png files in '{}'",
            dir.display()
        )));
    }
    indexed.sort();

    for pair in indexed.windows(2) {
        let ((prev, _), (index, path)) = (&pair[0], &pair[1]);
        if index == prev {
            return Err(FlowpaintError::validation(format!(
                "frame index {index} appears twice (second file '{}')",
                path.display()
            )));
        }
        // Sorted and distinct, so `prev < index <= u64::MAX` and `prev + 1` cannot overflow.
        if *index != prev + 1 {
            return Err(FlowpaintError::validation(format!(
                "frame index {} is missing in '{}'",
                prev + 1,
                dir.display()
            )));
        }
    }
    let first_index = indexed[0].0;

    let frames = indexed
        .iter()
        .map(|(_, path)| load_rgb_image(path))
        .collect::<FlowpaintResult<Vec<_>>>()?;
    let seq = FrameSequence::new(first_index, frames)?;
    tracing::info!(
        frames = seq.len(),
        first_index,
        dims = %seq.dims(),
        "loaded frame sequence"
    );
    Ok(seq)
}

/// Write `seq` into `dir` as `frame_<index>.png`, replacing any frames already there.
///
/// Frames are encoded into a hidden staging directory next to `dir`, which only takes the place
/// of `dir` once every frame is written. A failed encode leaves `dir` as it was. Frame files of
/// an earlier sequence never survive a successful save; other files in `dir` are kept.
///
/// Returns the written paths in order.
#[tracing::instrument(skip_all, fields(dir = %dir.as_ref().display(), frames = seq.len()))]
pub fn save_frames(dir: impl AsRef<Path>, seq: &FrameSequence) -> FlowpaintResult<Vec<PathBuf>> {
    save_frames_with(dir.as_ref(), seq, save_png_atomic)
}

fn save_frames_with(
    dir: &Path,
    seq: &FrameSequence,
    mut write: impl FnMut(&Frame, &Path) -> FlowpaintResult<()>,
) -> FlowpaintResult<Vec<PathBuf>> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            FlowpaintError::validation(format!(
                "output directory '{}' has no usable name",
                dir.display()
            ))
        })?;
    if dir.exists() && !dir.is_dir() {
        return Err(FlowpaintError::validation(format!(
            "output path '{}' exists and is not a directory",
            dir.display()
        )));
    }
    let parent = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;

    let staging = parent.join(format!(".{name}.staging"));
    remove_dir_if_present(&staging)?;
    std::fs::create_dir(&staging)
        .with_context(|| format!("failed to create staging directory '{}'", staging.display()))?;

    let mut names = Vec::with_capacity(seq.len());
    for (offset, frame) in seq.frames().iter().enumerate() {
        let file = frame_file_name(seq.first_index() + offset as u64);
        if let Err(e) = write(frame, &staging.join(&file)) {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e.at_frame(offset));
        }
        names.push(file);
    }

    if dir.exists() {
        replace_dir(dir, &staging, &parent.join(format!(".{name}.previous")))?;
    } else {
        std::fs::rename(&staging, dir)
            .with_context(|| format!("failed to move frames into '{}'", dir.display()))?;
    }

    let written: Vec<PathBuf> = names.into_iter().map(|n| dir.join(n)).collect();
    tracing::info!(frames = written.len(), "saved frame sequence");
    Ok(written)
}

/// Swap the complete `staging` directory in for `dir`, carrying over entries of `dir` that are
/// not frame files.
fn replace_dir(dir: &Path, staging: &Path, previous: &Path) -> FlowpaintResult<()> {
    remove_dir_if_present(previous)?;
    std::fs::rename(dir, previous)
        .with_context(|| format!("failed to move aside '{}'", dir.display()))?;
    if let Err(e) = std::fs::rename(staging, dir) {
        let _ = std::fs::rename(previous, dir);
        let _ = std::fs::remove_dir_all(staging);
        return Err(anyhow::Error::new(e)
            .context(format!("failed to move frames into '{}'", dir.display()))
            .into());
    }

    let entries = std::fs::read_dir(previous)
        .with_context(|| format!("failed to list '{}'", previous.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list '{}'", previous.display()))?;
        let file_name = entry.file_name();
        let is_frame = file_name
            .to_str()
            .and_then(parse_frame_name)
            .is_some();
        if !is_frame {
            std::fs::rename(entry.path(), dir.join(&file_name)).with_context(|| {
                format!("failed to keep '{}'", entry.path().display())
            })?;
        }
    }
    remove_dir_if_present(previous)
}

fn remove_dir_if_present(path: &Path) -> FlowpaintResult<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove '{}'", path.display()))?;
    }
    Ok(())
}

fn check_uniform(frames: &[Frame]) -> FlowpaintResult<()> {
    let Some(first) = frames.first() else {
        return Err(FlowpaintError::validation("frame sequence is empty"));
    };
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
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/store/sequence.rs"]
mod tests;
