use std::path::Path;

use super::*;
use crate::foundation::core::Frame;
use crate::motion::field::DisplacementField;
use crate::propagate::PropagationThreading;
use crate::store::sequence::{FrameSequence, frame_file_name};

struct Still;

impl MotionEstimator for Still {
    fn name(&self) -> &str {
        "still"
    }

    fn estimate(&self, src: &Frame, _dst: &Frame) -> FlowpaintResult<DisplacementField> {
        Ok(DisplacementField::zeros(Dims::of_frame(src)))
    }
}

/// Fails the test if any field is requested.
struct Untouchable;

impl MotionEstimator for Untouchable {
    fn name(&self) -> &str {
        "untouchable"
    }

    fn estimate(&self, _src: &Frame, _dst: &Frame) -> FlowpaintResult<DisplacementField> {
        panic!("motion was estimated before inputs were validated");
    }
}

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_pipeline").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Writes `n` grey 8x6 frames starting at file index 4, an all-red edited reference and a
/// mask covering the 2x2 top-left corner.
fn fixture(dir: &Path, n: u8) -> PipelineConfig {
    let frames_dir = dir.join("frames");
    let frames = (0..n)
        .map(|_| Frame::from_pixel(8, 6, image::Rgb([90, 90, 90])))
        .collect();
    save_frames(&frames_dir, &FrameSequence::new(4, frames).unwrap()).unwrap();

    Frame::from_pixel(8, 6, image::Rgb([255, 0, 0]))
        .save(dir.join("edited.png"))
        .unwrap();
    image::GrayImage::from_fn(8, 6, |x, y| image::Luma([if x < 2 && y < 2 { 255 } else { 0 }]))
        .save(dir.join("mask.png"))
        .unwrap();

    PipelineConfig {
        frames_dir,
        reference_index: 1,
        edited_reference: dir.join("edited.png"),
        mask: dir.join("mask.png"),
        method: MotionMethod::Pyramidal,
        output_dir: dir.join("out"),
        video: None,
        fps: 12,
        strategy: PropagationStrategy::Reference,
        mask_threshold: 0.5,
        threading: PropagationThreading::default(),
    }
}

#[test]
fn run_writes_every_frame_with_original_indices() {
    let dir = scratch("happy");
    let cfg = fixture(&dir, 3);
    let report = run_pipeline_with(&cfg, &Still).unwrap();

    assert_eq!(report.frames, 3);
    assert_eq!(report.first_index, 4);
    assert_eq!(report.dims, Dims::new(8, 6));
    assert_eq!(report.video, None);
    let names: Vec<_> = report
        .output_frames
        .iter()
        .map(|p| p.file_name().unwrap().to_owned())
        .collect();
    let expected: Vec<std::ffi::OsString> = (4..7).map(|i| frame_file_name(i).into()).collect();
    assert_eq!(names, expected);

    for path in &report.output_frames {
        let out = load_rgb_image(path).unwrap();
        assert_eq!(out.get_pixel(1, 1).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(2, 2).0, [90, 90, 90]);
    }
}

#[test]
fn builtin_method_runs_end_to_end() {
    let dir = scratch("builtin");
    let mut cfg = fixture(&dir, 2);
    cfg.strategy = PropagationStrategy::Sequential;
    let report = run_pipeline(&cfg).unwrap();
    assert_eq!(report.method, MotionMethod::Pyramidal);
    assert_eq!(report.output_frames.len(), 2);
}

#[test]
fn inputs_are_checked_before_any_estimation() {
    let dir = scratch("single");
    let cfg = fixture(&dir, 1);
    let err = run_pipeline_with(&cfg, &Untouchable).unwrap_err();
    assert!(err.to_string().contains("at least two frames"));

    let dir = scratch("range");
    let mut cfg = fixture(&dir, 3);
    cfg.reference_index = 3;
    assert!(matches!(
        run_pipeline_with(&cfg, &Untouchable),
        Err(FlowpaintError::Validation(_))
    ));

    let dir = scratch("mask_size");
    let cfg = fixture(&dir, 3);
    image::GrayImage::new(4, 4).save(&cfg.mask).unwrap();
    let err = run_pipeline_with(&cfg, &Untouchable).unwrap_err();
    assert!(err.to_string().contains("mask"));

    let dir = scratch("missing_edit");
    let cfg = fixture(&dir, 3);
    std::fs::remove_file(&cfg.edited_reference).unwrap();
    assert!(run_pipeline_with(&cfg, &Untouchable).is_err());
    assert!(!cfg.output_dir.exists());
}
