use super::*;
use crate::motion::field::DisplacementField;

struct Zero;

impl MotionEstimator for Zero {
    fn name(&self) -> &str {
        "zero"
    }

    fn estimate(&self, src: &Frame, _dst: &Frame) -> FlowpaintResult<DisplacementField> {
        Ok(DisplacementField::zeros(Dims::of_frame(src)))
    }
}

fn edit(dims: Dims) -> ReferenceEdit {
    let edited = Frame::from_pixel(dims.width, dims.height, image::Rgb([255, 0, 0]));
    let mask = image::GrayImage::from_fn(dims.width, dims.height, |x, y| {
        image::Luma([if x < 2 && y < 2 { 255 } else { 0 }])
    });
    ReferenceEdit::extract(&edited, &mask).unwrap()
}

#[test]
fn strategy_names_parse() {
    assert_eq!(
        "reference".parse::<PropagationStrategy>().unwrap(),
        PropagationStrategy::Reference
    );
    assert_eq!(
        " Sequential".parse::<PropagationStrategy>().unwrap(),
        PropagationStrategy::Sequential
    );
    assert!("chain".parse::<PropagationStrategy>().is_err());
    assert_eq!(PropagationStrategy::default(), PropagationStrategy::Reference);
}

#[test]
fn validate_inputs_reports_every_precondition() {
    let dims = Dims::new(4, 4);
    let frames = vec![Frame::new(4, 4); 3];
    let e = edit(dims);

    assert_eq!(validate_inputs(&frames, &e, 2, 0.5).unwrap(), dims);
    assert!(validate_inputs(&[], &e, 0, 0.5).is_err());
    assert!(validate_inputs(&frames, &e, 3, 0.5).is_err());
    assert!(validate_inputs(&frames, &e, 0, 1.5).is_err());
    assert!(validate_inputs(&frames, &edit(Dims::new(4, 5)), 0, 0.5).is_err());

    let mut uneven = frames.clone();
    uneven[1] = Frame::new(5, 4);
    let err = validate_inputs(&uneven, &e, 0, 0.5).unwrap_err();
    assert!(err.to_string().contains("frame 1"));
}

#[test]
fn both_strategies_agree_without_motion() {
    let dims = Dims::new(6, 5);
    let frames: Vec<Frame> = (0..4)
        .map(|t| Frame::from_pixel(6, 5, image::Rgb([t * 20, 40, 60])))
        .collect();
    let e = edit(dims);

    let mut opts = PropagationOptions::default();
    let by_reference = propagate(&frames, &e, 1, &Zero, &opts).unwrap();
    opts.strategy = PropagationStrategy::Sequential;
    let sequential = propagate(&frames, &e, 1, &Zero, &opts).unwrap();

    assert_eq!(by_reference, sequential);
    assert_eq!(by_reference.len(), frames.len());
    for (out, frame) in by_reference.iter().zip(&frames) {
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(5, 4), frame.get_pixel(5, 4));
    }
}
