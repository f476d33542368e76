use super::*;

#[test]
fn method_names_round_trip() {
    for m in MotionMethod::ALL {
        assert_eq!(MotionMethod::parse(m.name()).unwrap(), m);
        assert_eq!(m.to_string().parse::<MotionMethod>().unwrap(), m);
    }
    assert_eq!(
        MotionMethod::parse(" Inverse-Search ").unwrap(),
        MotionMethod::InverseSearch
    );
}

#[test]
fn unknown_method_is_a_method_error() {
    let err = MotionMethod::parse("farneback").unwrap_err();
    assert!(matches!(err, FlowpaintError::Method(_)));
    assert!(err.to_string().contains("pyramidal"));
    assert!(err.to_string().contains("inverse-search"));

    let frame = Frame::new(4, 4);
    assert!(matches!(
        estimate_motion(&frame, &frame, "raft"),
        Err(FlowpaintError::Method(_))
    ));
}

#[test]
fn method_serde_uses_names() {
    let json = serde_json::to_string(&MotionMethod::InverseSearch).unwrap();
    assert_eq!(json, "\"inverse-search\"");
    let back: MotionMethod = serde_json::from_str("\"pyramidal\"").unwrap();
    assert_eq!(back, MotionMethod::Pyramidal);
    assert!(serde_json::from_str::<MotionMethod>("\"custom\"").is_err());
}

#[test]
fn factory_builds_the_named_estimator() {
    for m in MotionMethod::ALL {
        assert_eq!(create_estimator(m).name(), m.name());
    }
}

#[test]
fn estimate_motion_returns_frame_sized_fields() {
    let frame = Frame::from_fn(20, 12, |x, y| image::Rgb([(x * 12) as u8, (y * 20) as u8, 0]));
    for m in MotionMethod::ALL {
        let field = estimate_motion(&frame, &frame, m.name()).unwrap();
        assert_eq!(field.dims(), Dims::new(20, 12));
        assert!(field.is_zero());
    }
}

#[test]
fn check_pair_rejects_empty_and_mismatched() {
    assert!(check_pair(&Frame::new(0, 0), &Frame::new(0, 0)).is_err());
    assert!(check_pair(&Frame::new(2, 2), &Frame::new(2, 3)).is_err());
    assert_eq!(
        check_pair(&Frame::new(2, 3), &Frame::new(2, 3)).unwrap(),
        Dims::new(2, 3)
    );
}
