use super::*;

#[test]
fn config_validation_catches_bad_values() {
    assert!(
        EncodeConfig::mp4("target/out.mp4", Dims::new(0, 10), 30)
            .validate()
            .is_err()
    );
    assert!(
        EncodeConfig::mp4("target/out.mp4", Dims::new(10, 10), 0)
            .validate()
            .is_err()
    );
    // Odd sizes are padded rather than rejected.
    assert!(
        EncodeConfig::mp4("target/out.mp4", Dims::new(11, 9), 24)
            .validate()
            .is_ok()
    );
}

#[test]
fn odd_sizes_get_a_pad_filter() {
    assert_eq!(pad_filter(Dims::new(10, 8)), None);
    assert!(pad_filter(Dims::new(11, 8)).is_some());
    assert!(pad_filter(Dims::new(10, 7)).is_some());
}

#[test]
fn export_rejects_empty_and_uneven_sequences_before_spawning() {
    let out = PathBuf::from("target").join("unit_ffmpeg").join("never.mp4");
    assert!(matches!(
        export_video(&[], &out, 24),
        Err(FlowpaintError::Validation(_))
    ));

    let uneven = vec![Frame::new(4, 4), Frame::new(4, 6)];
    let err = export_video(&uneven, &out, 24).unwrap_err();
    assert!(matches!(err, FlowpaintError::Validation(_)));
    assert!(err.to_string().contains("frame 1"));
    assert!(!out.exists());
}

#[test]
fn export_from_missing_dir_is_a_validation_error() {
    let missing = PathBuf::from("target").join("unit_ffmpeg").join("no_frames_here");
    assert!(matches!(
        export_video_from_dir(&missing, missing.join("out.mp4"), 24),
        Err(FlowpaintError::Validation(_))
    ));
}
