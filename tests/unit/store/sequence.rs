use super::*;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_sequence").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_frame(dir: &Path, name: &str, w: u32, h: u32, shade: u8) {
    Frame::from_pixel(w, h, image::Rgb([shade, shade, shade]))
        .save(dir.join(name))
        .unwrap();
}

#[test]
fn frame_names_parse_strictly() {
    assert_eq!(parse_frame_name("frame_000.png"), Some(0));
    assert_eq!(parse_frame_name("frame_0042.PNG"), Some(42));
    assert_eq!(parse_frame_name("frame_7.png"), Some(7));
    assert_eq!(parse_frame_name("frame_.png"), None);
    assert_eq!(parse_frame_name("frame_1a.png"), None);
    assert_eq!(parse_frame_name("img_001.png"), None);
    assert_eq!(frame_file_name(5), "frame_005.png");
    assert_eq!(frame_file_name(1234), "frame_1234.png");
}

#[test]
fn loads_in_index_order_and_keeps_first_index() {
    let dir = scratch("ordered");
    write_frame(&dir, "frame_012.png", 5, 4, 12);
    write_frame(&dir, "frame_010.png", 5, 4, 10);
    write_frame(&dir, "frame_011.png", 5, 4, 11);
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let seq = load_frames(&dir).unwrap();
    assert_eq!(seq.first_index(), 10);
    assert_eq!(seq.len(), 3);
    assert_eq!(seq.dims(), Dims::new(5, 4));
    let shades: Vec<u8> = seq.frames().iter().map(|f| f.get_pixel(0, 0).0[0]).collect();
    assert_eq!(shades, vec![10, 11, 12]);
}

#[test]
fn rejects_bad_directories() {
    let missing = PathBuf::from("target").join("unit_sequence").join("does_not_exist");
    assert!(matches!(load_frames(&missing), Err(FlowpaintError::Validation(_))));

    let empty = scratch("empty");
    assert!(matches!(load_frames(&empty), Err(FlowpaintError::Validation(_))));

    let gap = scratch("gap");
    write_frame(&gap, "frame_000.png", 4, 4, 0);
    write_frame(&gap, "frame_002.png", 4, 4, 2);
    let err = load_frames(&gap).unwrap_err();
    assert!(err.to_string().contains("frame index 1 is missing"));

    let dup = scratch("duplicate");
    write_frame(&dup, "frame_1.png", 4, 4, 0);
    write_frame(&dup, "frame_001.png", 4, 4, 0);
    assert!(load_frames(&dup).unwrap_err().to_string().contains("twice"));

    let stray = scratch("stray");
    write_frame(&stray, "frame_000.png", 4, 4, 0);
    write_frame(&stray, "thumbnail.png", 4, 4, 0);
    assert!(matches!(load_frames(&stray), Err(FlowpaintError::Validation(_))));

    let sizes = scratch("sizes");
    write_frame(&sizes, "frame_000.png", 4, 4, 0);
    write_frame(&sizes, "frame_001.png", 6, 4, 0);
    assert!(matches!(load_frames(&sizes), Err(FlowpaintError::Validation(_))));

    let corrupt = scratch("corrupt");
    write_frame(&corrupt, "frame_000.png", 4, 4, 0);
    std::fs::write(corrupt.join("frame_001.png"), b"garbage").unwrap();
    assert!(matches!(load_frames(&corrupt), Err(FlowpaintError::Codec(_))));
}

#[test]
fn save_then_load_keeps_indices_and_pixels() {
    let dir = scratch("save");
    let frames: Vec<Frame> = (0..3u8)
        .map(|t| Frame::from_pixel(3, 3, image::Rgb([t, 2 * t, 3 * t])))
        .collect();
    let seq = FrameSequence::new(7, frames).unwrap();

    let written = save_frames(dir.join("out"), &seq).unwrap();
    assert_eq!(
        written.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect::<Vec<_>>(),
        vec!["frame_007.png", "frame_008.png", "frame_009.png"]
    );
    assert_eq!(load_frames(dir.join("out")).unwrap(), seq);
}

#[test]
fn sequences_must_be_uniform() {
    assert!(FrameSequence::new(0, Vec::new()).is_err());
    let mixed = vec![Frame::new(2, 2), Frame::new(3, 2)];
    assert!(FrameSequence::new(0, mixed).is_err());

    let seq = FrameSequence::new(3, vec![Frame::new(2, 2); 2]).unwrap();
    assert!(seq.with_frames(vec![Frame::new(2, 2)]).is_err());
    assert_eq!(seq.with_frames(vec![Frame::new(2, 2); 2]).unwrap().first_index(), 3);
}

fn solid(n: usize, shade: u8) -> FrameSequence {
    FrameSequence::new(0, vec![Frame::from_pixel(3, 2, image::Rgb([shade; 3])); n]).unwrap()
}

fn leftovers(parent: &Path) -> Vec<String> {
    std::fs::read_dir(parent)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with('.'))
        .collect()
}

#[test]
fn shorter_save_replaces_a_longer_sequence() {
    let root = scratch("replace");
    let dir = root.join("out");
    save_frames(&dir, &solid(3, 1)).unwrap();
    std::fs::write(dir.join("notes.txt"), "kept").unwrap();

    let written = save_frames(&dir, &solid(2, 9)).unwrap();
    assert_eq!(written.len(), 2);

    let back = load_frames(&dir).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back.frames()[1].get_pixel(2, 1).0, [9, 9, 9]);
    assert!(!dir.join("frame_002.png").exists());
    assert_eq!(std::fs::read_to_string(dir.join("notes.txt")).unwrap(), "kept");
    assert!(leftovers(&root).is_empty());
}

#[test]
fn failed_encode_keeps_the_previous_sequence() {
    let root = scratch("failed_encode");
    let dir = root.join("out");
    save_frames(&dir, &solid(3, 1)).unwrap();

    let mut calls = 0;
    let err = save_frames_with(&dir, &solid(3, 9), |frame, path| {
        calls += 1;
        if calls == 2 {
            return Err(FlowpaintError::codec("disk full"));
        }
        save_png_atomic(frame, path)
    })
    .unwrap_err();
    assert!(matches!(err, FlowpaintError::Codec(_)));
    assert!(err.to_string().contains("frame 1"));

    let back = load_frames(&dir).unwrap();
    assert_eq!(back, solid(3, 1));
    assert!(leftovers(&root).is_empty());
}

#[test]
fn failed_first_save_creates_nothing() {
    let root = scratch("failed_fresh");
    let dir = root.join("out");
    let err = save_frames_with(&dir, &solid(2, 5), |_, _| Err(FlowpaintError::codec("boom")));
    assert!(err.is_err());
    assert!(!dir.exists());
    assert!(leftovers(&root).is_empty());
}

#[test]
fn indices_at_the_top_of_the_range_do_not_overflow() {
    let dir = scratch("max_index");
    write_frame(&dir, "frame_18446744073709551615.png", 4, 4, 0);
    write_frame(&dir, "frame_018446744073709551615.png", 4, 4, 0);
    let err = load_frames(&dir).unwrap_err();
    assert!(matches!(err, FlowpaintError::Validation(_)));
    assert!(err.to_string().contains("twice"));

    let one = vec![Frame::new(2, 2)];
    assert!(FrameSequence::new(u64::MAX, one).is_ok());
    let two = vec![Frame::new(2, 2); 2];
    assert!(matches!(
        FrameSequence::new(u64::MAX, two),
        Err(FlowpaintError::Validation(_))
    ));
}
