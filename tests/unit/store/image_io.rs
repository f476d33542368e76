use std::path::PathBuf;

use super::*;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_image_io").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn rgb_and_mask_loaders_convert_channels() {
    let dir = scratch("convert");
    let path = dir.join("color.png");
    image::RgbImage::from_pixel(3, 2, image::Rgb([255, 255, 255]))
        .save(&path)
        .unwrap();

    let rgb = load_rgb_image(&path).unwrap();
    assert_eq!(rgb.dimensions(), (3, 2));
    let mask = load_mask_image(&path).unwrap();
    assert_eq!(mask.get_pixel(2, 1).0, [255]);
}

#[test]
fn missing_and_garbage_files_are_reported() {
    let dir = scratch("errors");
    assert!(matches!(
        load_rgb_image(dir.join("absent.png")),
        Err(FlowpaintError::Validation(_))
    ));

    let junk = dir.join("junk.png");
    std::fs::write(&junk, b"not an image").unwrap();
    assert!(matches!(load_rgb_image(&junk), Err(FlowpaintError::Codec(_))));
    assert!(matches!(load_mask_image(&junk), Err(FlowpaintError::Codec(_))));
}

#[test]
fn atomic_save_leaves_only_the_final_file() {
    let dir = scratch("atomic");
    let path = dir.join("frame_000.png");
    let frame = Frame::from_pixel(4, 4, image::Rgb([1, 2, 3]));
    save_png_atomic(&frame, &path).unwrap();

    assert_eq!(load_rgb_image(&path).unwrap(), frame);
    let names: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("frame_000.png")]);
}
