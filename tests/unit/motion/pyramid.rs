use super::*;

fn plane(dims: Dims, f: impl Fn(u32, u32) -> f32) -> Raster {
    let mut data = Vec::new();
    for y in 0..dims.height {
        for x in 0..dims.width {
            data.push(f(x, y));
        }
    }
    Raster::from_vec(dims, 1, data).unwrap()
}

#[test]
fn luma_of_gray_frame_is_the_gray_value() {
    let frame = Frame::from_pixel(4, 2, image::Rgb([100, 100, 100]));
    let l = luma(&frame).unwrap();
    assert!(l.data().iter().all(|&v| (v - 100.0).abs() < 1e-3));
}

#[test]
fn blur_keeps_constant_planes_constant() {
    let p = plane(Dims::new(7, 5), |_, _| 42.0);
    let b = gaussian_blur(&p, 1.5).unwrap();
    assert!(b.data().iter().all(|&v| (v - 42.0).abs() < 1e-3));
    assert_eq!(gaussian_blur(&p, 0.0).unwrap(), p);
}

#[test]
fn pyramid_halves_until_min_side() {
    let p = plane(Dims::new(64, 40), |x, y| (x + y) as f32);
    let pyr = build_pyramid(p, 6, 1.0).unwrap();
    let sizes: Vec<Dims> = pyr.iter().map(|l| l.dims()).collect();
    assert_eq!(
        sizes,
        vec![Dims::new(64, 40), Dims::new(32, 20), Dims::new(16, 10)]
    );
    assert_eq!(build_pyramid(plane(Dims::new(9, 9), |_, _| 0.0), 4, 1.0).unwrap().len(), 1);
}

#[test]
fn gradients_of_a_ramp() {
    let p = plane(Dims::new(5, 4), |x, y| 3.0 * x as f32 + 2.0 * y as f32);
    let (gx, gy) = gradients(&p).unwrap();
    assert_eq!(gx.get(2, 1, 0), 3.0);
    assert_eq!(gy.get(2, 1, 0), 2.0);
    // One-sided at the edge.
    assert_eq!(gx.get(0, 0, 0), 1.5);
}

#[test]
fn box_sum_truncates_at_edges() {
    let p = plane(Dims::new(4, 3), |_, _| 1.0);
    let s = box_sum(&p, 1).unwrap();
    assert_eq!(s.get(1, 1, 0), 9.0);
    assert_eq!(s.get(0, 0, 0), 4.0);
    assert_eq!(s.get(3, 2, 0), 4.0);
    assert_eq!(s.get(3, 1, 0), 6.0);
}

#[test]
fn sample_clamped_interpolates_and_clamps() {
    let p = plane(Dims::new(3, 1), |x, _| x as f32 * 10.0);
    assert_eq!(sample_clamped(&p, 0.5, 0.0), 5.0);
    assert_eq!(sample_clamped(&p, -4.0, 0.0), 0.0);
    assert_eq!(sample_clamped(&p, 9.0, 3.0), 20.0);
}

#[test]
fn upsampling_a_uniform_field_scales_vectors() {
    let coarse = DisplacementField::uniform(Dims::new(8, 6), 1.5, -2.0);
    let fine = upsample_field(&coarse, Dims::new(16, 12)).unwrap();
    assert_eq!(fine.dims(), Dims::new(16, 12));
    assert!(fine.vectors().iter().all(|v| *v == [3.0, -4.0]));
}
