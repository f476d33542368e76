use crate::foundation::core::{Dims, Frame, Raster};
use crate::foundation::error::{FlowpaintError, FlowpaintResult};
use crate::motion::field::DisplacementField;

/// Smallest side a pyramid level may have.
pub(crate) const MIN_LEVEL_SIDE: u32 = 8;

/// Rec.601 luma plane in the 0..=255 range.
pub(crate) fn luma(frame: &Frame) -> FlowpaintResult<Raster> {
    let dims = Dims::of_frame(frame);
    let data = frame
        .pixels()
        .map(|p| {
            0.299 * f32::from(p.0[0]) + 0.587 * f32::from(p.0[1]) + 0.114 * f32::from(p.0[2])
        })
        .collect();
    Raster::from_vec(dims, 1, data)
}

/// Separable Gaussian blur with edge clamping. `sigma <= 0` returns a copy.
pub(crate) fn gaussian_blur(plane: &Raster, sigma: f32) -> FlowpaintResult<Raster> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Ok(plane.clone());
    }
    let kernel = gaussian_kernel(sigma);
    let r = (kernel.len() / 2) as i64;
    let dims = plane.dims();
    let (w, h) = (i64::from(dims.width), i64::from(dims.height));

    let mut tmp = Raster::new(dims, 1)?;
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (ki, kw) in kernel.iter().enumerate() {
                let sx = (x + ki as i64 - r).clamp(0, w - 1);
                acc += kw * plane.get(sx as u32, y as u32, 0);
            }
            tmp.pixel_mut(x as u32, y as u32)[0] = acc;
        }
    }

    let mut out = Raster::new(dims, 1)?;
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (ki, kw) in kernel.iter().enumerate() {
                let sy = (y + ki as i64 - r).clamp(0, h - 1);
                acc += kw * tmp.get(x as u32, sy as u32, 0);
            }
            out.pixel_mut(x as u32, y as u32)[0] = acc;
        }
    }
    Ok(out)
}

fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil().max(1.0) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (-radius..=radius)
        .map(|i| (-(i * i) as f32 / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Keep every other sample in both directions.
pub(crate) fn downsample(plane: &Raster) -> FlowpaintResult<Raster> {
    let dims = plane.dims();
    let half = Dims::new(dims.width.div_ceil(2), dims.height.div_ceil(2));
    let mut out = Raster::new(half, 1)?;
    for y in 0..half.height {
        for x in 0..half.width {
            out.pixel_mut(x, y)[0] = plane.get(x * 2, y * 2, 0);
        }
    }
    Ok(out)
}

/// Gaussian pyramid, finest level first. At most `levels` entries.
pub(crate) fn build_pyramid(
    base: Raster,
    levels: usize,
    sigma: f32,
) -> FlowpaintResult<Vec<Raster>> {
    let mut pyramid = vec![base];
    while pyramid.len() < levels.max(1) {
        let Some(current) = pyramid.last() else {
            break;
        };
        let dims = current.dims();
        if dims.width / 2 < MIN_LEVEL_SIDE || dims.height / 2 < MIN_LEVEL_SIDE {
            break;
        }
        let next = downsample(&gaussian_blur(current, sigma)?)?;
        pyramid.push(next);
    }
    Ok(pyramid)
}

/// Central-difference gradients `(d/dx, d/dy)` with edge clamping.
pub(crate) fn gradients(plane: &Raster) -> FlowpaintResult<(Raster, Raster)> {
    let dims = plane.dims();
    let mut gx = Raster::new(dims, 1)?;
    let mut gy = Raster::new(dims, 1)?;
    let (w, h) = (dims.width, dims.height);
    for y in 0..h {
        for x in 0..w {
            let xl = x.saturating_sub(1);
            let xr = (x + 1).min(w - 1);
            let yu = y.saturating_sub(1);
            let yd = (y + 1).min(h - 1);
            gx.pixel_mut(x, y)[0] = 0.5 * (plane.get(xr, y, 0) - plane.get(xl, y, 0));
            gy.pixel_mut(x, y)[0] = 0.5 * (plane.get(x, yd, 0) - plane.get(x, yu, 0));
        }
    }
    Ok((gx, gy))
}

/// Window sums over `(2r+1)^2` neighbourhoods, truncated at the image edge.
pub(crate) fn box_sum(plane: &Raster, radius: u32) -> FlowpaintResult<Raster> {
    let dims = plane.dims();
    let (w, h) = (dims.width as usize, dims.height as usize);
    let stride = w + 1;
    let mut integral = vec![0.0f64; stride * (h + 1)];
    for y in 0..h {
        let mut row = 0.0f64;
        for x in 0..w {
            row += f64::from(plane.get(x as u32, y as u32, 0));
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row;
        }
    }

    let r = radius as usize;
    let mut out = Raster::new(dims, 1)?;
    for y in 0..h {
        let y0 = y.saturating_sub(r);
        let y1 = (y + r + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(r);
            let x1 = (x + r + 1).min(w);
            let s = integral[y1 * stride + x1] - integral[y0 * stride + x1]
                - integral[y1 * stride + x0]
                + integral[y0 * stride + x0];
            out.pixel_mut(x as u32, y as u32)[0] = s as f32;
        }
    }
    Ok(out)
}

/// Bilinear sample of one channel with edge clamping.
pub(crate) fn sample_clamped(plane: &Raster, x: f32, y: f32) -> f32 {
    let dims = plane.dims();
    let max_x = (dims.width - 1) as f32;
    let max_y = (dims.height - 1) as f32;
    let x = if x.is_finite() { x.clamp(0.0, max_x) } else { 0.0 };
    let y = if y.is_finite() { y.clamp(0.0, max_y) } else { 0.0 };
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (ix, iy) = (x0 as u32, y0 as u32);
    let ix1 = (ix + 1).min(dims.width - 1);
    let iy1 = (iy + 1).min(dims.height - 1);
    let top = plane.get(ix, iy, 0) * (1.0 - fx) + plane.get(ix1, iy, 0) * fx;
    let bottom = plane.get(ix, iy1, 0) * (1.0 - fx) + plane.get(ix1, iy1, 0) * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Resample a coarse field onto a finer grid, scaling the vectors by the size ratio.
pub(crate) fn upsample_field(
    coarse: &DisplacementField,
    fine: Dims,
) -> FlowpaintResult<DisplacementField> {
    let cd = coarse.dims();
    if cd.is_empty() {
        return Err(FlowpaintError::shape("cannot upsample an empty field"));
    }
    let rx = fine.width as f32 / cd.width as f32;
    let ry = fine.height as f32 / cd.height as f32;
    let max_x = (cd.width - 1) as f32;
    let max_y = (cd.height - 1) as f32;

    Ok(DisplacementField::from_fn(fine, |x, y| {
        let cx = ((x as f32 + 0.5) / rx - 0.5).clamp(0.0, max_x);
        let cy = ((y as f32 + 0.5) / ry - 0.5).clamp(0.0, max_y);
        let x0 = cx.floor();
        let y0 = cy.floor();
        let fx = cx - x0;
        let fy = cy - y0;
        let (ix, iy) = (x0 as u32, y0 as u32);
        let ix1 = (ix + 1).min(cd.width - 1);
        let iy1 = (iy + 1).min(cd.height - 1);
        let mut v = [0.0f32; 2];
        for (c, out) in v.iter_mut().enumerate() {
            let top = coarse.get(ix, iy)[c] * (1.0 - fx) + coarse.get(ix1, iy)[c] * fx;
            let bottom = coarse.get(ix, iy1)[c] * (1.0 - fx) + coarse.get(ix1, iy1)[c] * fx;
            *out = top * (1.0 - fy) + bottom * fy;
        }
        [v[0] * rx, v[1] * ry]
    }))
}

#[cfg(test)]
#[path = "../../tests/unit/motion/pyramid.rs"]
mod tests;
