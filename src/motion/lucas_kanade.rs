use crate::foundation::core::{Frame, Raster};
use crate::foundation::error::FlowpaintResult;
use crate::motion::estimator::{MotionEstimator, check_pair};
use crate::motion::field::DisplacementField;
use crate::motion::pyramid::{
    box_sum, build_pyramid, gaussian_blur, gradients, luma, upsample_field,
};
use crate::warp::{BorderMode, Interpolation, warp};

/// Tuning for [`PyramidalLk`].
#[derive(Clone, Debug, PartialEq)]
pub struct PyramidalLkParams {
    /// Maximum pyramid depth, including the full-resolution level.
    pub levels: usize,
    /// Half-size of the square aggregation window.
    pub window_radius: u32,
    /// Refinement passes per level.
    pub iterations: usize,
    /// Tikhonov term added to the structure tensor diagonal.
    pub regularization: f32,
    /// Gaussian sigma used between pyramid levels.
    pub pyramid_sigma: f32,
    /// Gaussian sigma applied to the full-resolution luma before estimation.
    pub presmooth_sigma: f32,
}

impl Default for PyramidalLkParams {
    fn default() -> Self {
        Self {
            levels: 4,
            window_radius: 7,
            iterations: 5,
            regularization: 1.0,
            pyramid_sigma: 1.0,
            presmooth_sigma: 0.8,
        }
    }
}

/// Dense Lucas-Kanade estimated coarse to fine over a Gaussian pyramid.
///
/// Every pixel solves the 2x2 normal equations of its window; the field is smooth and robust
/// to large motion but blurs motion boundaries.
#[derive(Clone, Debug, Default)]
pub struct PyramidalLk {
    params: PyramidalLkParams,
}

impl PyramidalLk {
    /// Estimator with explicit parameters.
    pub fn new(params: PyramidalLkParams) -> Self {
        Self { params }
    }

    /// Active parameters.
    pub fn params(&self) -> &PyramidalLkParams {
        &self.params
    }

    fn refine_level(
        &self,
        src: &Raster,
        dst: &Raster,
        flow: &mut DisplacementField,
    ) -> FlowpaintResult<()> {
        let dims = src.dims();
        let r = self.params.window_radius;
        let lambda = self.params.regularization;

        for _ in 0..self.params.iterations {
            let warped = warp(dst, flow, Interpolation::Bilinear, BorderMode::Reflect)?;
            let (gx, gy) = gradients(&warped)?;

            let n = dims.pixel_count();
            let mut products = [
                Vec::with_capacity(n),
                Vec::with_capacity(n),
                Vec::with_capacity(n),
                Vec::with_capacity(n),
                Vec::with_capacity(n),
            ];
            for i in 0..n {
                let ix = gx.data()[i];
                let iy = gy.data()[i];
                let it = warped.data()[i] - src.data()[i];
                products[0].push(ix * ix);
                products[1].push(ix * iy);
                products[2].push(iy * iy);
                products[3].push(ix * it);
                products[4].push(iy * it);
            }
            let mut sums = Vec::with_capacity(products.len());
            for p in products {
                sums.push(box_sum(&Raster::from_vec(dims, 1, p)?, r)?);
            }

            let mut max_step = 0.0f32;
            for y in 0..dims.height {
                for x in 0..dims.width {
                    let a = sums[0].get(x, y, 0) + lambda;
                    let b = sums[1].get(x, y, 0);
                    let c = sums[2].get(x, y, 0) + lambda;
                    let bx = sums[3].get(x, y, 0);
                    let by = sums[4].get(x, y, 0);
                    let det = a * c - b * b;
                    if !det.is_finite() || det.abs() < 1e-6 {
                        continue;
                    }
                    let dx = -(c * bx - b * by) / det;
                    let dy = -(a * by - b * bx) / det;
                    if !dx.is_finite() || !dy.is_finite() {
                        continue;
                    }
                    let [fx, fy] = flow.get(x, y);
                    flow.set(x, y, [fx + dx, fy + dy]);
                    max_step = max_step.max(dx.abs()).max(dy.abs());
                }
            }
            if max_step < 1e-3 {
                break;
            }
        }
        Ok(())
    }
}

impl MotionEstimator for PyramidalLk {
    fn name(&self) -> &str {
        "pyramidal"
    }

    #[tracing::instrument(skip_all, name = "pyramidal_lk")]
    fn estimate(&self, src: &Frame, dst: &Frame) -> FlowpaintResult<DisplacementField> {
        let dims = check_pair(src, dst)?;
        let p = &self.params;
        let src_pyr = build_pyramid(
            gaussian_blur(&luma(src)?, p.presmooth_sigma)?,
            p.levels,
            p.pyramid_sigma,
        )?;
        let dst_pyr = build_pyramid(
            gaussian_blur(&luma(dst)?, p.presmooth_sigma)?,
            p.levels,
            p.pyramid_sigma,
        )?;

        let mut flow: Option<DisplacementField> = None;
        for (src_l, dst_l) in src_pyr.iter().zip(&dst_pyr).rev() {
            let mut level_flow = match flow.take() {
                Some(coarse) => upsample_field(&coarse, src_l.dims())?,
                None => DisplacementField::zeros(src_l.dims()),
            };
            self.refine_level(src_l, dst_l, &mut level_flow)?;
            flow = Some(level_flow);
        }

        let flow = flow.unwrap_or_else(|| DisplacementField::zeros(dims));
        flow.validate_for(dims)?;
        Ok(flow)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/lucas_kanade.rs"]
mod tests;
