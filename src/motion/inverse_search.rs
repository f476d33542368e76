use crate::foundation::core::{Dims, Frame, Raster};
use crate::foundation::error::FlowpaintResult;
use crate::motion::estimator::{MotionEstimator, check_pair};
use crate::motion::field::DisplacementField;
use crate::motion::pyramid::{
    build_pyramid, gaussian_blur, gradients, luma, sample_clamped, upsample_field,
};

/// Tuning for [`InverseSearch`].
#[derive(Clone, Debug, PartialEq)]
pub struct InverseSearchParams {
    /// Maximum pyramid depth, including the full-resolution level.
    pub levels: usize,
    /// Side of the square patches.
    pub patch_size: u32,
    /// Distance between neighbouring patch origins.
    pub patch_stride: u32,
    /// Gauss-Newton iterations per patch.
    pub iterations: usize,
    /// Gaussian sigma used between pyramid levels.
    pub pyramid_sigma: f32,
    /// Gaussian sigma applied to the full-resolution luma before estimation.
    pub presmooth_sigma: f32,
}

impl Default for InverseSearchParams {
    fn default() -> Self {
        Self {
            levels: 4,
            patch_size: 8,
            patch_stride: 4,
            iterations: 12,
            pyramid_sigma: 1.0,
            presmooth_sigma: 0.5,
        }
    }
}

/// Patch-based inverse-compositional search, coarse to fine.
///
/// Each level tracks overlapping patches of the source into the destination (the Hessian is
/// precomputed from the source patch) and densifies the patch vectors with photometric-error
/// weights. Motion boundaries stay sharper than with [`super::lucas_kanade::PyramidalLk`].
#[derive(Clone, Debug, Default)]
pub struct InverseSearch {
    params: InverseSearchParams,
}

struct Patch {
    x0: u32,
    y0: u32,
    w: u32,
    h: u32,
}

impl InverseSearch {
    /// Estimator with explicit parameters.
    pub fn new(params: InverseSearchParams) -> Self {
        Self { params }
    }

    /// Active parameters.
    pub fn params(&self) -> &InverseSearchParams {
        &self.params
    }

    fn patches(&self, dims: Dims) -> Vec<Patch> {
        let size = self.params.patch_size.max(2);
        let stride = self.params.patch_stride.max(1);
        let w = size.min(dims.width);
        let h = size.min(dims.height);
        let xs = origins(dims.width - w, stride);
        let ys = origins(dims.height - h, stride);
        let mut out = Vec::with_capacity(xs.len() * ys.len());
        for &y0 in &ys {
            for &x0 in &xs {
                out.push(Patch { x0, y0, w, h });
            }
        }
        out
    }

    fn track_patch(
        &self,
        patch: &Patch,
        src: &Raster,
        dst: &Raster,
        gx: &Raster,
        gy: &Raster,
        init: [f32; 2],
    ) -> [f32; 2] {
        let (mut h11, mut h12, mut h22) = (0.0f32, 0.0f32, 0.0f32);
        for y in patch.y0..patch.y0 + patch.h {
            for x in patch.x0..patch.x0 + patch.w {
                let ix = gx.get(x, y, 0);
                let iy = gy.get(x, y, 0);
                h11 += ix * ix;
                h12 += ix * iy;
                h22 += iy * iy;
            }
        }
        let det = h11 * h22 - h12 * h12;
        if !det.is_finite() || det.abs() < 1e-6 {
            return init;
        }

        let mut u = init;
        for _ in 0..self.params.iterations {
            let (mut b1, mut b2) = (0.0f32, 0.0f32);
            for y in patch.y0..patch.y0 + patch.h {
                for x in patch.x0..patch.x0 + patch.w {
                    let r =
                        sample_clamped(dst, x as f32 + u[0], y as f32 + u[1]) - src.get(x, y, 0);
                    b1 += gx.get(x, y, 0) * r;
                    b2 += gy.get(x, y, 0) * r;
                }
            }
            let du = (h22 * b1 - h12 * b2) / det;
            let dv = (h11 * b2 - h12 * b1) / det;
            if !du.is_finite() || !dv.is_finite() {
                return init;
            }
            u = [u[0] - du, u[1] - dv];
            if du * du + dv * dv < 1e-4 {
                break;
            }
        }

        // A patch that wandered further than its own size has locked onto something else.
        let limit = self.params.patch_size as f32;
        if (u[0] - init[0]).abs() > limit || (u[1] - init[1]).abs() > limit {
            return init;
        }
        u
    }

    fn refine_level(
        &self,
        src: &Raster,
        dst: &Raster,
        flow: &DisplacementField,
    ) -> FlowpaintResult<DisplacementField> {
        let dims = src.dims();
        let (gx, gy) = gradients(src)?;

        let n = dims.pixel_count();
        let mut acc = vec![[0.0f32; 2]; n];
        let mut weight = vec![0.0f32; n];
        for patch in self.patches(dims) {
            let cx = patch.x0 + patch.w / 2;
            let cy = patch.y0 + patch.h / 2;
            let u = self.track_patch(&patch, src, dst, &gx, &gy, flow.get(cx, cy));
            for y in patch.y0..patch.y0 + patch.h {
                for x in patch.x0..patch.x0 + patch.w {
                    let err = (sample_clamped(dst, x as f32 + u[0], y as f32 + u[1])
                        - src.get(x, y, 0))
                    .abs();
                    let w = 1.0 / err.max(1.0);
                    let i = y as usize * dims.width as usize + x as usize;
                    acc[i][0] += w * u[0];
                    acc[i][1] += w * u[1];
                    weight[i] += w;
                }
            }
        }

        let mut out = flow.clone();
        for y in 0..dims.height {
            for x in 0..dims.width {
                let i = y as usize * dims.width as usize + x as usize;
                if weight[i] > 0.0 {
                    out.set(x, y, [acc[i][0] / weight[i], acc[i][1] / weight[i]]);
                }
            }
        }
        Ok(out)
    }
}

fn origins(span: u32, stride: u32) -> Vec<u32> {
    let mut out: Vec<u32> = (0..=span).step_by(stride as usize).collect();
    if out.last() != Some(&span) {
        out.push(span);
    }
    out
}

impl MotionEstimator for InverseSearch {
    fn name(&self) -> &str {
        "inverse-search"
    }

    #[tracing::instrument(skip_all, name = "inverse_search")]
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
            let init = match flow.take() {
                Some(coarse) => upsample_field(&coarse, src_l.dims())?,
                None => DisplacementField::zeros(src_l.dims()),
            };
            flow = Some(self.refine_level(src_l, dst_l, &init)?);
        }

        let flow = flow.unwrap_or_else(|| DisplacementField::zeros(dims));
        flow.validate_for(dims)?;
        Ok(flow)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/inverse_search.rs"]
mod tests;
