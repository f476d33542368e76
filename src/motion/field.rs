use crate::foundation::core::Dims;
use crate::foundation::error::{FlowpaintError, FlowpaintResult};

/// Dense per-pixel displacement `(dx, dy)`.
///
/// A field estimated from source `A` to destination `B` lives in `A`'s coordinates and points
/// toward `B`: `A(x)` corresponds to `B(x + field(x))`.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplacementField {
    dims: Dims,
    vectors: Vec<[f32; 2]>,
}

impl DisplacementField {
    /// All-zero field (identity warp).
    pub fn zeros(dims: Dims) -> Self {
        Self::uniform(dims, 0.0, 0.0)
    }

    /// Same displacement at every pixel.
    pub fn uniform(dims: Dims, dx: f32, dy: f32) -> Self {
        Self {
            dims,
            vectors: vec![[dx, dy]; dims.pixel_count()],
        }
    }

    /// Build a field from a per-pixel closure.
    pub fn from_fn(dims: Dims, mut f: impl FnMut(u32, u32) -> [f32; 2]) -> Self {
        let mut vectors = Vec::with_capacity(dims.pixel_count());
        for y in 0..dims.height {
            for x in 0..dims.width {
                vectors.push(f(x, y));
            }
        }
        Self { dims, vectors }
    }

    /// Wrap row-major vectors; the length must match `dims`.
    pub fn from_vec(dims: Dims, vectors: Vec<[f32; 2]>) -> FlowpaintResult<Self> {
        if vectors.len() != dims.pixel_count() {
            return Err(FlowpaintError::shape(format!(
                "field of size {dims} expects {} vectors, got {}",
                dims.pixel_count(),
                vectors.len()
            )));
        }
        Ok(Self { dims, vectors })
    }

    /// Spatial size.
    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// Displacement at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> [f32; 2] {
        self.vectors[y as usize * self.dims.width as usize + x as usize]
    }

    /// Overwrite the displacement at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, v: [f32; 2]) {
        let idx = y as usize * self.dims.width as usize + x as usize;
        self.vectors[idx] = v;
    }

    /// Row-major displacement vectors.
    pub fn vectors(&self) -> &[[f32; 2]] {
        &self.vectors
    }

    /// Ensure the field matches `dims` and holds only finite values.
    pub fn validate_for(&self, dims: Dims) -> FlowpaintResult<()> {
        if self.dims != dims || self.vectors.len() != dims.pixel_count() {
            return Err(FlowpaintError::shape(format!(
                "displacement field is {} but the image is {dims}",
                self.dims
            )));
        }
        if let Some(pos) = self
            .vectors
            .iter()
            .position(|v| !v[0].is_finite() || !v[1].is_finite())
        {
            let w = self.dims.width.max(1) as usize;
            return Err(FlowpaintError::shape(format!(
                "displacement field has a non-finite vector at ({}, {})",
                pos % w,
                pos / w
            )));
        }
        Ok(())
    }

    /// True when every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.vectors.iter().all(|v| v[0] == 0.0 && v[1] == 0.0)
    }

    /// Magnitude summary for diagnostics.
    pub fn stats(&self) -> FieldStats {
        if self.vectors.is_empty() {
            return FieldStats::default();
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for v in &self.vectors {
            let m = f64::from(v[0]).hypot(f64::from(v[1]));
            min = min.min(m);
            max = max.max(m);
            sum += m;
            sum_sq += m * m;
        }
        let n = self.vectors.len() as f64;
        let mean = sum / n;
        let var = (sum_sq / n - mean * mean).max(0.0);
        FieldStats {
            min_magnitude: min,
            max_magnitude: max,
            mean_magnitude: mean,
            std_magnitude: var.sqrt(),
        }
    }
}

/// Displacement magnitude statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct FieldStats {
    /// Smallest vector length.
    pub min_magnitude: f64,
    /// Largest vector length.
    pub max_magnitude: f64,
    /// Mean vector length.
    pub mean_magnitude: f64,
    /// Standard deviation of vector lengths.
    pub std_magnitude: f64,
}

#[cfg(test)]
#[path = "../../tests/unit/motion/field.rs"]
mod tests;
