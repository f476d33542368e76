use std::{fmt, str::FromStr};

use crate::foundation::core::{Dims, Frame};
use crate::foundation::error::{FlowpaintError, FlowpaintResult};
use crate::motion::field::DisplacementField;
use crate::motion::inverse_search::InverseSearch;
use crate::motion::lucas_kanade::PyramidalLk;

/// Dense motion estimation between two frames.
///
/// `estimate(src, dst)` returns a field in `src` coordinates that points toward `dst`, i.e.
/// `src(x)` corresponds to `dst(x + field(x))`. Implementations must be shareable across worker
/// threads.
pub trait MotionEstimator: Send + Sync {
    /// Human-readable estimator name, used in logs.
    fn name(&self) -> &str;

    /// Estimate the field from `src` to `dst`. Both frames must have the same size.
    fn estimate(&self, src: &Frame, dst: &Frame) -> FlowpaintResult<DisplacementField>;
}

/// Built-in estimation methods, selected by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MotionMethod {
    /// Coarse pyramidal dense Lucas-Kanade (`"pyramidal"`): smooth, fast baseline.
    Pyramidal,
    /// Patch-based inverse search with densification (`"inverse-search"`): sharper edges.
    InverseSearch,
}

impl MotionMethod {
    /// Every built-in method.
    pub const ALL: [MotionMethod; 2] = [MotionMethod::Pyramidal, MotionMethod::InverseSearch];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            MotionMethod::Pyramidal => "pyramidal",
            MotionMethod::InverseSearch => "inverse-search",
        }
    }

    /// Resolve a method name. Unknown names are a [`FlowpaintError::Method`] error.
    pub fn parse(name: &str) -> FlowpaintResult<Self> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.name()).collect();
                FlowpaintError::method(format!(
                    "unknown motion estimation method '{name}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}

impl fmt::Display for MotionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MotionMethod {
    type Err = FlowpaintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MotionMethod {
    type Error = FlowpaintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MotionMethod> for String {
    fn from(value: MotionMethod) -> Self {
        value.name().to_string()
    }
}

/// Build the estimator for a built-in method with its default parameters.
pub fn create_estimator(method: MotionMethod) -> Box<dyn MotionEstimator> {
    match method {
        MotionMethod::Pyramidal => Box::new(PyramidalLk::default()),
        MotionMethod::InverseSearch => Box::new(InverseSearch::default()),
    }
}

/// Estimate the field from `src` to `dst` with the method called `method_name`.
pub fn estimate_motion(
    src: &Frame,
    dst: &Frame,
    method_name: &str,
) -> FlowpaintResult<DisplacementField> {
    let method = MotionMethod::parse(method_name)?;
    create_estimator(method).estimate(src, dst)
}

/// Shared precondition for estimators: equal, non-empty sizes.
pub(crate) fn check_pair(src: &Frame, dst: &Frame) -> FlowpaintResult<Dims> {
    let a = Dims::of_frame(src);
    let b = Dims::of_frame(dst);
    if a != b {
        return Err(FlowpaintError::shape(format!(
            "motion estimation needs equally sized frames, got {a} and {b}"
        )));
    }
    if a.is_empty() {
        return Err(FlowpaintError::shape("motion estimation needs non-empty frames"));
    }
    Ok(a)
}

#[cfg(test)]
#[path = "../../tests/unit/motion/estimator.rs"]
mod tests;
