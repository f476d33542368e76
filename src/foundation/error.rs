/// Convenience result type used across flowpaint.
pub type FlowpaintResult<T> = Result<T, FlowpaintError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Every variant is fatal for a run: no frame is ever replaced by an unedited or
/// half-composited fallback.
#[derive(thiserror::Error, Debug)]
pub enum FlowpaintError {
    /// Invalid user-provided inputs (missing directories, bad indices, size mismatches).
    #[error("validation error: {0}")]
    Validation(String),

    /// Image decode/encode or video encode failures.
    #[error("codec error: {0}")]
    Codec(String),

    /// A field, mask or image with the wrong dimensions, channel count or non-finite values.
    #[error("shape error: {0}")]
    Shape(String),

    /// Unknown or unsupported motion-estimation method.
    #[error("method error: {0}")]
    Method(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowpaintError {
    /// Build a [`FlowpaintError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlowpaintError::Codec`] value.
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Build a [`FlowpaintError::Shape`] value.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Build a [`FlowpaintError::Method`] value.
    pub fn method(msg: impl Into<String>) -> Self {
        Self::Method(msg.into())
    }

    /// Prefix the message with the frame it happened on, keeping the variant.
    pub fn at_frame(self, index: usize) -> Self {
        match self {
            Self::Validation(m) => Self::Validation(format!("frame {index}: {m}")),
            Self::Codec(m) => Self::Codec(format!("frame {index}: {m}")),
            Self::Shape(m) => Self::Shape(format!("frame {index}: {m}")),
            Self::Method(m) => Self::Method(format!("frame {index}: {m}")),
            Self::Other(e) => Self::Other(e.context(format!("frame {index}"))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
