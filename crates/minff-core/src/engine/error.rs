use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForceFieldError {
    #[error("Force field has not been initialized")]
    NotInitialized,

    #[error("Force field has no points")]
    NoPoints,

    #[error("Dimension must be at least 1")]
    ZeroDimension,

    #[error("Point index {index} is out of range for {len} point(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Fixed point index {index} is out of range for {len} point(s)")]
    FixedPointOutOfRange { index: usize, len: usize },

    #[error("Buffer has length {actual}, expected {expected}")]
    BufferLength { expected: usize, actual: usize },

    #[error("Point has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(
        "Point count changed from {initialized} to {current} since initialization; call initialize() again"
    )]
    StalePointCount { initialized: usize, current: usize },

    #[error("Backend failure: {0}")]
    Backend(String),
}
