use thiserror::Error;

use crate::complex::Complex;

/// Errors originating from the core view types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid iteration budget: {0} (must be >= 1)")]
    InvalidIterationBudget(u32),

    #[error("invalid zoom: {0} (must be positive and finite)")]
    InvalidZoom(f64),

    #[error("invalid center: {0} (components must be finite)")]
    InvalidCenter(Complex),

    #[error("invalid color mode index: {0} (expected 0..=3)")]
    InvalidColorMode(i64),

    #[error("invalid grid dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },
}
