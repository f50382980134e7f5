pub mod color;
pub mod complex;
pub mod error;
pub mod escape;
pub mod plane_state;
pub mod view;

// Re-export primary types for convenience.
pub use color::ColorMode;
pub use complex::Complex;
pub use error::CoreError;
pub use escape::{evaluate, Escape, Evaluator, Mandelbrot, INSIDE};
pub use plane_state::PlaneState;
pub use view::{ViewParams, NEIGHBORHOOD_RES};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
