use thiserror::Error;

/// Errors that stop the driver.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] tilebrot_engine::EngineError),

    #[error(transparent)]
    Core(#[from] tilebrot_core::CoreError),

    #[error("invalid scale: {0} (must be >= 1)")]
    InvalidScale(u32),
}
