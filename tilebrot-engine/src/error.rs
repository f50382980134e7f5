use thiserror::Error;

/// Errors originating from the compute engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid worker count: {0} (must be >= 1)")]
    InvalidWorkerCount(usize),

    #[error("invalid tile count: {0} tiles per side (must be >= 1)")]
    InvalidTileCount(u32),

    #[error("cannot allocate a grid of {cells} cells")]
    Allocation { cells: usize },

    #[error("failed to start tile workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] tilebrot_core::CoreError),
}
