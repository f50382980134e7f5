//! Tiled, cancellable escape-time computation over a viewport of the
//! complex plane.
//!
//! An [`Engine`] owns the current [`ViewParams`](tilebrot_core::ViewParams)
//! and the [`Grid`] of escape values that belongs to it. Compute requests
//! fill the grid tile by tile from the centre outwards; a newer request
//! cancels an older one; view changes carry over whatever is already known
//! before any new work starts.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod grid;
pub mod reproject;
pub mod scheduler;
pub mod tile;
pub mod trace;

pub use config::{default_workers, EngineConfig};
pub use engine::{ComputeHandle, ComputeOutcome, Engine, ViewState};
pub use error::EngineError;
pub use generation::{Generation, Phase, Progress};
pub use grid::Grid;
pub use reproject::{reproject_grid, reproject_neighborhood, Neighborhood};
pub use scheduler::ComputeReport;
pub use tile::{Tile, TileIndex, TileOrder, TILES_PER_SIDE};
pub use trace::{trace_tile, TileTrace};

/// Convenience result type for the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;
