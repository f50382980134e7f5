use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::tile::TILES_PER_SIDE;

/// Tuning knobs for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker threads spawned for each generation.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Tiles along each side of the grid; a generation has the square of
    /// this many tiles.
    #[serde(default = "default_tiles_per_side")]
    pub tiles_per_side: u32,

    /// Recompute the neighbourhood cache in the background after every
    /// transform.
    #[serde(default = "default_true")]
    pub neighborhood_refresh: bool,
}

/// Worker count derived from the hardware thread count.
pub fn default_workers() -> usize {
    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    workers_for(threads)
}

/// Half of `threads` less one, so the UI thread and the background refresh
/// keep a core. Machines too small for even one fall back to two.
fn workers_for(threads: usize) -> usize {
    match (threads / 2).saturating_sub(1) {
        0 => 2,
        n => n,
    }
}

fn default_tiles_per_side() -> u32 {
    TILES_PER_SIDE
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            tiles_per_side: default_tiles_per_side(),
            neighborhood_refresh: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.workers < 1 {
            return Err(EngineError::InvalidWorkerCount(self.workers));
        }
        if self.tiles_per_side < 1 {
            return Err(EngineError::InvalidTileCount(self.tiles_per_side));
        }
        Ok(())
    }

    /// Return a copy with a different worker count.
    pub fn with_workers(self, workers: usize) -> Self {
        Self { workers, ..self }
    }

    /// Return a copy with a different tile count.
    pub fn with_tiles_per_side(self, tiles_per_side: u32) -> Self {
        Self {
            tiles_per_side,
            ..self
        }
    }

    /// Return a copy with the background neighbourhood refresh on or off.
    pub fn with_neighborhood_refresh(self, neighborhood_refresh: bool) -> Self {
        Self {
            neighborhood_refresh,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.workers >= 1);
        assert_eq!(config.tiles_per_side, 32);
        assert!(config.neighborhood_refresh);
    }

    #[test]
    fn workers_follow_thread_count() {
        assert_eq!(workers_for(16), 7);
        assert_eq!(workers_for(6), 2);
        assert_eq!(workers_for(4), 1);
        assert_eq!(workers_for(3), 2);
        assert_eq!(workers_for(2), 2);
        assert_eq!(workers_for(1), 2);
        assert_eq!(workers_for(0), 2);
    }

    #[test]
    fn zero_counts_are_rejected() {
        assert!(EngineConfig::default().with_workers(0).validate().is_err());
        assert!(EngineConfig::default()
            .with_tiles_per_side(0)
            .validate()
            .is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"workers": 3}"#).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.tiles_per_side, TILES_PER_SIDE);
        assert!(config.neighborhood_refresh);
    }
}
