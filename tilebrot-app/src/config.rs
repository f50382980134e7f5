use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use tilebrot_core::view::DEFAULT_MAX_STEPS;
use tilebrot_core::ColorMode;
use tilebrot_engine::{default_workers, EngineConfig, TILES_PER_SIDE};

/// Environment variable that overrides the worker count.
pub const WORKERS_ENV: &str = "WORKERS";

// ---------------------------------------------------------------------------
// Driver configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Worker threads per generation. When absent, derived from the
    /// hardware thread count.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_tiles_per_side")]
    pub tiles_per_side: u32,
    #[serde(default)]
    pub color_mode: ColorMode,
    #[serde(default = "default_true")]
    pub neighborhood_refresh: bool,
}

fn default_width() -> u32 {
    1536
}
fn default_height() -> u32 {
    1024
}
fn default_max_steps() -> u32 {
    DEFAULT_MAX_STEPS
}
fn default_tiles_per_side() -> u32 {
    TILES_PER_SIDE
}
fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            max_steps: default_max_steps(),
            workers: None,
            tiles_per_side: default_tiles_per_side(),
            color_mode: ColorMode::default(),
            neighborhood_refresh: true,
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults if the file is missing
    /// or unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No configuration file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<AppConfig>(&json) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    return config;
                }
                Err(e) => error!("Failed to parse configuration: {e}"),
            },
            Err(e) => error!("Failed to read configuration file: {e}"),
        }
        Self::default()
    }

    /// Engine settings, with `workers_env` (the raw `WORKERS` value, if
    /// set) taking precedence over the file.
    pub fn engine_config(&self, workers_env: Option<&str>) -> EngineConfig {
        let workers = workers_env
            .and_then(parse_workers)
            .or(self.workers)
            .unwrap_or_else(default_workers);
        EngineConfig {
            workers,
            tiles_per_side: self.tiles_per_side,
            neighborhood_refresh: self.neighborhood_refresh,
        }
    }
}

fn parse_workers(raw: &str) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => {
            warn!("Ignoring {WORKERS_ENV}={raw:?}: expected a positive integer");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_takes_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.max_steps, 1024);
    }

    #[test]
    fn partial_file() {
        let config: AppConfig =
            serde_json::from_str(r#"{"width": 320, "color_mode": "cyclic", "workers": 3}"#)
                .unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 1024);
        assert_eq!(config.color_mode, ColorMode::Cyclic);
        assert_eq!(config.engine_config(None).workers, 3);
    }

    #[test]
    fn environment_overrides_file() {
        let config = AppConfig {
            workers: Some(3),
            ..AppConfig::default()
        };
        assert_eq!(config.engine_config(Some("7")).workers, 7);
        // Unusable values fall through to the file.
        assert_eq!(config.engine_config(Some("0")).workers, 3);
        assert_eq!(config.engine_config(Some("many")).workers, 3);
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join("tilebrot-no-such-config.json");
        assert_eq!(AppConfig::load(&path), AppConfig::default());
    }

    #[test]
    fn unparsable_file_is_default() {
        let path = std::env::temp_dir().join(format!(
            "tilebrot-bad-config-{}.json",
            std::process::id()
        ));
        fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn engine_config_is_valid() {
        assert!(AppConfig::default().engine_config(None).validate().is_ok());
    }
}
