//! Where the driver looks for its files: next to the executable, so a
//! copied binary carries its configuration with it.

use std::path::PathBuf;

/// File name of the driver configuration.
pub const CONFIG_FILE: &str = "tilebrot.json";

/// Directory containing the running executable. Falls back to the current
/// directory if unavailable.
pub fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

pub fn config_path() -> PathBuf {
    exe_directory().join(CONFIG_FILE)
}
