//! Centralized path management for preserved-portal.
//!
//! Directories are lazily initialized and cached.
//! Use `set_config_dir` before first access to override for testing.

use std::path::PathBuf;
use std::sync::OnceLock;

static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Directory name used under the platform config dir.
pub const APP_DIR_NAME: &str = "preserved-portal";

/// ~/.config/preserved-portal (or platform equivalent)
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    })
}

/// Override config dir (must be called before first access). For testing.
pub fn set_config_dir(path: PathBuf) {
    let _ = CONFIG_DIR.set(path);
}

/// Config file path: config_dir()/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
