//! Configuration system for preserved-portal.
//!
//! Provides compile-time constants and TOML config file support.

pub mod constants;
pub mod file;

pub use file::{
    config_path, ensure_config_file, load_config, load_config_from, write_default_config, Config,
    PortalEntry,
};
