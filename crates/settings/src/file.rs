//! TOML config file support.
//!
//! Config location: `~/.config/preserved-portal/config.toml`

use crate::constants;
use anyhow::{bail, Context, Result};
use collections::FxHashSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One `[[portals]]` table: a portal id and the slots it may render into.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PortalEntry {
    /// Portal id shared by the host and all of its slots.
    pub id: String,
    /// Declared slot keys (e.g. `["main", "mini"]`).
    pub slots: Vec<String>,
    /// Slot the payload falls back to when its activating page goes away.
    #[serde(default)]
    pub fallback_slot: Option<String>,
    /// Element tag of the host container (defaults to `div`).
    #[serde(default)]
    pub container_tag: Option<String>,
}

/// User-facing config parsed from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Portal id used by components that don't name one.
    pub default_portal_id: String,
    /// Fallback slot for portals that don't declare their own.
    pub fallback_slot: String,
    /// Declared portals.
    pub portals: Vec<PortalEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_portal_id: constants::portal::DEFAULT_PORTAL_ID.to_string(),
            fallback_slot: constants::portal::MINI_SLOT.to_string(),
            portals: vec![PortalEntry {
                id: "video".to_string(),
                slots: vec![
                    constants::portal::MAIN_SLOT.to_string(),
                    constants::portal::MINI_SLOT.to_string(),
                ],
                fallback_slot: None,
                container_tag: None,
            }],
        }
    }
}

impl Config {
    /// Look up a declared portal by id.
    pub fn portal(&self, id: &str) -> Option<&PortalEntry> {
        self.portals.iter().find(|entry| entry.id == id)
    }

    /// The fallback slot for `id`: the portal's own, else the global one.
    pub fn fallback_slot_for(&self, id: &str) -> &str {
        self.portal(id)
            .and_then(|entry| entry.fallback_slot.as_deref())
            .unwrap_or(&self.fallback_slot)
    }

    /// The host container tag for `id`.
    pub fn container_tag_for(&self, id: &str) -> &str {
        self.portal(id)
            .and_then(|entry| entry.container_tag.as_deref())
            .unwrap_or(constants::portal::DEFAULT_CONTAINER_TAG)
    }

    /// Collect every problem with the declared portals.
    ///
    /// An empty list means the config is usable as-is.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen_ids = FxHashSet::default();

        if self.default_portal_id.is_empty() {
            problems.push("default-portal-id must not be empty".to_string());
        }

        for entry in &self.portals {
            if entry.id.is_empty() {
                problems.push("portal id must not be empty".to_string());
            } else if entry.id.len() > constants::settings::MAX_STRING_LENGTH {
                let prefix: String = entry.id.chars().take(16).collect();
                problems.push(format!("portal id '{}…' is too long", prefix));
            }
            if !seen_ids.insert(entry.id.as_str()) {
                problems.push(format!("portal '{}' is declared more than once", entry.id));
            }
            if entry.slots.is_empty() {
                problems.push(format!("portal '{}' declares no slots", entry.id));
            }
            if entry.slots.len() > constants::settings::MAX_SLOTS_PER_PORTAL {
                problems.push(format!(
                    "portal '{}' declares {} slots (max {})",
                    entry.id,
                    entry.slots.len(),
                    constants::settings::MAX_SLOTS_PER_PORTAL
                ));
            }

            let mut seen_slots = FxHashSet::default();
            for slot in &entry.slots {
                if slot.is_empty() {
                    problems.push(format!("portal '{}' has an empty slot key", entry.id));
                }
                if !seen_slots.insert(slot.as_str()) {
                    problems.push(format!(
                        "portal '{}' declares slot '{}' more than once",
                        entry.id, slot
                    ));
                }
            }

            let fallback = self.fallback_slot_for(&entry.id);
            if !entry.slots.iter().any(|slot| slot == fallback) {
                problems.push(format!(
                    "portal '{}' falls back to undeclared slot '{}'",
                    entry.id, fallback
                ));
            }
        }

        problems
    }
}

/// Default config file content with comments (generated on first launch).
const DEFAULT_CONFIG: &str = r#"# preserved-portal configuration

# Portal id used by components that don't name one
default-portal-id = "default"

# Slot the payload moves to when the page that activated it goes away
fallback-slot = "mini"

# Declared portals: one persistent payload per id, rendered into one slot at a time
[[portals]]
id = "video"
slots = ["main", "mini"]
# fallback-slot = "mini"
# container-tag = "section"
"#;

/// Return the config file path.
pub fn config_path() -> PathBuf {
    portal_paths::config_file()
}

/// Write the commented default config to `path`, creating parent directories.
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write default config: {:?}", path))?;
    Ok(())
}

/// Ensure the config file exists, creating a default if missing.
/// Returns the path to the config file.
pub fn ensure_config_file() -> Option<PathBuf> {
    let path = config_path();
    if !path.exists() {
        if let Err(e) = write_default_config(&path) {
            tracing::warn!("{:#}", e);
            return None;
        }
        tracing::info!("Created default config at {:?}", path);
    }
    Some(path)
}

/// Read and parse a config file, failing on any I/O or parse error.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;

    // Size guard
    if content.len() as u64 > constants::settings::MAX_FILE_SIZE {
        bail!(
            "Config file too large ({} bytes, max {})",
            content.len(),
            constants::settings::MAX_FILE_SIZE
        );
    }

    toml::from_str(&content).with_context(|| format!("Failed to parse config: {:?}", path))
}

/// Load and parse the config file. Returns default on any error.
pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }

    match load_config_from(&path) {
        Ok(cfg) => {
            for problem in cfg.validate() {
                tracing::warn!("config: {}", problem);
            }
            cfg
        }
        Err(e) => {
            tracing::warn!("{:#}, using defaults", e);
            Config::default()
        }
    }
}
