//! Centralized constants for preserved-portal.
//!
//! Organized by component.

/// Portal registry defaults.
pub mod portal {
    /// Portal id used when the caller doesn't name one.
    pub const DEFAULT_PORTAL_ID: &str = "default";
    /// Slot key for the full-size player position.
    pub const MAIN_SLOT: &str = "main";
    /// Slot key the payload falls back to when its page goes away.
    pub const MINI_SLOT: &str = "mini";
    /// Element tag used for slot targets and host containers.
    pub const DEFAULT_CONTAINER_TAG: &str = "div";
    /// Attribute stamped on every slot element with its slot key.
    pub const SLOT_KEY_ATTRIBUTE: &str = "data-portal-slot";
    /// Attribute stamped on every host container with its portal id.
    pub const HOST_ATTRIBUTE: &str = "data-portal-host";
}

/// Player defaults.
pub mod player {
    /// Rendered in place of a time that isn't known yet.
    pub const TIME_PLACEHOLDER: &str = "0:00";
    /// Glyph shown while playing (click pauses).
    pub const PAUSE_GLYPH: &str = "⏸";
    /// Glyph shown while paused (click plays).
    pub const PLAY_GLYPH: &str = "▶";
}

/// Settings file validation limits.
pub mod settings {
    /// Maximum settings file size in bytes (64 KB).
    pub const MAX_FILE_SIZE: u64 = 64 * 1024;

    /// Maximum length for string fields (portal ids, slot keys).
    pub const MAX_STRING_LENGTH: usize = 256;

    /// Maximum number of slots a single portal may declare.
    pub const MAX_SLOTS_PER_PORTAL: usize = 32;
}
