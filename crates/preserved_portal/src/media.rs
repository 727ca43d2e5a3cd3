//! Headless media backend.

use parking_lot::Mutex;
use player::MediaHandle;
use tracing::info;

/// Media handle with no real decoder behind it: logs commands and remembers
/// the last one so the app can report it.
#[derive(Debug, Default)]
pub struct LoggingMedia {
    last_command: Mutex<Option<String>>,
}

impl LoggingMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_command(&self) -> Option<String> {
        self.last_command.lock().clone()
    }

    fn record(&self, command: String) {
        info!(command = %command, "media");
        *self.last_command.lock() = Some(command);
    }
}

impl MediaHandle for LoggingMedia {
    fn play(&self) {
        self.record("play".to_string());
    }

    fn pause(&self) {
        self.record("pause".to_string());
    }

    fn set_current_time(&self, seconds: f64) {
        self.record(format!("seek {:.1}", seconds));
    }
}
