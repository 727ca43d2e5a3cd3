//! Shared video player state and the views that render it.
//!
//! [`PlayerStore`] is the single source of truth for playback. Commands
//! ([`PlayerStore::toggle_play`], [`PlayerStore::seek`]) update the state
//! optimistically and drive the bound [`MediaHandle`]; the media element's
//! own signals ([`PlayerStore::sync_time`]) are the authority that corrects
//! it afterwards.

mod controls;
mod store;
mod video_element;

pub use controls::{format_time, ControlsView};
pub use store::{MediaHandle, PlayerState, PlayerStore};
pub use video_element::VideoElement;
