//! Player state store.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};
use util::Subscription;

/// Control surface of the underlying media element.
#[cfg_attr(test, mockall::automock)]
pub trait MediaHandle: Send + Sync {
    fn play(&self);
    fn pause(&self);
    fn set_current_time(&self, seconds: f64);
}

/// Observable playback state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerState {
    /// Media source currently loaded, if any.
    pub source: Option<String>,
    pub is_playing: bool,
    /// Seconds.
    pub current_time: f64,
    /// Seconds; never NaN.
    pub duration: f64,
}

type Listener = Arc<dyn Fn(&PlayerState) + Send + Sync>;

#[derive(Default)]
struct Inner {
    state: PlayerState,
    media: Option<Arc<dyn MediaHandle>>,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

/// Shared handle to the player store. Clones share state.
#[derive(Clone, Default)]
pub struct PlayerStore {
    inner: Arc<Mutex<Inner>>,
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlayerState {
        self.inner.lock().state.clone()
    }

    /// Bind (or with `None`, clear) the media element commands drive.
    pub fn set_media_handle(&self, media: Option<Arc<dyn MediaHandle>>) {
        debug!(bound = media.is_some(), "media handle");
        self.inner.lock().media = media;
    }

    pub fn has_media_handle(&self) -> bool {
        self.inner.lock().media.is_some()
    }

    /// Load `source`, resetting playback. Loading the current source again
    /// does nothing.
    pub fn init_source(&self, source: &str) {
        self.mutate(|state| {
            if state.source.as_deref() == Some(source) {
                return;
            }
            debug!(source, "init source");
            *state = PlayerState {
                source: Some(source.to_string()),
                ..PlayerState::default()
            };
        });
    }

    /// Play or pause the bound media. No-op without a media handle.
    pub fn toggle_play(&self) {
        let (media, was_playing) = {
            let inner = self.inner.lock();
            (inner.media.clone(), inner.state.is_playing)
        };
        let Some(media) = media else {
            trace!("toggle_play without media handle");
            return;
        };

        if was_playing {
            media.pause();
        } else {
            media.play();
        }
        self.mutate(|state| state.is_playing = !was_playing);
    }

    /// Jump to `seconds`. No-op without a media handle.
    pub fn seek(&self, seconds: f64) {
        let media = self.inner.lock().media.clone();
        let Some(media) = media else {
            trace!("seek without media handle");
            return;
        };

        media.set_current_time(seconds);
        self.mutate(|state| state.current_time = seconds);
    }

    /// Authoritative time report from the media element.
    pub fn sync_time(&self, current_time: f64, duration: f64) {
        let duration = if duration.is_nan() { 0.0 } else { duration };
        self.mutate(|state| {
            state.current_time = current_time;
            state.duration = duration;
        });
    }

    /// Back to the initial state. A bound media handle stays bound; it
    /// belongs to the mounted video element.
    pub fn reset(&self) {
        self.mutate(|state| *state = PlayerState::default());
    }

    /// Call `listener` after every state change until the subscription drops.
    pub fn subscribe(&self, listener: impl Fn(&PlayerState) + Send + Sync + 'static) -> Subscription {
        let listener_id = {
            let mut inner = self.inner.lock();
            let listener_id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.listeners.push((listener_id, Arc::new(listener)));
            listener_id
        };

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let removed = {
                let mut inner = inner.lock();
                let index = inner
                    .listeners
                    .iter()
                    .position(|(existing, _)| *existing == listener_id);
                index.map(|index| inner.listeners.remove(index))
            };
            drop(removed);
        })
    }

    /// Apply `f` and notify listeners, outside the lock, if anything changed.
    fn mutate(&self, f: impl FnOnce(&mut PlayerState)) {
        let notify = {
            let mut inner = self.inner.lock();
            let before = inner.state.clone();
            f(&mut inner.state);
            if inner.state == before {
                None
            } else {
                let listeners: Vec<Listener> = inner
                    .listeners
                    .iter()
                    .map(|(_, listener)| listener.clone())
                    .collect();
                Some((inner.state.clone(), listeners))
            }
        };

        if let Some((snapshot, listeners)) = notify {
            for listener in listeners {
                listener(&snapshot);
            }
        }
    }
}

impl fmt::Debug for PlayerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PlayerStore")
            .field("state", &inner.state)
            .field("media", &inner.media.is_some())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}
