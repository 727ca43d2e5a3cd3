//! The registry store.
//!
//! One [`PortalInstance`] per portal id, created lazily on first reference
//! and never evicted. All mutation goes through [`PortalTransaction`], so a
//! batch of changes is applied atomically and observed as one notification.
//!
//! # Notification
//!
//! Listeners subscribe per portal id; a change to one id never wakes the
//! listeners of another. Listeners run after the registry lock is released
//! and may mutate the registry themselves. Nested changes are queued and
//! delivered once the current delivery finishes, and every delivery reads the
//! instance fresh, so the last snapshot a listener sees is always the current
//! state.

use crate::instance::PortalInstance;
use collections::{FxHashMap, VecDeque};
use parking_lot::Mutex;
use render_tree::NodeId;
use smallvec::SmallVec;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};
use util::Subscription;

type Listener = Arc<dyn Fn(&PortalInstance) + Send + Sync>;

struct PortalEntry {
    instance: PortalInstance,
    listeners: SmallVec<[(u64, Listener); 2]>,
}

impl PortalEntry {
    fn new() -> Self {
        Self {
            instance: PortalInstance::default(),
            listeners: SmallVec::new(),
        }
    }
}

#[derive(Default)]
struct RegistryState {
    portals: FxHashMap<String, PortalEntry>,
    next_listener_id: u64,
    pending: VecDeque<String>,
    delivering: bool,
}

impl RegistryState {
    fn enqueue(&mut self, id: &str) {
        if !self.pending.iter().any(|pending| pending == id) {
            self.pending.push_back(id.to_string());
        }
    }
}

/// Shared handle to the portal registry.
///
/// Cloning is cheap and every clone sees the same state. Pass it explicitly
/// to whatever needs it rather than reaching for a global.
///
/// Handles are `Send + Sync`, but delivery assumes one driving thread. The
/// in-progress delivery flag is registry-wide: a mutation made from another
/// thread while listeners are running is queued for the delivering thread,
/// and its own call returns before those listeners have seen it.
#[derive(Clone, Default)]
pub struct PortalRegistry {
    state: Arc<Mutex<RegistryState>>,
}

/// Mutation access to one portal instance inside [`PortalRegistry::update`].
pub struct PortalTransaction<'a> {
    instance: &'a mut PortalInstance,
    changed: bool,
}

impl PortalTransaction<'_> {
    /// Current state, including changes made earlier in this transaction.
    pub fn instance(&self) -> &PortalInstance {
        self.instance
    }

    /// Bind `slot` to `target`. Last write wins.
    pub fn register_target(&mut self, slot: &str, target: NodeId) {
        if self.instance.targets.get(slot) != Some(&target) {
            self.instance.targets.insert(slot.to_string(), target);
            self.changed = true;
        }
    }

    /// Forget `slot`'s target, whatever it is.
    pub fn unregister_target(&mut self, slot: &str) -> bool {
        let removed = self.instance.targets.remove(slot).is_some();
        self.changed |= removed;
        removed
    }

    /// Forget `slot`'s target only if it is still `target`.
    ///
    /// A slot that was remounted under the same key has already replaced the
    /// handle; the old instance's late unregister must leave it alone.
    pub fn unregister_target_if(&mut self, slot: &str, target: NodeId) -> bool {
        if self.instance.targets.get(slot) == Some(&target) {
            self.instance.targets.remove(slot);
            self.changed = true;
            true
        } else {
            false
        }
    }

    /// Select the active slot, or deactivate with `None`. Returns the
    /// activation epoch, which only moves when the active slot changes.
    pub fn set_active_slot(&mut self, slot: Option<&str>) -> u64 {
        if self.instance.active_slot.as_deref() != slot {
            self.instance.active_slot = slot.map(str::to_string);
            self.instance.activation += 1;
            self.changed = true;
        }
        self.instance.activation
    }

    pub fn set_return_path(&mut self, path: Option<&str>) {
        if self.instance.return_path.as_deref() != path {
            self.instance.return_path = path.map(str::to_string);
            self.changed = true;
        }
    }

    /// Activate `slot`, recording `return_path` when one is given.
    ///
    /// Always starts a new activation epoch, even when `slot` is already
    /// active, so the previous activator's guard goes stale.
    pub fn activate(&mut self, slot: &str, return_path: Option<&str>) -> u64 {
        if return_path.is_some() {
            self.set_return_path(return_path);
        }
        if self.instance.active_slot.as_deref() == Some(slot) {
            self.instance.activation += 1;
            self.instance.activation
        } else {
            self.set_active_slot(Some(slot))
        }
    }

    /// Clear targets, active slot and return path.
    pub fn reset(&mut self) {
        self.changed |= !self.instance.is_empty();
        *self.instance = PortalInstance {
            activation: self.instance.activation + 1,
            ..PortalInstance::default()
        };
    }
}

impl PortalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of `id`, creating an empty instance on first reference.
    pub fn get_or_create(&self, id: &str) -> PortalInstance {
        let mut state = self.state.lock();
        state
            .portals
            .entry(id.to_string())
            .or_insert_with(PortalEntry::new)
            .instance
            .clone()
    }

    /// Snapshot of `id` without creating it.
    pub fn get(&self, id: &str) -> Option<PortalInstance> {
        let state = self.state.lock();
        state.portals.get(id).map(|entry| entry.instance.clone())
    }

    /// Every portal id referenced so far.
    pub fn portal_ids(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut ids: Vec<String> = state.portals.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of listeners currently subscribed to `id`.
    pub fn listener_count(&self, id: &str) -> usize {
        let state = self.state.lock();
        state
            .portals
            .get(id)
            .map_or(0, |entry| entry.listeners.len())
    }

    /// Apply `f` to `id` (created if needed) as one atomic change.
    ///
    /// Listeners are notified once, after the lock is released, and only if
    /// something observable changed.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut PortalTransaction<'_>) -> R) -> R {
        let (result, changed) = {
            let mut state = self.state.lock();
            let entry = state
                .portals
                .entry(id.to_string())
                .or_insert_with(PortalEntry::new);
            let mut tx = PortalTransaction {
                instance: &mut entry.instance,
                changed: false,
            };
            let result = f(&mut tx);
            let changed = tx.changed;
            if changed {
                state.enqueue(id);
            }
            (result, changed)
        };
        if changed {
            self.deliver();
        }
        result
    }

    /// Like [`update`](Self::update), but does nothing for unknown ids.
    pub fn update_existing<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut PortalTransaction<'_>) -> R,
    ) -> Option<R> {
        let (result, changed) = {
            let mut state = self.state.lock();
            let entry = state.portals.get_mut(id)?;
            let mut tx = PortalTransaction {
                instance: &mut entry.instance,
                changed: false,
            };
            let result = f(&mut tx);
            let changed = tx.changed;
            if changed {
                state.enqueue(id);
            }
            (result, changed)
        };
        if changed {
            self.deliver();
        }
        Some(result)
    }

    pub fn register_target(&self, id: &str, slot: &str, target: NodeId) {
        debug!(portal = id, slot, %target, "register target");
        self.update(id, |tx| tx.register_target(slot, target));
    }

    /// Unconditional removal by key. No-op for unknown ids and keys.
    pub fn unregister_target(&self, id: &str, slot: &str) {
        debug!(portal = id, slot, "unregister target");
        self.update_existing(id, |tx| tx.unregister_target(slot));
    }

    /// Remove `slot`'s target only while it is still `target`. Returns
    /// whether anything was removed.
    pub fn unregister_target_if(&self, id: &str, slot: &str, target: NodeId) -> bool {
        let removed = self
            .update_existing(id, |tx| tx.unregister_target_if(slot, target))
            .unwrap_or(false);
        debug!(portal = id, slot, %target, removed, "conditional unregister");
        removed
    }

    pub fn set_active_slot(&self, id: &str, slot: Option<&str>) -> u64 {
        debug!(portal = id, ?slot, "set active slot");
        self.update(id, |tx| tx.set_active_slot(slot))
    }

    pub fn set_return_path(&self, id: &str, path: Option<&str>) {
        debug!(portal = id, ?path, "set return path");
        self.update(id, |tx| tx.set_return_path(path));
    }

    /// Activate `slot` and record `return_path` in one notification.
    /// Returns the activation epoch.
    pub fn activate(&self, id: &str, slot: &str, return_path: Option<&str>) -> u64 {
        debug!(portal = id, slot, ?return_path, "activate");
        self.update(id, |tx| tx.activate(slot, return_path))
    }

    /// Switch to `fallback` if activation `epoch` is still the latest.
    ///
    /// Returns whether the fallback happened; a newer activation or a reset
    /// in the meantime wins.
    pub fn fall_back(&self, id: &str, epoch: u64, fallback: &str) -> bool {
        let fell_back = self
            .update_existing(id, |tx| {
                if tx.instance().activation_epoch() == epoch {
                    tx.set_active_slot(Some(fallback));
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false);
        debug!(portal = id, epoch, fallback, fell_back, "fall back");
        fell_back
    }

    /// Replace `id` with a fresh instance. No-op for unknown ids.
    pub fn reset(&self, id: &str) {
        debug!(portal = id, "reset");
        self.update_existing(id, |tx| tx.reset());
    }

    /// Call `listener` after every change to `id` until the returned
    /// subscription is dropped.
    pub fn subscribe(
        &self,
        id: &str,
        listener: impl Fn(&PortalInstance) + Send + Sync + 'static,
    ) -> Subscription {
        let listener_id = {
            let mut state = self.state.lock();
            let listener_id = state.next_listener_id;
            state.next_listener_id += 1;
            state
                .portals
                .entry(id.to_string())
                .or_insert_with(PortalEntry::new)
                .listeners
                .push((listener_id, Arc::new(listener)));
            listener_id
        };
        trace!(portal = id, listener_id, "subscribed");

        let weak: Weak<Mutex<RegistryState>> = Arc::downgrade(&self.state);
        let id = id.to_string();
        Subscription::new(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let removed = {
                let mut state = state.lock();
                state.portals.get_mut(&id).and_then(|entry| {
                    let index = entry
                        .listeners
                        .iter()
                        .position(|(existing, _)| *existing == listener_id)?;
                    Some(entry.listeners.remove(index))
                })
            };
            // Dropped unlocked: whatever the listener captured may call back in.
            drop(removed);
            trace!(portal = %id, listener_id, "unsubscribed");
        })
    }

    fn deliver(&self) {
        {
            let mut state = self.state.lock();
            if state.delivering {
                return;
            }
            state.delivering = true;
        }
        let _guard = DeliveryGuard(&self.state);

        loop {
            let (snapshot, listeners) = {
                let mut state = self.state.lock();
                let Some(id) = state.pending.pop_front() else {
                    return;
                };
                let Some(entry) = state.portals.get(&id) else {
                    continue;
                };
                let listeners: SmallVec<[Listener; 4]> = entry
                    .listeners
                    .iter()
                    .map(|(_, listener)| listener.clone())
                    .collect();
                (entry.instance.clone(), listeners)
            };
            for listener in listeners {
                listener(&snapshot);
            }
        }
    }
}

/// Clears the delivering flag even if a listener panics.
struct DeliveryGuard<'a>(&'a Mutex<RegistryState>);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().delivering = false;
    }
}
