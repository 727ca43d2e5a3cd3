//! Per-portal state.

use crate::activation::ActivationState;
use collections::FxHashMap;
use render_tree::NodeId;

/// State of one portal id: registered slot targets, the active slot key and
/// the return path.
///
/// The active slot may name a key with no registered target; the host then
/// has nowhere to render and stays suspended until one registers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortalInstance {
    pub(crate) targets: FxHashMap<String, NodeId>,
    pub(crate) active_slot: Option<String>,
    pub(crate) return_path: Option<String>,
    /// Bumped by every activation and reset; lets a stale activation guard
    /// detect that someone else has taken over.
    pub(crate) activation: u64,
}

impl PortalInstance {
    pub fn targets(&self) -> &FxHashMap<String, NodeId> {
        &self.targets
    }

    /// Registered target for `slot`, if any.
    pub fn target(&self, slot: &str) -> Option<NodeId> {
        self.targets.get(slot).copied()
    }

    pub fn active_slot(&self) -> Option<&str> {
        self.active_slot.as_deref()
    }

    pub fn return_path(&self) -> Option<&str> {
        self.return_path.as_deref()
    }

    /// Target bound to the active slot key.
    pub fn active_target(&self) -> Option<NodeId> {
        self.target(self.active_slot.as_deref()?)
    }

    pub fn activation_state(&self) -> ActivationState {
        match &self.active_slot {
            Some(slot) => ActivationState::ActiveAt(slot.clone()),
            None => ActivationState::Inactive,
        }
    }

    pub fn activation_epoch(&self) -> u64 {
        self.activation
    }

    /// True when nothing is registered, active or remembered.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.active_slot.is_none() && self.return_path.is_none()
    }
}
