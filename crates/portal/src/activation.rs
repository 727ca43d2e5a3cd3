//! Activation protocol.
//!
//! A page that shows the payload in its own slot holds an
//! [`ActivationGuard`]. When the page goes away the guard moves the payload
//! to the portal's fallback slot instead of hiding it, unless someone else
//! activated a slot (or reset the portal) in the meantime.

use crate::store::PortalRegistry;
use std::fmt;
use tracing::debug;

/// Where a portal's payload is supposed to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationState {
    /// No slot selected; the payload is suspended.
    Inactive,
    /// The payload belongs in this slot (which may not be mounted yet).
    ActiveAt(String),
}

impl ActivationState {
    pub fn is_active_at(&self, slot: &str) -> bool {
        matches!(self, Self::ActiveAt(active) if active == slot)
    }
}

/// Falls back to the portal's default slot when dropped.
#[must_use = "dropping the guard immediately falls back to the default slot"]
pub struct ActivationGuard {
    registry: PortalRegistry,
    portal_id: String,
    slot: String,
    epoch: u64,
    fallback: Option<String>,
}

impl ActivationGuard {
    pub(crate) fn new(
        registry: PortalRegistry,
        portal_id: &str,
        slot: &str,
        epoch: u64,
        fallback: Option<String>,
    ) -> Self {
        Self {
            registry,
            portal_id: portal_id.to_string(),
            slot: slot.to_string(),
            epoch,
            fallback,
        }
    }

    pub fn portal_id(&self) -> &str {
        &self.portal_id
    }

    /// The slot this guard activated.
    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    /// Whether this guard's activation is still the latest one.
    pub fn is_current(&self) -> bool {
        self.registry
            .get(&self.portal_id)
            .is_some_and(|instance| instance.activation_epoch() == self.epoch)
    }

    /// Drop the guard without falling back.
    pub fn keep(mut self) {
        self.fallback = None;
    }
}

impl fmt::Debug for ActivationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationGuard")
            .field("portal_id", &self.portal_id)
            .field("slot", &self.slot)
            .field("epoch", &self.epoch)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        let Some(fallback) = self.fallback.take() else {
            return;
        };
        if !self.registry.fall_back(&self.portal_id, self.epoch, &fallback) {
            debug!(
                portal = %self.portal_id,
                slot = %self.slot,
                "activation superseded, leaving active slot alone"
            );
        }
    }
}
