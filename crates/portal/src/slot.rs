//! Slot binding: a mounted render target registered under a slot key.

use crate::error::PortalError;
use crate::store::PortalRegistry;
use render_tree::{NodeId, SharedTree};
use settings::constants::portal::{DEFAULT_CONTAINER_TAG, SLOT_KEY_ATTRIBUTE};
use std::fmt;
use tracing::debug;

/// Element tag and attributes for a slot's target element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotAttrs {
    tag: Option<String>,
    attributes: Vec<(String, String)>,
}

impl SlotAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the slot as `tag` instead of `div`.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }
}

/// A mounted slot.
///
/// Mounting creates the target element under `parent` and registers it
/// before returning, so the host can render into it in the same update.
/// Dropping unregisters it (only if the registry still points at this
/// instance's element) and destroys the element.
pub struct SlotBinding {
    registry: PortalRegistry,
    tree: SharedTree,
    portal_id: String,
    key: String,
    node: NodeId,
}

impl SlotBinding {
    pub fn mount(
        registry: &PortalRegistry,
        tree: &SharedTree,
        portal_id: &str,
        key: &str,
        parent: NodeId,
        attrs: SlotAttrs,
    ) -> Result<Self, PortalError> {
        let node = {
            let mut tree = tree.lock();
            let node = tree.create_element(attrs.tag.as_deref().unwrap_or(DEFAULT_CONTAINER_TAG));
            for (name, value) in attrs.attributes {
                tree.set_attribute(node, name, value)?;
            }
            tree.set_attribute(node, SLOT_KEY_ATTRIBUTE, key)?;
            if let Err(e) = tree.append_child(parent, node) {
                tree.remove(node);
                return Err(e.into());
            }
            node
        };

        // The tree lock is released before registering: listeners lock it.
        registry.register_target(portal_id, key, node);
        debug!(portal = portal_id, slot = key, %node, "slot mounted");

        Ok(Self {
            registry: registry.clone(),
            tree: tree.clone(),
            portal_id: portal_id.to_string(),
            key: key.to_string(),
            node,
        })
    }

    pub fn portal_id(&self) -> &str {
        &self.portal_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The element registered as this slot's target.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Whether the registry still maps this slot's key to this element.
    pub fn is_registered(&self) -> bool {
        self.registry
            .get(&self.portal_id)
            .and_then(|instance| instance.target(&self.key))
            == Some(self.node)
    }
}

impl fmt::Debug for SlotBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotBinding")
            .field("portal_id", &self.portal_id)
            .field("key", &self.key)
            .field("node", &self.node)
            .finish()
    }
}

impl Drop for SlotBinding {
    fn drop(&mut self) {
        let removed = self
            .registry
            .unregister_target_if(&self.portal_id, &self.key, self.node);
        if !removed {
            debug!(
                portal = %self.portal_id,
                slot = %self.key,
                "slot was re-registered by a newer mount, leaving it in place"
            );
        }
        self.tree.lock().remove(self.node);
    }
}
