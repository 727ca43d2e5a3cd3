//! `create_portal`: a portal id bound to its declared slots.
//!
//! # Usage
//!
//! ```ignore
//! let video = create_portal(
//!     &registry,
//!     &tree,
//!     PortalConfig::new("video", ["main", "mini"]).with_fallback_slot("mini"),
//! )?;
//!
//! // Rendered once, at the application root.
//! let host = video.host()?;
//!
//! // Rendered by the page that shows the big player.
//! let main = video.slot("main", page_node, SlotAttrs::new().class("contents"))?;
//! let _active = video.activate("main", Some("/video/1"))?;
//! ```

use crate::activation::ActivationGuard;
use crate::error::PortalError;
use crate::host::{Host, HostOptions};
use crate::instance::PortalInstance;
use crate::slot::{SlotAttrs, SlotBinding};
use crate::store::PortalRegistry;
use collections::FxHashSet;
use render_tree::{NodeId, SharedTree, Tree, TreeError};
use std::fmt;
use std::sync::Arc;
use util::Subscription;

/// Declaration of one portal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalConfig {
    pub id: String,
    pub slots: Vec<String>,
    /// Slot to fall back to when an activating page goes away.
    pub fallback_slot: Option<String>,
    /// Host container tag; `div` when unset.
    pub container_tag: Option<String>,
}

impl PortalConfig {
    pub fn new(id: impl Into<String>, slots: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id: id.into(),
            slots: slots.into_iter().map(Into::into).collect(),
            fallback_slot: None,
            container_tag: None,
        }
    }

    pub fn with_fallback_slot(mut self, slot: impl Into<String>) -> Self {
        self.fallback_slot = Some(slot.into());
        self
    }

    pub fn with_container_tag(mut self, tag: impl Into<String>) -> Self {
        self.container_tag = Some(tag.into());
        self
    }

    /// Build from the `[[portals]]` entry for `id` in the settings file.
    pub fn from_settings(config: &settings::Config, id: &str) -> Option<Self> {
        let entry = config.portal(id)?;
        Some(Self {
            id: entry.id.clone(),
            slots: entry.slots.clone(),
            fallback_slot: Some(config.fallback_slot_for(id).to_string()),
            container_tag: Some(config.container_tag_for(id).to_string()),
        })
    }

    fn validate(&self) -> Result<(), PortalError> {
        let invalid = |reason: String| Err(PortalError::InvalidConfig(reason));

        if self.id.is_empty() {
            return invalid("portal id must not be empty".to_string());
        }
        if self.slots.is_empty() {
            return invalid(format!("portal '{}' declares no slots", self.id));
        }
        let mut seen = FxHashSet::default();
        for slot in &self.slots {
            if slot.is_empty() {
                return invalid(format!("portal '{}' has an empty slot key", self.id));
            }
            if !seen.insert(slot.as_str()) {
                return invalid(format!(
                    "portal '{}' declares slot '{}' more than once",
                    self.id, slot
                ));
            }
        }
        if let Some(fallback) = &self.fallback_slot {
            if !seen.contains(fallback.as_str()) {
                return invalid(format!(
                    "portal '{}' falls back to undeclared slot '{}'",
                    self.id, fallback
                ));
            }
        }
        Ok(())
    }
}

/// A portal bound to a registry and a tree.
///
/// Cheap to clone; every clone addresses the same portal id.
#[derive(Clone)]
pub struct Portal {
    registry: PortalRegistry,
    tree: SharedTree,
    config: Arc<PortalConfig>,
}

/// Validate `config` and bind it to `registry` and `tree`.
pub fn create_portal(
    registry: &PortalRegistry,
    tree: &SharedTree,
    config: PortalConfig,
) -> Result<Portal, PortalError> {
    config.validate()?;
    registry.get_or_create(&config.id);
    Ok(Portal {
        registry: registry.clone(),
        tree: tree.clone(),
        config: Arc::new(config),
    })
}

impl Portal {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn slots(&self) -> &[String] {
        &self.config.slots
    }

    pub fn fallback_slot(&self) -> Option<&str> {
        self.config.fallback_slot.as_deref()
    }

    pub fn registry(&self) -> &PortalRegistry {
        &self.registry
    }

    pub fn tree(&self) -> &SharedTree {
        &self.tree
    }

    fn ensure_declared(&self, slot: &str) -> Result<(), PortalError> {
        if self.config.slots.iter().any(|declared| declared == slot) {
            Ok(())
        } else {
            Err(PortalError::UnknownSlot {
                portal: self.config.id.clone(),
                slot: slot.to_string(),
            })
        }
    }

    fn host_options(&self) -> HostOptions {
        HostOptions {
            tag: self.config.container_tag.clone(),
        }
    }

    /// Mount the persistent payload container.
    pub fn host(&self) -> Result<Host, PortalError> {
        Host::mount(&self.registry, &self.tree, self.id(), self.host_options())
    }

    /// Mount the payload container and render static content into it.
    pub fn host_with(
        &self,
        render: impl FnOnce(&mut Tree, NodeId) -> Result<(), TreeError>,
    ) -> Result<Host, PortalError> {
        Host::mount_with(
            &self.registry,
            &self.tree,
            self.id(),
            self.host_options(),
            render,
        )
    }

    /// Mount a slot target under `parent`.
    pub fn slot(
        &self,
        key: &str,
        parent: NodeId,
        attrs: SlotAttrs,
    ) -> Result<SlotBinding, PortalError> {
        self.ensure_declared(key)?;
        SlotBinding::mount(&self.registry, &self.tree, self.id(), key, parent, attrs)
    }

    /// Current state of this portal.
    pub fn state(&self) -> PortalInstance {
        self.registry.get_or_create(self.id())
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&PortalInstance) + Send + Sync + 'static,
    ) -> Subscription {
        self.registry.subscribe(self.id(), listener)
    }

    pub fn set_active_slot(&self, slot: Option<&str>) -> Result<(), PortalError> {
        if let Some(slot) = slot {
            self.ensure_declared(slot)?;
        }
        self.registry.set_active_slot(self.id(), slot);
        Ok(())
    }

    pub fn set_return_path(&self, path: Option<&str>) {
        self.registry.set_return_path(self.id(), path);
    }

    pub fn reset(&self) {
        self.registry.reset(self.id());
    }

    pub fn register_target(&self, slot: &str, target: NodeId) -> Result<(), PortalError> {
        self.ensure_declared(slot)?;
        self.registry.register_target(self.id(), slot, target);
        Ok(())
    }

    pub fn unregister_target(&self, slot: &str) {
        self.registry.unregister_target(self.id(), slot);
    }

    /// Show the payload in `slot` until the returned guard drops, then fall
    /// back to the configured fallback slot.
    ///
    /// Activating the fallback slot itself yields a guard that does nothing
    /// on drop.
    pub fn activate(
        &self,
        slot: &str,
        return_path: Option<&str>,
    ) -> Result<ActivationGuard, PortalError> {
        self.ensure_declared(slot)?;
        let epoch = self.registry.activate(self.id(), slot, return_path);
        let fallback = self
            .config
            .fallback_slot
            .clone()
            .filter(|fallback| fallback != slot);
        Ok(ActivationGuard::new(
            self.registry.clone(),
            self.id(),
            slot,
            epoch,
            fallback,
        ))
    }
}

impl fmt::Debug for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Portal")
            .field("id", &self.config.id)
            .field("slots", &self.config.slots)
            .finish()
    }
}
