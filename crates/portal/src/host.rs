//! Host relocator: the single persistent payload of a portal.

use crate::error::PortalError;
use crate::instance::PortalInstance;
use crate::store::PortalRegistry;
use render_tree::{NodeId, SharedTree, Tree, TreeError};
use settings::constants::portal::{DEFAULT_CONTAINER_TAG, HOST_ATTRIBUTE};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use util::{debug_panic, Subscription};

/// Host container options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostOptions {
    /// Container element tag; `div` when unset.
    pub tag: Option<String>,
}

impl HostOptions {
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
        }
    }
}

/// Keeps one container node parented under whatever target the portal's
/// active slot resolves to.
///
/// The container is created once per mount and pinned, so moving between
/// slot targets never destroys it or anything rendered inside it. With no
/// resolvable target it is detached (suspended) until one registers.
pub struct Host {
    tree: SharedTree,
    portal_id: String,
    container: NodeId,
    mounted: Arc<AtomicBool>,
    subscription: Option<Subscription>,
}

impl Host {
    pub fn mount(
        registry: &PortalRegistry,
        tree: &SharedTree,
        portal_id: &str,
        options: HostOptions,
    ) -> Result<Self, PortalError> {
        let container = {
            let mut tree = tree.lock();
            let container =
                tree.create_element(options.tag.as_deref().unwrap_or(DEFAULT_CONTAINER_TAG));
            tree.set_attribute(container, HOST_ATTRIBUTE, portal_id)?;
            tree.pin(container)?;
            container
        };
        let mounted = Arc::new(AtomicBool::new(true));

        let subscription = {
            let tree = tree.clone();
            let mounted = mounted.clone();
            let id = portal_id.to_string();
            registry.subscribe(portal_id, move |instance| {
                if mounted.load(Ordering::SeqCst) {
                    relocate(&tree, &id, container, instance);
                }
            })
        };

        relocate(tree, portal_id, container, &registry.get_or_create(portal_id));
        debug!(portal = portal_id, %container, "host mounted");

        Ok(Self {
            tree: tree.clone(),
            portal_id: portal_id.to_string(),
            container,
            mounted,
            subscription: Some(subscription),
        })
    }

    /// Mount and render the payload into the container in one step.
    pub fn mount_with(
        registry: &PortalRegistry,
        tree: &SharedTree,
        portal_id: &str,
        options: HostOptions,
        render: impl FnOnce(&mut Tree, NodeId) -> Result<(), TreeError>,
    ) -> Result<Self, PortalError> {
        let host = Self::mount(registry, tree, portal_id, options)?;
        // Release the tree before `host` can drop on the error path.
        let rendered = render(&mut *tree.lock(), host.container);
        rendered?;
        Ok(host)
    }

    pub fn portal_id(&self) -> &str {
        &self.portal_id
    }

    /// The persistent container payload content renders into.
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// The slot target currently holding the container.
    pub fn target(&self) -> Option<NodeId> {
        self.tree.lock().parent(self.container)
    }

    /// True while there is no target to render into.
    pub fn is_suspended(&self) -> bool {
        self.target().is_none()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("portal_id", &self.portal_id)
            .field("container", &self.container)
            .finish()
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.subscription.take();
        let mut tree = self.tree.lock();
        tree.unpin(self.container);
        tree.remove(self.container);
        debug!(portal = %self.portal_id, "host unmounted");
    }
}

fn relocate(tree: &SharedTree, portal_id: &str, container: NodeId, instance: &PortalInstance) {
    let mut tree = tree.lock();
    if !tree.is_alive(container) {
        debug_panic!(
            "host container {} for portal '{}' destroyed while mounted",
            container,
            portal_id
        );
        return;
    }

    let target = instance.active_target().filter(|target| {
        let alive = tree.is_alive(*target);
        if !alive {
            warn!(portal = portal_id, %target, "active slot target no longer exists");
        }
        alive
    });

    match target {
        Some(target) if tree.parent(container) == Some(target) => {}
        Some(target) => match tree.append_child(target, container) {
            Ok(()) => debug!(portal = portal_id, %target, "payload relocated"),
            Err(e) => {
                warn!(portal = portal_id, "cannot relocate payload: {}", e);
                tree.detach(container);
            }
        },
        None => {
            if tree.detach(container) {
                debug!(portal = portal_id, "payload suspended");
            }
        }
    }
}
