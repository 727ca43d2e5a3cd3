//! Shared fixtures for the portal integration tests.

// Not every test module uses every helper.
#![allow(dead_code)]

use portal::{create_portal, Host, Portal, PortalConfig, PortalRegistry};
use render_tree::{NodeId, SharedTree, Tree};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use util::Subscription;

pub const VIDEO: &str = "video";
pub const MAIN: &str = "main";
pub const MINI: &str = "mini";

// ============================================================================
// Test Environment
// ============================================================================

/// A fresh registry and tree, isolated from every other test.
pub struct TestEnv {
    pub registry: PortalRegistry,
    pub tree: SharedTree,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            registry: PortalRegistry::new(),
            tree: Tree::shared(),
        }
    }

    /// The `video` portal with `main` and `mini` slots, falling back to `mini`.
    pub fn video_portal(&self) -> Portal {
        create_portal(
            &self.registry,
            &self.tree,
            PortalConfig::new(VIDEO, [MAIN, MINI]).with_fallback_slot(MINI),
        )
        .expect("video portal config is valid")
    }

    /// A `section` element attached under the root, standing in for a page.
    pub fn page(&self) -> NodeId {
        let mut tree = self.tree.lock();
        let root = tree.root();
        let page = tree.create_element("section");
        tree.append_child(root, page).expect("root accepts children");
        page
    }

    /// A detached element, for registering targets by hand.
    pub fn element(&self) -> NodeId {
        self.tree.lock().create_element("div")
    }

    /// Render a marker subtree into the host and return its root.
    pub fn render_payload(&self, host: &Host) -> NodeId {
        let mut tree = self.tree.lock();
        let marker = tree.create_element("video");
        let label = tree.create_text("payload");
        tree.append_child(marker, label).expect("marker is an element");
        tree.append_child(host.container(), marker)
            .expect("container is an element");
        marker
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.lock().parent(node)
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree.lock().contains(ancestor, node)
    }

    pub fn is_alive(&self, node: NodeId) -> bool {
        self.tree.lock().is_alive(node)
    }

    pub fn destroyed(&self) -> usize {
        self.tree.lock().stats().destroyed
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Notification Counter
// ============================================================================

/// Counts notifications delivered for one portal id.
pub struct NotificationCounter {
    calls: Arc<AtomicUsize>,
    _subscription: Subscription,
}

impl NotificationCounter {
    pub fn new(registry: &PortalRegistry, id: &str) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = calls.clone();
        let subscription = registry.subscribe(id, move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        Self {
            calls,
            _subscription: subscription,
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
