//! Floating mini player.
//!
//! Shown only while the video portal's active slot is `mini`. It provides
//! the `mini` slot the payload moves into, the playback controls, a close
//! button that resets the portal, and a link back to the page the video was
//! minimized from.

use crate::layout::{link, text_element, OwnedNode};
use parking_lot::Mutex;
use player::{ControlsView, PlayerStore};
use portal::{Portal, PortalError, PortalInstance, SlotAttrs, SlotBinding};
use render_tree::{NodeId, SharedTree};
use settings::constants::portal::MINI_SLOT;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use util::Subscription;

/// Where the return link points when no return path was recorded.
const DEFAULT_RETURN_PATH: &str = "/";
const CLOSE_GLYPH: &str = "✕";

fn return_href(instance: &PortalInstance) -> &str {
    instance.return_path().unwrap_or(DEFAULT_RETURN_PATH)
}

/// Shared pieces the visible view is built from.
struct Context {
    portal: Portal,
    tree: SharedTree,
    player: PlayerStore,
    parent: NodeId,
}

/// The visible mini player. Fields drop in order: the slot goes first so the
/// payload leaves before its surroundings are destroyed.
struct MiniView {
    _slot: SlotBinding,
    _controls: ControlsView,
    return_link: NodeId,
    root: OwnedNode,
}

impl MiniView {
    fn mount(cx: &Context, instance: &PortalInstance) -> Result<Self, PortalError> {
        let (root, return_link) = {
            let mut tree = cx.tree.lock();
            let root = tree.create_element("div");
            tree.set_attribute(root, "class", "mini-player")?;
            let close = text_element(&mut tree, "button", CLOSE_GLYPH)?;
            tree.set_attribute(close, "data-action", "close")?;
            let return_link = link(&mut tree, return_href(instance), "Back")?;
            tree.append_child(root, close)?;
            tree.append_child(root, return_link)?;
            tree.append_child(cx.parent, root)?;
            (root, return_link)
        };
        let root = OwnedNode::new(&cx.tree, root);

        let slot = cx
            .portal
            .slot(MINI_SLOT, root.id(), SlotAttrs::new().class("contents"))?;
        let controls = ControlsView::mount(&cx.tree, root.id(), &cx.player)?;
        debug!("mini player shown");

        Ok(Self {
            _slot: slot,
            _controls: controls,
            return_link,
            root,
        })
    }

    fn update(&self, tree: &SharedTree, instance: &PortalInstance) {
        let href = return_href(instance);
        let mut tree = tree.lock();
        if tree.attribute(self.return_link, "href") != Some(href) {
            if let Err(e) = tree.set_attribute(self.return_link, "href", href) {
                warn!("cannot update return link: {}", e);
            }
        }
    }
}

/// Reacts to the video portal and shows or hides the [`MiniView`].
pub struct MiniPlayer {
    portal: Portal,
    tree: SharedTree,
    view: Arc<Mutex<Option<MiniView>>>,
    mounted: Arc<AtomicBool>,
    subscription: Option<Subscription>,
}

impl MiniPlayer {
    pub fn mount(
        portal: &Portal,
        tree: &SharedTree,
        player: &PlayerStore,
        parent: NodeId,
    ) -> Result<Self, PortalError> {
        let cx = Context {
            portal: portal.clone(),
            tree: tree.clone(),
            player: player.clone(),
            parent,
        };
        let view = Arc::new(Mutex::new(None));
        let mounted = Arc::new(AtomicBool::new(true));

        // Initial render happens before subscribing, so registering the slot
        // can't call back into this player while `view` is locked.
        let initial = portal.state();
        if initial.active_slot() == Some(MINI_SLOT) {
            *view.lock() = Some(MiniView::mount(&cx, &initial)?);
        }

        let subscription = {
            let view = view.clone();
            let mounted = mounted.clone();
            portal.subscribe(move |instance| {
                if mounted.load(Ordering::SeqCst) {
                    let hidden = sync(&cx, &view, instance);
                    drop(hidden);
                }
            })
        };

        Ok(Self {
            portal: portal.clone(),
            tree: tree.clone(),
            view,
            mounted,
            subscription: Some(subscription),
        })
    }

    pub fn is_visible(&self) -> bool {
        self.view.lock().is_some()
    }

    /// Target of the "back" link while visible.
    pub fn return_link(&self) -> Option<String> {
        let view = self.view.lock();
        let view = view.as_ref()?;
        let tree = self.tree.lock();
        tree.attribute(view.return_link, "href").map(str::to_string)
    }

    /// The root node while visible.
    pub fn node(&self) -> Option<NodeId> {
        self.view.lock().as_ref().map(|view| view.root.id())
    }

    /// Close button: forget the portal entirely, hiding the player.
    pub fn close(&self) {
        debug!("mini player closed");
        self.portal.reset();
    }
}

/// Bring the view in line with `instance`. Returns a view to drop once the
/// lock is released.
fn sync(
    cx: &Context,
    view: &Mutex<Option<MiniView>>,
    instance: &PortalInstance,
) -> Option<MiniView> {
    let mut view = view.lock();
    if instance.active_slot() != Some(MINI_SLOT) {
        let hidden = view.take();
        if hidden.is_some() {
            debug!("mini player hidden");
        }
        return hidden;
    }

    match view.as_ref() {
        Some(visible) => visible.update(&cx.tree, instance),
        None => match MiniView::mount(cx, instance) {
            Ok(mounted) => *view = Some(mounted),
            Err(e) => warn!("cannot show mini player: {}", e),
        },
    }
    None
}

impl Drop for MiniPlayer {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.subscription.take();
        let view = self.view.lock().take();
        drop(view);
    }
}
