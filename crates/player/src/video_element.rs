//! The one `<video>` element, rendered once inside a portal host.

use crate::store::{MediaHandle, PlayerStore};
use render_tree::{NodeId, SharedTree, Tree, TreeError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use util::Subscription;

/// Mounted video element.
///
/// Binds `media` to the store for as long as it is mounted and keeps the
/// element's `src` attribute in step with the store's source. Media signals
/// are fed back through [`on_time_update`](Self::on_time_update) and
/// [`on_loaded_metadata`](Self::on_loaded_metadata).
pub struct VideoElement {
    tree: SharedTree,
    store: PlayerStore,
    node: NodeId,
    _subscription: Subscription,
}

impl VideoElement {
    pub fn mount(
        tree: &SharedTree,
        parent: NodeId,
        store: &PlayerStore,
        media: Arc<dyn MediaHandle>,
    ) -> Result<Self, TreeError> {
        let source = store.state().source;
        let node = {
            let mut tree = tree.lock();
            let node = tree.create_element("video");
            if let Err(e) = attach(&mut tree, parent, node, source.as_deref()) {
                tree.remove(node);
                return Err(e);
            }
            node
        };

        store.set_media_handle(Some(media));

        let subscription = {
            let tree = tree.clone();
            store.subscribe(move |state| {
                let mut tree = tree.lock();
                if tree.attribute(node, "src") == state.source.as_deref() {
                    return;
                }
                let synced = match &state.source {
                    Some(source) => tree.set_attribute(node, "src", source.as_str()),
                    None => {
                        tree.remove_attribute(node, "src");
                        Ok(())
                    }
                };
                if let Err(e) = synced {
                    warn!("cannot sync video source: {}", e);
                }
            })
        };
        debug!(%node, "video element mounted");

        Ok(Self {
            tree: tree.clone(),
            store: store.clone(),
            node,
            _subscription: subscription,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// `timeupdate` from the media element.
    pub fn on_time_update(&self, current_time: f64, duration: f64) {
        self.store.sync_time(current_time, duration);
    }

    /// `loadedmetadata` from the media element.
    pub fn on_loaded_metadata(&self, duration: f64) {
        self.store.sync_time(0.0, duration);
    }
}

fn attach(
    tree: &mut Tree,
    parent: NodeId,
    node: NodeId,
    source: Option<&str>,
) -> Result<(), TreeError> {
    tree.set_attribute(node, "playsinline", "")?;
    tree.set_attribute(node, "class", "aspect-video w-full object-contain")?;
    if let Some(source) = source {
        tree.set_attribute(node, "src", source)?;
    }
    tree.append_child(parent, node)
}

impl fmt::Debug for VideoElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoElement").field("node", &self.node).finish()
    }
}

impl Drop for VideoElement {
    fn drop(&mut self) {
        self.store.set_media_handle(None);
        self.tree.lock().remove(self.node);
        debug!(node = %self.node, "video element unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockMediaHandle;
    use pretty_assertions::assert_eq;

    fn mount(tree: &SharedTree, store: &PlayerStore) -> VideoElement {
        let root = tree.lock().root();
        VideoElement::mount(tree, root, store, Arc::new(MockMediaHandle::new())).unwrap()
    }

    #[test]
    fn mount_binds_media_and_renders_video() {
        let tree = Tree::shared();
        let store = PlayerStore::new();
        store.init_source("/media/1.mp4");

        let video = mount(&tree, &store);

        assert!(store.has_media_handle());
        let tree = tree.lock();
        assert_eq!(tree.tag(video.node()), Some("video"));
        assert_eq!(tree.attribute(video.node(), "playsinline"), Some(""));
        assert_eq!(tree.attribute(video.node(), "src"), Some("/media/1.mp4"));
        assert!(tree.is_connected(video.node()));
    }

    #[test]
    fn src_follows_store() {
        let tree = Tree::shared();
        let store = PlayerStore::new();
        let video = mount(&tree, &store);
        assert_eq!(tree.lock().attribute(video.node(), "src"), None);

        store.init_source("/media/2.mp4");
        assert_eq!(tree.lock().attribute(video.node(), "src"), Some("/media/2.mp4"));

        store.reset();
        assert_eq!(tree.lock().attribute(video.node(), "src"), None);
    }

    #[test]
    fn media_signals_sync_time() {
        let tree = Tree::shared();
        let store = PlayerStore::new();
        let video = mount(&tree, &store);

        video.on_loaded_metadata(f64::NAN);
        assert_eq!(store.state().duration, 0.0);

        video.on_loaded_metadata(90.0);
        video.on_time_update(12.0, 90.0);
        assert_eq!(store.state().current_time, 12.0);
        assert_eq!(store.state().duration, 90.0);
    }

    #[test]
    fn failed_mount_leaves_no_node_and_no_handle() {
        let tree = Tree::shared();
        let text = tree.lock().create_text("not a container");
        let before = tree.lock().len();
        let store = PlayerStore::new();

        let err = VideoElement::mount(&tree, text, &store, Arc::new(MockMediaHandle::new()))
            .unwrap_err();

        assert_eq!(err, TreeError::NotAnElement(text));
        assert_eq!(tree.lock().len(), before);
        assert!(!store.has_media_handle());
    }

    #[test]
    fn drop_clears_media_and_removes_node() {
        let tree = Tree::shared();
        let store = PlayerStore::new();
        let video = mount(&tree, &store);
        let node = video.node();

        drop(video);

        assert!(!store.has_media_handle());
        assert!(!tree.lock().is_alive(node));
    }
}
