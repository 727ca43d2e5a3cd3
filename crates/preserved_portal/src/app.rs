//! The demo application: a router with a video page whose player survives
//! navigation by moving between the page and a floating mini player.

use crate::layout::{text_element, Layout, OwnedNode};
use crate::media::LoggingMedia;
use crate::mini_player::MiniPlayer;
use crate::routes::{video_source, Route};
use anyhow::{bail, Context, Result};
use player::{ControlsView, PlayerStore, VideoElement};
use portal::{
    create_portal, ActivationGuard, Host, Portal, PortalConfig, PortalRegistry, SlotAttrs,
    SlotBinding,
};
use render_tree::{NodeId, SharedTree, Tree};
use settings::constants::portal::{MAIN_SLOT, MINI_SLOT};
use std::sync::Arc;
use tracing::{debug, info};

/// Portal the video payload travels through.
pub const VIDEO_PORTAL_ID: &str = "video";

fn video_portal_config(config: &settings::Config) -> PortalConfig {
    PortalConfig::from_settings(config, VIDEO_PORTAL_ID).unwrap_or_else(|| {
        debug!("no video portal declared, using built-in slots");
        PortalConfig::new(VIDEO_PORTAL_ID, [MAIN_SLOT, MINI_SLOT]).with_fallback_slot(MINI_SLOT)
    })
}

/// A video page's portal wiring. Fields drop in order: the activation guard
/// hands the payload to the fallback slot before this page's slot goes away.
struct VideoPage {
    _active: ActivationGuard,
    _slot: SlotBinding,
    _controls: ControlsView,
}

/// The mounted page for the current route.
struct Page {
    video: Option<VideoPage>,
    _root: OwnedNode,
}

impl Page {
    fn mount(app: &App, route: &Route) -> Result<Self> {
        let root = {
            let mut tree = app.tree.lock();
            let root = tree.create_element("section");
            let heading = text_element(&mut tree, "h1", &route.title())?;
            tree.append_child(root, heading)?;
            tree.append_child(app.layout.outlet, root)?;
            root
        };
        let root = OwnedNode::new(&app.tree, root);

        let video = match route {
            Route::Home => {
                app.append_text(root.id(), "p", "Pick a video, then keep browsing.")?;
                None
            }
            Route::About => {
                app.append_text(root.id(), "p", "The player keeps playing across pages.")?;
                None
            }
            Route::Video(id) => Some(app.mount_video_page(root.id(), id, &route.path())?),
        };

        Ok(Self { video, _root: root })
    }

    fn is_video(&self) -> bool {
        self.video.is_some()
    }
}

/// Everything the demo renders. Fields drop in declaration order, page first.
pub struct App {
    page: Option<Page>,
    mini_player: MiniPlayer,
    video: VideoElement,
    host: Host,
    layout: Layout,
    route: Option<Route>,
    media: Arc<LoggingMedia>,
    player: PlayerStore,
    portal: Portal,
    registry: PortalRegistry,
    tree: SharedTree,
}

impl App {
    pub fn new(config: &settings::Config) -> Result<Self> {
        let tree = Tree::shared();
        let registry = PortalRegistry::new();
        let portal = create_portal(&registry, &tree, video_portal_config(config))
            .context("Invalid video portal config")?;
        for slot in [MAIN_SLOT, MINI_SLOT] {
            if !portal.slots().iter().any(|declared| declared == slot) {
                bail!("Video portal must declare a '{}' slot", slot);
            }
        }

        let body = tree.lock().root();
        let layout = Layout::render(&mut tree.lock(), body).context("Failed to render layout")?;

        let player = PlayerStore::new();
        let media = Arc::new(LoggingMedia::new());
        let host = portal.host().context("Failed to mount portal host")?;
        let video = VideoElement::mount(&tree, host.container(), &player, media.clone())
            .context("Failed to mount video element")?;
        let mini_player = MiniPlayer::mount(&portal, &tree, &player, body)
            .context("Failed to mount mini player")?;

        info!(portal = portal.id(), slots = ?portal.slots(), "app ready");

        Ok(Self {
            page: None,
            mini_player,
            video,
            host,
            layout,
            route: None,
            media,
            player,
            portal,
            registry,
            tree,
        })
    }

    /// Go to `path`. Navigating to the current route does nothing.
    ///
    /// The new page mounts before the old one unmounts, so leaving one video
    /// page for another never flashes the mini player.
    pub fn navigate(&mut self, path: &str) -> Result<()> {
        let Some(route) = Route::parse(path) else {
            bail!("No route for '{}'", path);
        };
        if self.route.as_ref() == Some(&route) {
            return Ok(());
        }

        let page = Page::mount(self, &route).with_context(|| format!("Failed to render {}", route))?;
        let previous = self.page.replace(page);
        drop(previous);

        self.layout
            .highlight(&mut self.tree.lock(), &route)
            .context("Failed to update navigation")?;
        info!(route = %route, active_slot = ?self.portal.state().active_slot(), "navigated");
        self.route = Some(route);
        Ok(())
    }

    /// Follow the mini player's return link.
    pub fn return_from_mini_player(&mut self) -> Result<()> {
        let Some(path) = self.mini_player.return_link() else {
            bail!("Mini player is not showing");
        };
        self.navigate(&path)
    }

    pub fn close_mini_player(&self) {
        self.mini_player.close();
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn is_on_video_page(&self) -> bool {
        self.page.as_ref().is_some_and(Page::is_video)
    }

    pub fn portal(&self) -> &Portal {
        &self.portal
    }

    pub fn registry(&self) -> &PortalRegistry {
        &self.registry
    }

    pub fn player(&self) -> &PlayerStore {
        &self.player
    }

    pub fn media(&self) -> &LoggingMedia {
        &self.media
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn video(&self) -> &VideoElement {
        &self.video
    }

    pub fn mini_player(&self) -> &MiniPlayer {
        &self.mini_player
    }

    pub fn tree(&self) -> &SharedTree {
        &self.tree
    }

    /// The whole document as markup.
    pub fn markup(&self) -> String {
        let tree = self.tree.lock();
        tree.to_markup(tree.root())
    }

    fn append_text(&self, parent: NodeId, tag: &str, text: &str) -> Result<()> {
        let mut tree = self.tree.lock();
        let element = text_element(&mut tree, tag, text)?;
        tree.append_child(parent, element)?;
        Ok(())
    }

    fn mount_video_page(&self, page: NodeId, id: &str, path: &str) -> Result<VideoPage> {
        let frame = {
            let mut tree = self.tree.lock();
            let frame = tree.create_element("div");
            tree.set_attribute(frame, "class", "main-player")?;
            tree.append_child(page, frame)?;
            frame
        };

        self.player.init_source(video_source(id));
        let slot = self
            .portal
            .slot(MAIN_SLOT, frame, SlotAttrs::new().class("contents"))?;
        let controls = ControlsView::mount(&self.tree, frame, &self.player)?;
        let active = self.portal.activate(MAIN_SLOT, Some(path))?;
        debug!(video = id, "video page mounted");

        Ok(VideoPage {
            _active: active,
            _slot: slot,
            _controls: controls,
        })
    }
}
