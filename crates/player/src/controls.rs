//! Play/pause button and elapsed/total time readout.

use crate::store::{PlayerState, PlayerStore};
use render_tree::{NodeId, SharedTree, Tree, TreeError};
use settings::constants::player::{PAUSE_GLYPH, PLAY_GLYPH, TIME_PLACEHOLDER};
use std::fmt;
use tracing::warn;
use util::Subscription;

/// Format seconds as `m:ss`. Unknown, zero and negative times render as
/// `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return TIME_PLACEHOLDER.to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn glyph(state: &PlayerState) -> &'static str {
    if state.is_playing {
        PAUSE_GLYPH
    } else {
        PLAY_GLYPH
    }
}

fn readout(state: &PlayerState) -> String {
    format!(
        "{} / {}",
        format_time(state.current_time),
        format_time(state.duration)
    )
}

/// Mounted controls bar.
pub struct ControlsView {
    tree: SharedTree,
    store: PlayerStore,
    root: NodeId,
    button_label: NodeId,
    time_label: NodeId,
    _subscription: Subscription,
}

impl ControlsView {
    pub fn mount(tree: &SharedTree, parent: NodeId, store: &PlayerStore) -> Result<Self, TreeError> {
        let state = store.state();
        let (root, button_label, time_label) = {
            let mut tree = tree.lock();
            let root = tree.create_element("div");
            let button = tree.create_element("button");
            let button_label = tree.create_text(glyph(&state));
            let time = tree.create_element("span");
            let time_label = tree.create_text(readout(&state));
            let built = assemble(&mut tree, parent, root, [button, button_label, time, time_label]);
            if let Err(e) = built {
                for node in [root, button, button_label, time, time_label] {
                    tree.remove(node);
                }
                return Err(e);
            }
            (root, button_label, time_label)
        };

        let subscription = {
            let tree = tree.clone();
            store.subscribe(move |state| {
                if let Err(e) = render(&mut tree.lock(), button_label, time_label, state) {
                    warn!("cannot update controls: {}", e);
                }
            })
        };

        Ok(Self {
            tree: tree.clone(),
            store: store.clone(),
            root,
            button_label,
            time_label,
            _subscription: subscription,
        })
    }

    pub fn node(&self) -> NodeId {
        self.root
    }

    /// The play/pause button was pressed.
    pub fn click(&self) {
        self.store.toggle_play();
    }

    /// Glyph currently shown on the button.
    pub fn button_text(&self) -> String {
        self.tree.lock().text_content(self.button_label)
    }

    /// Current `elapsed / total` text.
    pub fn time_text(&self) -> String {
        self.tree.lock().text_content(self.time_label)
    }
}

/// Wire the freshly created controls nodes together and attach them to
/// `parent`.
fn assemble(
    tree: &mut Tree,
    parent: NodeId,
    root: NodeId,
    [button, button_label, time, time_label]: [NodeId; 4],
) -> Result<(), TreeError> {
    tree.set_attribute(root, "class", "controls")?;
    tree.append_child(button, button_label)?;
    tree.append_child(time, time_label)?;
    tree.append_child(root, button)?;
    tree.append_child(root, time)?;
    tree.append_child(parent, root)
}

fn render(
    tree: &mut Tree,
    button_label: NodeId,
    time_label: NodeId,
    state: &PlayerState,
) -> Result<(), TreeError> {
    tree.set_text(button_label, glyph(state))?;
    tree.set_text(time_label, readout(state))
}

impl fmt::Debug for ControlsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlsView").field("root", &self.root).finish()
    }
}

impl Drop for ControlsView {
    fn drop(&mut self) {
        self.tree.lock().remove(self.root);
    }
}
