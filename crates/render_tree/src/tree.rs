//! The node arena.

use crate::node::{Node, NodeId, NodeKind};
use collections::{FxHashMap, IndexMap};
use parking_lot::Mutex;
use std::fmt::Write;
use std::sync::Arc;
use thiserror::Error;
use tracing::{trace, warn};

/// A tree shared between the components that render into it.
pub type SharedTree = Arc<Mutex<Tree>>;

/// Structural errors raised by tree mutations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("cannot insert {child} into {parent}: it would become its own ancestor")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0} is not a text node")]
    NotText(NodeId),
}

/// Lifetime counters, for asserting that nodes were moved rather than rebuilt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes ever created (root included).
    pub created: usize,
    /// Nodes ever destroyed.
    pub destroyed: usize,
}

/// Arena of nodes hanging off a single root element.
///
/// Detached nodes stay alive until [`Tree::remove`] destroys them, the same
/// way a DOM node lives on while something still references it.
pub struct Tree {
    nodes: FxHashMap<NodeId, Node>,
    root: NodeId,
    stats: TreeStats,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree with an empty `body` root.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: FxHashMap::default(),
            root: NodeId::new(),
            stats: TreeStats::default(),
        };
        tree.root = tree.insert(NodeKind::Element {
            tag: "body".to_string(),
            attributes: IndexMap::default(),
        });
        tree
    }

    /// Create an empty tree behind a shared handle.
    pub fn shared() -> SharedTree {
        Arc::new(Mutex::new(Self::new()))
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, Node::new(kind));
        self.stats.created += 1;
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.insert(NodeKind::Element {
            tag: tag.into(),
            attributes: IndexMap::default(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.insert(NodeKind::Text(text.into()))
    }

    /// Whether `id` still resolves to a node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&id).map(|node| &node.kind)
    }

    /// Element tag, or `None` for text and dead nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::UnknownNode(id))?;
        match &mut node.kind {
            NodeKind::Element { attributes, .. } => {
                attributes.insert(name.into(), value.into());
                Ok(())
            }
            NodeKind::Text(_) => Err(TreeError::NotAnElement(id)),
        }
    }

    /// Replace the contents of a text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::UnknownNode(id))?;
        match &mut node.kind {
            NodeKind::Text(current) => {
                *current = text.into();
                Ok(())
            }
            NodeKind::Element { .. } => Err(TreeError::NotText(id)),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        match &mut self.nodes.get_mut(&id)?.kind {
            NodeKind::Element { attributes, .. } => attributes.shift_remove(name),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id)?.parent
    }

    /// Children in document order; empty for dead nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Inclusive ancestry check: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return self.is_alive(id);
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether `id` is reachable from the root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// Like DOM `appendChild`, a child that already has a parent is moved,
    /// not copied: its identity and its whole subtree are preserved.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        match self.kind(parent) {
            None => return Err(TreeError::UnknownNode(parent)),
            Some(NodeKind::Text(_)) => return Err(TreeError::NotAnElement(parent)),
            Some(NodeKind::Element { .. }) => {}
        }
        if !self.is_alive(child) {
            return Err(TreeError::UnknownNode(child));
        }
        if self.contains(child, parent) {
            return Err(TreeError::HierarchyRequest { parent, child });
        }

        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        trace!(%parent, %child, "appended");
        Ok(())
    }

    /// Take `id` out of its parent without destroying it.
    ///
    /// Returns whether the node had a parent.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes.get_mut(&id).and_then(|node| node.parent.take()) else {
            return false;
        };
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|child| *child != id);
        }
        true
    }

    /// Mark `id` as owned outside its current parent.
    pub fn pin(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::UnknownNode(id))?;
        node.pinned = true;
        Ok(())
    }

    pub fn unpin(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.pinned = false;
        }
    }

    pub fn is_pinned(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|node| node.pinned)
    }

    /// Destroy `id` and its subtree. Returns how many nodes were destroyed.
    ///
    /// Pinned descendants are detached and kept alive instead: whoever pinned
    /// them is responsible for their lifetime. Removing the root or a dead
    /// node does nothing.
    pub fn remove(&mut self, id: NodeId) -> usize {
        if id == self.root || !self.is_alive(id) {
            return 0;
        }

        self.detach(id);
        let mut destroyed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if current != id && self.is_pinned(current) {
                if let Some(node) = self.nodes.get_mut(&current) {
                    node.parent = None;
                }
                warn!(node = %current, "pinned node rescued from destroyed subtree");
                continue;
            }
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
                destroyed += 1;
            }
        }

        self.stats.destroyed += destroyed;
        trace!(node = %id, destroyed, "removed");
        destroyed
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Element { .. }) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    /// HTML-like rendering of `id`, for logs and snapshots.
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(&escape(text)),
            Some(NodeKind::Element { tag, attributes }) => {
                let _ = write!(out, "<{}", tag);
                for (name, value) in attributes {
                    let _ = write!(out, " {}=\"{}\"", name, escape(value));
                }
                out.push('>');
                for child in self.children(id) {
                    self.write_markup(*child, out);
                }
                let _ = write!(out, "</{}>", tag);
            }
            None => {}
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
