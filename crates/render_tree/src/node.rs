//! Node identity and payload.

use collections::IndexMap;
use std::fmt;
use uuid::Uuid;

/// Non-owning handle to a node in a [`Tree`](crate::Tree).
///
/// Copying an id never extends the node's lifetime; resolve it against the
/// tree at the point of use.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Uuid);

impl NodeId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First block of the uuid is plenty to tell nodes apart in logs.
        let simple = self.0.simple().to_string();
        write!(f, "NodeId({})", &simple[..8])
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a node holds.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// An element with a tag and ordered attributes.
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
    },
    /// A text leaf.
    Text(String),
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Pinned nodes are owned by something outside their current parent and
    /// survive the destruction of that parent.
    pub(crate) pinned: bool,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            pinned: false,
        }
    }
}
