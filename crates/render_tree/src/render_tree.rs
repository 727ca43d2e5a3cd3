//! Retained node tree used as the render target substrate.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Ids are plain non-owning
//! handles: holding one never keeps a node alive, and every lookup tolerates
//! a node that has since been destroyed.

mod node;
mod tree;

pub use node::{NodeId, NodeKind};
pub use tree::{SharedTree, Tree, TreeError, TreeStats};
