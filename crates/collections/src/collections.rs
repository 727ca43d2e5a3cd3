//! Fast collection types for the portal crates.
//!
//! Re-exports `FxHashMap` and `FxHashSet` (slot keys and node ids are small),
//! plus `IndexMap`/`IndexSet` with FxHash where attribute order must be kept.

pub use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
pub use std::collections::*;

/// Insertion-ordered hash map with FxHash.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

/// Insertion-ordered hash set with FxHash.
pub type IndexSet<T> = indexmap::IndexSet<T, FxBuildHasher>;
