//! The stacking-context index: painting-order ranks for every node.
//!
//! [CSS 2.1 Appendix E, Elaborate description of stacking contexts](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! A node *establishes a context* if it is the root or positioned with a
//! non-`auto` z-index. Positioned nodes with `z-index: auto` and floated
//! nodes get entries of their own (they are individually ordered within
//! their context); every other node shares the entry of its nearest
//! ancestor that has one.
//!
//! [`StackingIndex::restack`] flattens the whole index into three total
//! orders (inline, block, stacking) so the painting-order sorter can
//! compare any two display items by one integer instead of re-walking
//! the tree per paint.

use std::collections::HashMap;

use larch_dom::{DomTree, NodeId};

use crate::style::ComputedValues;
use crate::values::keywords::{Float, Position};

/// The three painting-order ranks assigned to an entry by
/// [`StackingIndex::restack`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackRanks {
    /// Rank for inline-level content governed by this entry.
    pub inline: i32,
    /// Rank for block-level content governed by this entry.
    pub block: i32,
    /// Rank for the entry's own box (a context's background and border
    /// paint before everything inside it).
    pub stacking: i32,
}

/// Why a node has an entry of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    /// Establishes a stacking context with this z-index.
    Context { z: i32 },
    /// Positioned with `z-index: auto`.
    Positioned,
    /// Floated, neither positioned nor context-forming.
    Floated,
}

#[derive(Debug)]
struct StackEntry {
    kind: EntryKind,
    ranks: StackRanks,
}

/// Painting-order buckets within one stacking context, in paint order.
///
/// [Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
mod bucket {
    /// The context's own background and border.
    pub const SELF: u8 = 1;
    /// Descendant contexts with negative z-index.
    pub const NEGATIVE_Z: u8 = 2;
    /// In-flow block-level descendants.
    pub const BLOCK: u8 = 3;
    /// Floats.
    pub const FLOAT: u8 = 4;
    /// In-flow inline-level descendants.
    pub const INLINE: u8 = 5;
    /// Positioned descendants with `z-index: auto` or `0`.
    pub const POSITIONED: u8 = 6;
    /// Descendant contexts with positive z-index.
    pub const POSITIVE_Z: u8 = 7;
}

/// Per-document stacking index.
#[derive(Debug, Default)]
pub struct StackingIndex {
    entries: HashMap<NodeId, StackEntry>,
}

impl StackingIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        StackingIndex {
            entries: HashMap::new(),
        }
    }

    /// Recompute the entry (or absence of one) for `node` from its new
    /// computed values. Returns true if the node's membership changed,
    /// in which case the caller must [`StackingIndex::restack`] before
    /// the next paint.
    pub fn update(&mut self, node: NodeId, values: &ComputedValues, is_root: bool) -> bool {
        let desired = Self::classify(values, is_root);
        match (self.entries.get(&node).map(|e| e.kind), desired) {
            (old, new) if old == new => false,
            (_, Some(kind)) => {
                let _ = self.entries.insert(
                    node,
                    StackEntry {
                        kind,
                        ranks: StackRanks::default(),
                    },
                );
                true
            }
            (_, None) => {
                let _ = self.entries.remove(&node);
                true
            }
        }
    }

    fn classify(values: &ComputedValues, is_root: bool) -> Option<EntryKind> {
        if is_root {
            let z = if values.has_explicit_z_index() {
                values.z_index
            } else {
                0
            };
            return Some(EntryKind::Context { z });
        }
        if values.position != Position::Static {
            if values.has_explicit_z_index() {
                return Some(EntryKind::Context {
                    z: values.z_index,
                });
            }
            return Some(EntryKind::Positioned);
        }
        if values.float != Float::None {
            return Some(EntryKind::Floated);
        }
        None
    }

    /// Drop the entry for a destroyed node. Returns true if one existed.
    pub fn remove(&mut self, node: NodeId) -> bool {
        self.entries.remove(&node).is_some()
    }

    /// True if `node` establishes a stacking context.
    #[must_use]
    pub fn is_context(&self, node: NodeId) -> bool {
        matches!(
            self.entries.get(&node).map(|e| e.kind),
            Some(EntryKind::Context { .. })
        )
    }

    /// The entry governing `node`: its own, or the nearest ancestor's.
    #[must_use]
    pub fn entry_of(&self, tree: &DomTree, node: NodeId) -> Option<NodeId> {
        if self.entries.contains_key(&node) {
            return Some(node);
        }
        tree.ancestors(node).find(|a| self.entries.contains_key(a))
    }

    /// The painting-order ranks governing `node`.
    #[must_use]
    pub fn ranks_for(&self, tree: &DomTree, node: NodeId) -> Option<StackRanks> {
        let entry = self.entry_of(tree, node)?;
        self.entries.get(&entry).map(|e| e.ranks)
    }

    /// Number of entries (contexts plus individually ordered nodes).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no node has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild the three total orders.
    ///
    /// Every entry contributes one tuple per role; tuples are keyed by
    /// the chain of `(bucket, z, document-order)` steps from the root
    /// context down to the entry, with a final step for the role. The
    /// lexicographic order of those chains is exactly CSS painting
    /// order: an entry's position within its parent context dominates
    /// everything below it.
    pub fn restack(&mut self, tree: &DomTree) {
        type Key = Vec<(u8, i32, usize)>;

        let mut tuples: Vec<(Key, NodeId, u8)> = Vec::with_capacity(self.entries.len() * 3);
        for &node in self.entries.keys() {
            let mut chain: Key = Vec::new();
            // Ancestor entries, root first, then the entry itself.
            let mut path: Vec<NodeId> = tree
                .ancestors(node)
                .filter(|a| self.entries.contains_key(a))
                .collect();
            path.reverse();
            path.push(node);
            for step_node in path {
                if let Some(step) = self.entries.get(&step_node) {
                    chain.push((Self::step_bucket(step.kind), Self::step_z(step.kind), step_node.0));
                }
            }
            for role_bucket in [bucket::SELF, bucket::BLOCK, bucket::INLINE] {
                let mut key = chain.clone();
                key.push((role_bucket, 0, 0));
                tuples.push((key, node, role_bucket));
            }
        }
        tuples.sort();
        for (rank, (_, node, role_bucket)) in tuples.into_iter().enumerate() {
            let rank = rank as i32;
            if let Some(entry) = self.entries.get_mut(&node) {
                match role_bucket {
                    bucket::SELF => entry.ranks.stacking = rank,
                    bucket::BLOCK => entry.ranks.block = rank,
                    _ => entry.ranks.inline = rank,
                }
            }
        }
    }

    /// The bucket an entry occupies within its parent context.
    const fn step_bucket(kind: EntryKind) -> u8 {
        match kind {
            EntryKind::Context { z } if z < 0 => bucket::NEGATIVE_Z,
            EntryKind::Context { z } if z > 0 => bucket::POSITIVE_Z,
            EntryKind::Context { .. } | EntryKind::Positioned => bucket::POSITIONED,
            EntryKind::Floated => bucket::FLOAT,
        }
    }

    const fn step_z(kind: EntryKind) -> i32 {
        match kind {
            EntryKind::Context { z } => z,
            EntryKind::Positioned | EntryKind::Floated => 0,
        }
    }

    /// Forget everything (document teardown).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
