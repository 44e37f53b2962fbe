// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural errors reported by [`DynamicTree::validate`](crate::DynamicTree::validate).

/// A broken structural invariant found by [`DynamicTree::validate`](crate::DynamicTree::validate).
///
/// Node indices are pool slots, the same numbers [`ProxyId::index`](crate::ProxyId::index)
/// returns for leaves.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The root has a parent link.
    #[error("root node {node} has parent {parent}")]
    RootHasParent {
        /// The root slot.
        node: usize,
        /// The parent slot it points at.
        parent: usize,
    },
    /// A link points outside the pool.
    #[error("node {node} links to slot {target}, outside a pool of {capacity}")]
    OutOfRange {
        /// Slot holding the bad link.
        node: usize,
        /// The out of range target.
        target: usize,
        /// Pool size.
        capacity: usize,
    },
    /// A free slot is reachable from the root.
    #[error("free slot {node} is reachable from the root")]
    FreeNodeInTree {
        /// The free slot.
        node: usize,
    },
    /// A leaf with a height other than zero or without a payload.
    #[error("leaf {node} is malformed (height {height})")]
    MalformedLeaf {
        /// The leaf slot.
        node: usize,
        /// Its stored height.
        height: i32,
    },
    /// An internal node with exactly one child.
    #[error("internal node {node} has a single child")]
    SingleChild {
        /// The internal slot.
        node: usize,
    },
    /// A child does not point back at its parent.
    #[error("node {node} has parent {found}, expected {expected}")]
    ParentMismatch {
        /// The child slot.
        node: usize,
        /// The parent that reached it.
        expected: usize,
        /// The parent it records.
        found: usize,
    },
    /// An internal height that is not one more than the taller child.
    #[error("node {node} has height {found}, expected {expected}")]
    HeightMismatch {
        /// The internal slot.
        node: usize,
        /// Height computed from the children.
        expected: i32,
        /// Stored height.
        found: i32,
    },
    /// An internal box that is not the exact union of its children.
    #[error("node {node} box is not the union of its children")]
    BoundsMismatch {
        /// The internal slot.
        node: usize,
    },
    /// The stored root height disagrees with a full recomputation.
    #[error("root height {stored} disagrees with computed height {computed}")]
    RootHeightMismatch {
        /// Height stored on the root.
        stored: i32,
        /// Height found by walking the tree.
        computed: i32,
    },
    /// The free list loops or visits a slot that is in use.
    #[error("free list is corrupt at slot {node}")]
    FreeListCorrupt {
        /// The offending slot.
        node: usize,
    },
    /// Live and free slots do not add up to the pool size.
    #[error("{live} live and {free} free slots do not fill a pool of {capacity}")]
    PoolAccounting {
        /// Slots reachable from the root.
        live: usize,
        /// Slots on the free list.
        free: usize,
        /// Pool size.
        capacity: usize,
    },
}
