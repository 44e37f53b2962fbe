// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pool node layout and handles.

use core::fmt::Debug;

use crate::types::Aabb2D;

/// Handle to a proxy (a leaf) in a [`DynamicTree`](crate::DynamicTree).
///
/// A `ProxyId` is the leaf's pool index. It stays valid across pool growth until the proxy
/// is destroyed; after that the slot may be reused by an unrelated node, so callers must
/// drop their copies when they destroy the proxy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyId(pub(crate) NodeIdx);

impl ProxyId {
    /// The pool slot this proxy occupies.
    pub const fn index(self) -> usize {
        self.0.get()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NodeIdx(u32);

impl NodeIdx {
    pub(crate) const NULL: Self = Self(u32::MAX);

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Pool indices are 32-bit; the pool never grows past u32::MAX slots."
    )]
    pub(crate) const fn new(i: usize) -> Self {
        Self(i as u32)
    }

    pub(crate) const fn get(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

#[derive(Clone, Debug)]
pub(crate) struct TreeNode<P> {
    /// Fat box for leaves, union of the children otherwise.
    pub(crate) aabb: Aabb2D<f64>,
    pub(crate) user_data: Option<P>,
    /// Parent while reachable from the root, next free slot while on the free list.
    pub(crate) parent_or_next: NodeIdx,
    pub(crate) child1: NodeIdx,
    pub(crate) child2: NodeIdx,
    /// 0 for leaves, -1 for free slots.
    pub(crate) height: i32,
    pub(crate) moved: bool,
}

impl<P> TreeNode<P> {
    pub(crate) fn free(next: NodeIdx) -> Self {
        Self {
            aabb: Aabb2D::new(0.0, 0.0, 0.0, 0.0),
            user_data: None,
            parent_or_next: next,
            child1: NodeIdx::NULL,
            child2: NodeIdx::NULL,
            height: -1,
            moved: false,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.child1.is_null()
    }

    pub(crate) fn is_free(&self) -> bool {
        self.height < 0
    }
}
