// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node pool, proxy lifecycle, insertion, removal and rotations.

use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Vec2;

use crate::config::TreeConfig;
use crate::node::{NodeIdx, ProxyId, TreeNode};
use crate::types::Aabb2D;

/// A dynamic AABB tree for broad-phase queries over moving 2D boxes.
///
/// Leaves are proxies created by the client; each stores a *fat* box (the client's tight
/// box grown by [`TreeConfig::aabb_extension`]) so that small motions do not touch the tree.
/// Internal nodes store the union of their children. Insertion picks siblings with a
/// perimeter cost heuristic and every insertion or removal rebalances the touched ancestors
/// with single rotations, keeping the height logarithmic.
///
/// Nodes live in a pool addressed by index; [`ProxyId`]s remain valid while the pool grows.
pub struct DynamicTree<P: Copy + Debug> {
    pub(crate) root: NodeIdx,
    pub(crate) nodes: Vec<TreeNode<P>>,
    pub(crate) node_count: usize,
    pub(crate) free_list: NodeIdx,
    insertion_count: u64,
    config: TreeConfig,
}

impl<P: Copy + Debug> Default for DynamicTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Copy + Debug> DynamicTree<P> {
    /// Create an empty tree with the default [`TreeConfig`].
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty tree with the given tuning.
    pub fn with_config(config: TreeConfig) -> Self {
        let capacity = config.initial_capacity.max(1);
        let mut nodes = Vec::with_capacity(capacity);
        Self::link_free_slots(&mut nodes, capacity);
        Self {
            root: NodeIdx::NULL,
            nodes,
            node_count: 0,
            free_list: NodeIdx::new(0),
            insertion_count: 0,
            config,
        }
    }

    /// The tuning this tree was built with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Create a proxy for a tight box. The stored box is fattened by the configured margin.
    pub fn create_proxy(&mut self, aabb: Aabb2D<f64>, user_data: P) -> ProxyId {
        let id = self.allocate_node();
        let node = &mut self.nodes[id.get()];
        node.aabb = aabb.grown(self.config.aabb_extension);
        node.user_data = Some(user_data);
        node.height = 0;
        node.moved = true;
        self.insert_leaf(id);
        ProxyId(id)
    }

    /// Destroy a proxy and return its slot to the pool.
    ///
    /// `proxy` must name a live proxy. Debug builds assert this; release builds leave the
    /// tree in an unspecified state if it does not.
    pub fn destroy_proxy(&mut self, proxy: ProxyId) {
        let id = proxy.0;
        debug_assert!(
            self.is_live_leaf(id),
            "destroy_proxy: {proxy:?} is not a live proxy"
        );
        self.remove_leaf(id);
        self.free_node(id);
    }

    /// Report a new tight box for a proxy.
    ///
    /// `displacement` is the expected motion over the next step; the fat box is stretched
    /// along it (scaled by [`TreeConfig::aabb_multiplier`]) so fast movers are not reinserted
    /// every step.
    ///
    /// Returns `true` if the proxy was reinserted. Returns `false` without touching the tree
    /// when the stored fat box still contains `aabb` and is not oversized compared to the
    /// newly computed fat box.
    pub fn move_proxy(&mut self, proxy: ProxyId, aabb: Aabb2D<f64>, displacement: Vec2) -> bool {
        let id = proxy.0;
        debug_assert!(
            self.is_live_leaf(id),
            "move_proxy: {proxy:?} is not a live proxy"
        );

        let extension = self.config.aabb_extension;
        let fat_aabb = aabb
            .grown(extension)
            .extended_by(self.config.aabb_multiplier * displacement);

        let tree_aabb = self.nodes[id.get()].aabb;
        if tree_aabb.contains(&aabb) {
            // Still covered; only reinsert if the stored box has grown too large, e.g. after
            // a fast mover came to rest.
            let huge_aabb = fat_aabb.grown(self.config.huge_aabb_factor * extension);
            if huge_aabb.contains(&tree_aabb) {
                return false;
            }
        }

        self.remove_leaf(id);
        self.nodes[id.get()].aabb = fat_aabb;
        self.insert_leaf(id);
        self.nodes[id.get()].moved = true;
        true
    }

    /// The payload of a proxy, or `None` if the slot does not hold a proxy.
    ///
    /// Panics if the index is outside the pool.
    pub fn user_data(&self, proxy: ProxyId) -> Option<P> {
        self.nodes[proxy.index()].user_data
    }

    /// The fat box currently stored for a proxy.
    pub fn fat_aabb(&self, proxy: ProxyId) -> Aabb2D<f64> {
        self.nodes[proxy.index()].aabb
    }

    /// Whether the proxy's fat box was refreshed since the last [`clear_moved`](Self::clear_moved).
    pub fn was_moved(&self, proxy: ProxyId) -> bool {
        self.nodes[proxy.index()].moved
    }

    /// Reset the moved flag of a proxy.
    pub fn clear_moved(&mut self, proxy: ProxyId) {
        self.nodes[proxy.index()].moved = false;
    }

    /// Shift the world origin: every stored box becomes `box - new_origin`.
    ///
    /// The tree structure is unchanged.
    pub fn shift_origin(&mut self, new_origin: Vec2) {
        for node in self.nodes.iter_mut().filter(|n| !n.is_free()) {
            node.aabb = node.aabb.translate(-new_origin);
        }
        tracing::trace!(x = new_origin.x, y = new_origin.y, "shifted tree origin");
    }

    /// Live proxies in pool order.
    pub fn proxies(&self) -> impl Iterator<Item = ProxyId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.is_free() && n.is_leaf())
            .map(|(i, _)| ProxyId(NodeIdx::new(i)))
    }

    /// Number of live proxies.
    pub fn proxy_count(&self) -> usize {
        self.proxies().count()
    }

    /// Number of live nodes, leaves and internal nodes together.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of slots in the node pool.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree holds no proxies.
    pub fn is_empty(&self) -> bool {
        self.root.is_null()
    }

    /// Total number of leaf insertions, counting reinsertions from [`move_proxy`](Self::move_proxy).
    pub fn insertion_count(&self) -> u64 {
        self.insertion_count
    }

    fn is_live_leaf(&self, id: NodeIdx) -> bool {
        self.nodes
            .get(id.get())
            .is_some_and(|n| !n.is_free() && n.is_leaf())
    }

    /// Append free slots up to `capacity`, each pointing at the next; the last one ends the list.
    fn link_free_slots(nodes: &mut Vec<TreeNode<P>>, capacity: usize) {
        for i in nodes.len()..capacity {
            let next = if i + 1 < capacity {
                NodeIdx::new(i + 1)
            } else {
                NodeIdx::NULL
            };
            nodes.push(TreeNode::free(next));
        }
    }

    pub(crate) fn allocate_node(&mut self) -> NodeIdx {
        if self.free_list.is_null() {
            debug_assert_eq!(
                self.node_count,
                self.nodes.len(),
                "free list is empty but the pool has unused slots"
            );
            let old_capacity = self.nodes.len();
            let new_capacity = old_capacity * 2;
            assert!(
                new_capacity < NodeIdx::NULL.get(),
                "dynamic tree node pool exceeds 32-bit indexing"
            );
            self.nodes.reserve_exact(new_capacity - old_capacity);
            Self::link_free_slots(&mut self.nodes, new_capacity);
            self.free_list = NodeIdx::new(old_capacity);
            tracing::debug!(old_capacity, new_capacity, "grew dynamic tree node pool");
        }

        let id = self.free_list;
        let node = &mut self.nodes[id.get()];
        self.free_list = node.parent_or_next;
        node.parent_or_next = NodeIdx::NULL;
        node.child1 = NodeIdx::NULL;
        node.child2 = NodeIdx::NULL;
        node.height = 0;
        node.user_data = None;
        node.moved = false;
        self.node_count += 1;
        id
    }

    pub(crate) fn free_node(&mut self, id: NodeIdx) {
        debug_assert!(self.node_count > 0, "freeing a node from an empty pool");
        let node = &mut self.nodes[id.get()];
        node.parent_or_next = self.free_list;
        node.child1 = NodeIdx::NULL;
        node.child2 = NodeIdx::NULL;
        node.height = -1;
        node.user_data = None;
        self.free_list = id;
        self.node_count -= 1;
    }

    fn insert_leaf(&mut self, leaf: NodeIdx) {
        self.insertion_count += 1;

        if self.root.is_null() {
            self.root = leaf;
            self.nodes[leaf.get()].parent_or_next = NodeIdx::NULL;
            return;
        }

        let leaf_aabb = self.nodes[leaf.get()].aabb;
        let sibling = self.find_best_sibling(leaf_aabb);

        let old_parent = self.nodes[sibling.get()].parent_or_next;
        let sibling_aabb = self.nodes[sibling.get()].aabb;
        let sibling_height = self.nodes[sibling.get()].height;

        let new_parent = self.allocate_node();
        let parent = &mut self.nodes[new_parent.get()];
        parent.parent_or_next = old_parent;
        parent.aabb = leaf_aabb.union(&sibling_aabb);
        parent.height = sibling_height + 1;
        parent.child1 = sibling;
        parent.child2 = leaf;
        self.nodes[sibling.get()].parent_or_next = new_parent;
        self.nodes[leaf.get()].parent_or_next = new_parent;

        if old_parent.is_null() {
            self.root = new_parent;
        } else {
            self.replace_child(old_parent, sibling, new_parent);
        }

        self.refit_ancestors(new_parent);
    }

    /// Descend from the root towards the node whose pairing with `leaf_aabb` adds the least
    /// perimeter to the tree.
    fn find_best_sibling(&self, leaf_aabb: Aabb2D<f64>) -> NodeIdx {
        let mut index = self.root;
        while !self.nodes[index.get()].is_leaf() {
            let node = &self.nodes[index.get()];
            let area = node.aabb.perimeter();
            let combined_area = node.aabb.union(&leaf_aabb).perimeter();

            // Cost of a new parent for this node and the leaf.
            let cost = 2.0 * combined_area;
            // Minimum cost of pushing the leaf further down.
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost1 = self.descent_cost(node.child1, leaf_aabb) + inheritance_cost;
            let cost2 = self.descent_cost(node.child2, leaf_aabb) + inheritance_cost;

            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 < cost2 {
                node.child1
            } else {
                node.child2
            };
        }
        index
    }

    fn descent_cost(&self, child: NodeIdx, leaf_aabb: Aabb2D<f64>) -> f64 {
        let child = &self.nodes[child.get()];
        let combined = leaf_aabb.union(&child.aabb).perimeter();
        if child.is_leaf() {
            combined
        } else {
            combined - child.aabb.perimeter()
        }
    }

    fn remove_leaf(&mut self, leaf: NodeIdx) {
        if leaf == self.root {
            self.root = NodeIdx::NULL;
            return;
        }

        let parent = self.nodes[leaf.get()].parent_or_next;
        let grand_parent = self.nodes[parent.get()].parent_or_next;
        let sibling = if self.nodes[parent.get()].child1 == leaf {
            self.nodes[parent.get()].child2
        } else {
            self.nodes[parent.get()].child1
        };
        self.nodes[leaf.get()].parent_or_next = NodeIdx::NULL;

        if grand_parent.is_null() {
            self.root = sibling;
            self.nodes[sibling.get()].parent_or_next = NodeIdx::NULL;
            self.free_node(parent);
        } else {
            self.replace_child(grand_parent, parent, sibling);
            self.nodes[sibling.get()].parent_or_next = grand_parent;
            self.free_node(parent);
            self.refit_ancestors(grand_parent);
        }
    }

    fn replace_child(&mut self, parent: NodeIdx, old: NodeIdx, new: NodeIdx) {
        let parent = &mut self.nodes[parent.get()];
        if parent.child1 == old {
            parent.child1 = new;
        } else {
            debug_assert_eq!(parent.child2, old, "node is not a child of its parent");
            parent.child2 = new;
        }
    }

    /// Walk from `index` to the root, rebalancing each ancestor and then refreshing its
    /// height and box from its (possibly rotated) children.
    fn refit_ancestors(&mut self, mut index: NodeIdx) {
        while !index.is_null() {
            index = self.balance(index);

            let node = &self.nodes[index.get()];
            let (child1, child2) = (node.child1, node.child2);
            debug_assert!(
                !child1.is_null() && !child2.is_null(),
                "internal node is missing a child"
            );
            let (c1, c2) = (&self.nodes[child1.get()], &self.nodes[child2.get()]);
            let height = 1 + c1.height.max(c2.height);
            let aabb = c1.aabb.union(&c2.aabb);

            let node = &mut self.nodes[index.get()];
            node.height = height;
            node.aabb = aabb;
            index = node.parent_or_next;
        }
    }

    /// Rotate the taller child of `ia` up if the children's heights differ by more than one.
    /// Returns the index of the node now occupying `ia`'s position.
    fn balance(&mut self, ia: NodeIdx) -> NodeIdx {
        let a = &self.nodes[ia.get()];
        if a.is_leaf() || a.height < 2 {
            return ia;
        }

        let (ib, ic) = (a.child1, a.child2);
        let balance = self.nodes[ic.get()].height - self.nodes[ib.get()].height;
        if balance > 1 {
            self.rotate_up(ia, ic, ib)
        } else if balance < -1 {
            self.rotate_up(ia, ib, ic)
        } else {
            ia
        }
    }

    /// Move child `iup` of `ia` into `ia`'s place. `iup` keeps its taller child and adopts
    /// `ia`; `ia` keeps `iother` and takes `iup`'s shorter child, then is rebalanced itself.
    fn rotate_up(&mut self, ia: NodeIdx, iup: NodeIdx, iother: NodeIdx) -> NodeIdx {
        let up = &self.nodes[iup.get()];
        let (i1, i2) = (up.child1, up.child2);
        let (taller, shorter) = if self.nodes[i1.get()].height > self.nodes[i2.get()].height {
            (i1, i2)
        } else {
            (i2, i1)
        };

        let parent = self.nodes[ia.get()].parent_or_next;
        let up = &mut self.nodes[iup.get()];
        up.child1 = ia;
        up.child2 = taller;
        up.parent_or_next = parent;
        self.nodes[ia.get()].parent_or_next = iup;

        if parent.is_null() {
            self.root = iup;
        } else {
            self.replace_child(parent, ia, iup);
        }

        self.replace_child(ia, iup, shorter);
        self.nodes[shorter.get()].parent_or_next = ia;

        let (other, short) = (&self.nodes[iother.get()], &self.nodes[shorter.get()]);
        let a_aabb = other.aabb.union(&short.aabb);
        let a_height = 1 + other.height.max(short.height);
        let a = &mut self.nodes[ia.get()];
        a.aabb = a_aabb;
        a.height = a_height;

        // A leaf paired with a tall subtree can leave `ia` more than one level out.
        let ia = self.balance(ia);

        let (a, tall) = (&self.nodes[ia.get()], &self.nodes[taller.get()]);
        let up_aabb = a.aabb.union(&tall.aabb);
        let up_height = 1 + a.height.max(tall.height);
        let up = &mut self.nodes[iup.get()];
        up.aabb = up_aabb;
        up.height = up_height;

        iup
    }
}

impl<P: Copy + Debug> Debug for DynamicTree<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicTree")
            .field("capacity", &self.nodes.len())
            .field("node_count", &self.node_count)
            .field("height", &self.height())
            .field("insertion_count", &self.insertion_count)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
