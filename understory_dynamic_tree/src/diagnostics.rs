// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quality metrics, structural validation and the bottom-up rebuild.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::ValidationError;
use crate::node::NodeIdx;
use crate::tree::DynamicTree;

impl<P: Copy + Debug> DynamicTree<P> {
    /// Height of the tree as stored on the root. An empty tree and a single leaf both have
    /// height 0.
    pub fn height(&self) -> usize {
        if self.root.is_null() {
            return 0;
        }
        self.nodes[self.root.get()].height.unsigned_abs() as usize
    }

    /// Height of the tree recomputed by walking every node.
    ///
    /// Agrees with [`height`](Self::height) on a valid tree.
    pub fn compute_height(&self) -> usize {
        if self.root.is_null() {
            0
        } else {
            self.subtree_height(self.root)
        }
    }

    fn subtree_height(&self, id: NodeIdx) -> usize {
        let node = &self.nodes[id.get()];
        if node.is_leaf() {
            return 0;
        }
        1 + self
            .subtree_height(node.child1)
            .max(self.subtree_height(node.child2))
    }

    /// Largest height difference between the two children of any internal node.
    pub fn max_balance(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.height > 1)
            .map(|n| {
                let h1 = self.nodes[n.child1.get()].height;
                let h2 = self.nodes[n.child2.get()].height;
                h1.abs_diff(h2) as usize
            })
            .max()
            .unwrap_or(0)
    }

    /// Sum of the perimeters of all nodes divided by the perimeter of the root.
    ///
    /// Lower is better; a rough measure of how much query work the structure causes.
    /// Returns 0 for an empty tree or a root with no extent.
    pub fn area_ratio(&self) -> f64 {
        if self.root.is_null() {
            return 0.0;
        }
        let root_area = self.nodes[self.root.get()].aabb.perimeter();
        if root_area <= 0.0 {
            return 0.0;
        }
        let total: f64 = self
            .nodes
            .iter()
            .filter(|n| !n.is_free())
            .map(|n| n.aabb.perimeter())
            .sum();
        total / root_area
    }

    /// Check every structural invariant of the tree.
    ///
    /// Walks the hierarchy from the root (parent links, leaf shape, heights, and boxes), then
    /// the free list, then checks that live and free slots account for the whole pool.
    /// Costs `O(capacity)`; meant for tests and debugging.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let capacity = self.nodes.len();
        let mut live = 0;
        if !self.root.is_null() {
            let root = self.checked(self.root, self.root)?;
            let parent = self.nodes[root.get()].parent_or_next;
            if !parent.is_null() {
                return Err(ValidationError::RootHasParent {
                    node: root.get(),
                    parent: parent.get(),
                });
            }
            live = self.validate_subtree(root)?;

            let stored = self.nodes[root.get()].height.unsigned_abs() as usize;
            let computed = self.compute_height();
            if stored != computed {
                return Err(ValidationError::RootHeightMismatch {
                    stored: self.nodes[root.get()].height,
                    computed: i32::try_from(computed).unwrap_or(i32::MAX),
                });
            }
        }

        let mut free = 0;
        let mut cursor = self.free_list;
        while !cursor.is_null() {
            let id = self.checked(cursor, cursor)?;
            if !self.nodes[id.get()].is_free() || free >= capacity {
                return Err(ValidationError::FreeListCorrupt { node: id.get() });
            }
            free += 1;
            cursor = self.nodes[id.get()].parent_or_next;
        }

        if live != self.node_count || live + free != capacity {
            return Err(ValidationError::PoolAccounting {
                live,
                free,
                capacity,
            });
        }
        Ok(())
    }

    /// Validate the subtree under `id` and return how many nodes it holds.
    fn validate_subtree(&self, id: NodeIdx) -> Result<usize, ValidationError> {
        let node = &self.nodes[id.get()];
        if node.is_free() {
            return Err(ValidationError::FreeNodeInTree { node: id.get() });
        }

        if node.is_leaf() {
            if !node.child2.is_null() {
                return Err(ValidationError::SingleChild { node: id.get() });
            }
            if node.height != 0 || node.user_data.is_none() {
                return Err(ValidationError::MalformedLeaf {
                    node: id.get(),
                    height: node.height,
                });
            }
            return Ok(1);
        }

        if node.child2.is_null() {
            return Err(ValidationError::SingleChild { node: id.get() });
        }
        let child1 = self.checked(id, node.child1)?;
        let child2 = self.checked(id, node.child2)?;
        let (c1, c2) = (&self.nodes[child1.get()], &self.nodes[child2.get()]);

        for (child, c) in [(child1, c1), (child2, c2)] {
            if c.parent_or_next != id {
                return Err(ValidationError::ParentMismatch {
                    node: child.get(),
                    expected: id.get(),
                    found: c.parent_or_next.get(),
                });
            }
        }

        let expected = 1 + c1.height.max(c2.height);
        if node.height != expected {
            return Err(ValidationError::HeightMismatch {
                node: id.get(),
                expected,
                found: node.height,
            });
        }
        if node.aabb != c1.aabb.union(&c2.aabb) {
            return Err(ValidationError::BoundsMismatch { node: id.get() });
        }

        Ok(1 + self.validate_subtree(child1)? + self.validate_subtree(child2)?)
    }

    fn checked(&self, from: NodeIdx, target: NodeIdx) -> Result<NodeIdx, ValidationError> {
        if target.get() < self.nodes.len() {
            Ok(target)
        } else {
            Err(ValidationError::OutOfRange {
                node: from.get(),
                target: target.get(),
                capacity: self.nodes.len(),
            })
        }
    }

    /// Rebuild the hierarchy from scratch over the current proxies.
    ///
    /// All internal nodes are discarded, then the pair of subtrees whose union has the
    /// smallest perimeter is merged repeatedly until one root remains. This is `O(n^2)` in
    /// the number of proxies and usually yields a tighter tree than incremental insertion,
    /// though it does not rebalance. Proxy ids, payloads, and fat boxes are preserved.
    ///
    /// The greedy merge does not guarantee a lower [`area_ratio`](Self::area_ratio) than an
    /// incrementally built tree; occasionally it comes out slightly higher. Rebuilding a tree
    /// that was itself just rebuilt reproduces the same shape.
    pub fn rebuild_bottom_up(&mut self) {
        let mut leaves: Vec<NodeIdx> = Vec::with_capacity(self.node_count);
        for i in 0..self.nodes.len() {
            let node = &self.nodes[i];
            if node.is_free() {
                continue;
            }
            let id = NodeIdx::new(i);
            if node.is_leaf() {
                self.nodes[i].parent_or_next = NodeIdx::NULL;
                leaves.push(id);
            } else {
                self.free_node(id);
            }
        }
        let leaf_count = leaves.len();

        while leaves.len() > 1 {
            let mut min_cost = f64::INFINITY;
            let (mut i_min, mut j_min) = (0, 1);
            for i in 0..leaves.len() {
                let aabb_i = self.nodes[leaves[i].get()].aabb;
                for j in i + 1..leaves.len() {
                    let cost = aabb_i.union(&self.nodes[leaves[j].get()].aabb).perimeter();
                    if cost < min_cost {
                        min_cost = cost;
                        (i_min, j_min) = (i, j);
                    }
                }
            }

            let (index1, index2) = (leaves[i_min], leaves[j_min]);
            let (c1, c2) = (&self.nodes[index1.get()], &self.nodes[index2.get()]);
            let aabb = c1.aabb.union(&c2.aabb);
            let height = 1 + c1.height.max(c2.height);

            let parent_index = self.allocate_node();
            let parent = &mut self.nodes[parent_index.get()];
            parent.child1 = index1;
            parent.child2 = index2;
            parent.aabb = aabb;
            parent.height = height;
            parent.parent_or_next = NodeIdx::NULL;
            self.nodes[index1.get()].parent_or_next = parent_index;
            self.nodes[index2.get()].parent_or_next = parent_index;

            // i_min < j_min, so removing j_min leaves i_min in place.
            leaves.swap_remove(j_min);
            leaves[i_min] = parent_index;
        }

        self.root = leaves.first().copied().unwrap_or(NodeIdx::NULL);
        tracing::debug!(
            leaves = leaf_count,
            height = self.height(),
            "rebuilt dynamic tree bottom-up"
        );
        debug_assert!(
            self.validate().is_ok(),
            "bottom-up rebuild produced an invalid tree"
        );
    }
}
