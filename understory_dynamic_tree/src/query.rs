// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Region and ray queries.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::ops::ControlFlow;

use kurbo::{Point, Vec2};

use crate::callback::{QueryCallback, RayCastCallback, RayCastInput};
use crate::node::{NodeIdx, ProxyId};
use crate::tree::DynamicTree;
use crate::types::{Aabb2D, abs};

impl<P: Copy + Debug> DynamicTree<P> {
    /// Report every proxy whose fat box overlaps `aabb`.
    ///
    /// Proxies arrive in traversal order, which depends on the insertion history. The
    /// callback sees fat boxes, so callers filter false positives against their own shapes.
    ///
    /// ```rust
    /// use core::ops::ControlFlow;
    /// use understory_dynamic_tree::{Aabb2D, DynamicTree};
    ///
    /// let mut tree = DynamicTree::new();
    /// let a = tree.create_proxy(Aabb2D::new(0.0, 0.0, 1.0, 1.0), "a");
    /// let _b = tree.create_proxy(Aabb2D::new(10.0, 0.0, 11.0, 1.0), "b");
    ///
    /// let mut hits = Vec::new();
    /// tree.query(Aabb2D::new(0.5, 0.5, 2.0, 2.0), &mut |id| {
    ///     hits.push(id);
    ///     ControlFlow::Continue(())
    /// });
    /// assert_eq!(hits, [a]);
    /// ```
    pub fn query(&self, aabb: Aabb2D<f64>, callback: &mut impl QueryCallback) {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if id.is_null() {
                continue;
            }
            let node = &self.nodes[id.get()];
            if !node.aabb.overlaps(&aabb) {
                continue;
            }
            if node.is_leaf() {
                if callback.query(ProxyId(id)).is_break() {
                    return;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Report every proxy whose fat box contains `point`.
    pub fn query_point(&self, point: Point, callback: &mut impl QueryCallback) {
        self.query(Aabb2D::new(point.x, point.y, point.x, point.y), callback);
    }

    /// Collect every proxy whose fat box overlaps `aabb`.
    pub fn query_collect(&self, aabb: Aabb2D<f64>) -> Vec<ProxyId> {
        let mut out = Vec::new();
        self.query(aabb, &mut |id| {
            out.push(id);
            ControlFlow::Continue(())
        });
        out
    }

    /// Cast a ray against the fat boxes in the tree.
    ///
    /// Each proxy whose box may be crossed by the current segment is handed to the callback,
    /// which performs the exact test and steers the cast as described on
    /// [`RayCastCallback`]. Cost is roughly `k * log(n)` for `k` candidates among `n`
    /// proxies.
    ///
    /// `input.p1` and `input.p2` must differ.
    pub fn ray_cast(&self, input: &RayCastInput, callback: &mut impl RayCastCallback) {
        let p1 = input.p1;
        let r = input.p2 - p1;
        debug_assert!(r.hypot2() > 0.0, "ray cast needs distinct end points");

        // Separating axis perpendicular to the segment: a box is missed when
        // |dot(v, p1 - c)| > dot(|v|, h). Both sides scale with |v|, so v stays unnormalized.
        let v = Vec2::new(-r.y, r.x);
        let abs_v = Vec2::new(abs(v.x), abs(v.y));

        let mut max_fraction = input.max_fraction;
        let mut segment_aabb = Aabb2D::from_points(p1, input.point_at(max_fraction));

        let mut stack: Vec<NodeIdx> = vec![self.root];
        while let Some(id) = stack.pop() {
            if id.is_null() {
                continue;
            }
            let node = &self.nodes[id.get()];
            if !node.aabb.overlaps(&segment_aabb) {
                continue;
            }

            let c = node.aabb.center();
            let h = node.aabb.extents();
            let separation = abs(v.dot(p1 - c)) - abs_v.dot(h);
            if separation > 0.0 {
                continue;
            }

            if node.is_leaf() {
                let sub_input = RayCastInput {
                    max_fraction,
                    ..*input
                };
                let value = callback.ray_cast(&sub_input, ProxyId(id));
                if value == 0.0 {
                    return;
                }
                if value > 0.0 && value < max_fraction {
                    max_fraction = value;
                    segment_aabb = Aabb2D::from_points(p1, input.point_at(max_fraction));
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }
}
