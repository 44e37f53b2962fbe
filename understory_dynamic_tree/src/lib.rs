// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dynamic_tree --heading-base-level=0

//! Understory Dynamic Tree: a dynamic AABB tree for 2D broad-phase queries.
//!
//! The tree tracks many moving boxes ("proxies") and answers two questions quickly:
//! which proxies may overlap a region, and which proxies may be crossed by a ray.
//!
//! - Create, move, and destroy proxies carrying a small `Copy` payload.
//! - Each proxy stores a *fat* box, its tight box grown by a margin and stretched along the
//!   predicted motion, so that most moves do not touch the tree at all.
//! - Insertion picks siblings by perimeter cost; insertion and removal rebalance the touched
//!   ancestors with single rotations.
//! - Query a region or point with a [`QueryCallback`], or cast a ray with a
//!   [`RayCastCallback`] that clips the ray as hits are found. Plain closures implement both.
//!
//! Results are conservative: callers receive every proxy whose fat box passes the test and
//! run their exact shape tests on top.
//!
//! # Example
//!
//! ```rust
//! use core::ops::ControlFlow;
//! use kurbo::{Point, Vec2};
//! use understory_dynamic_tree::{Aabb2D, DynamicTree, RayCastInput};
//!
//! let mut tree = DynamicTree::new();
//! let a = tree.create_proxy(Aabb2D::new(0.0, 0.0, 1.0, 1.0), 'a');
//! let b = tree.create_proxy(Aabb2D::new(4.0, 0.0, 5.0, 1.0), 'b');
//!
//! // Small motion stays inside the fat box and leaves the tree alone.
//! assert!(!tree.move_proxy(a, Aabb2D::new(0.05, 0.0, 1.05, 1.0), Vec2::ZERO));
//!
//! // Region query.
//! let mut found = Vec::new();
//! tree.query(Aabb2D::new(3.5, 0.0, 6.0, 1.0), &mut |id| {
//!     found.push(tree.user_data(id));
//!     ControlFlow::Continue(())
//! });
//! assert_eq!(found, [Some('b')]);
//!
//! // Closest hit along a ray: clip the ray to each hit.
//! let ray = RayCastInput::new(Point::new(10.0, 0.5), Point::new(-10.0, 0.5));
//! let mut closest = None;
//! tree.ray_cast(&ray, &mut |input: &RayCastInput, id| {
//!     let hit = tree.fat_aabb(id);
//!     let fraction = (input.p1.x - hit.max_x) / (input.p1.x - input.p2.x);
//!     closest = Some(id);
//!     fraction
//! });
//! assert_eq!(closest, Some(b));
//! ```
//!
//! Trees can be tuned through [`TreeConfig`], checked with [`DynamicTree::validate`], and
//! rebuilt into a tighter shape with [`DynamicTree::rebuild_bottom_up`].
//!
//! ## Logging
//!
//! Structural events (pool growth, rebuilds, origin shifts) are emitted through `tracing`.
//! Queries and moves absorbed by the fat box do not log.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs in coordinates. Touching boxes count as overlapping.

#![no_std]

extern crate alloc;

pub mod callback;
pub mod config;
pub mod error;
pub mod types;

mod diagnostics;
mod node;
mod query;
mod tree;

pub use callback::{QueryCallback, RayCastCallback, RayCastInput};
pub use config::TreeConfig;
pub use error::ValidationError;
pub use node::ProxyId;
pub use tree::DynamicTree;
pub use types::Aabb2D;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::ops::ControlFlow;
    use kurbo::Vec2;

    #[test]
    fn create_move_query_destroy() {
        let mut tree: DynamicTree<u32> = DynamicTree::new();
        let a = tree.create_proxy(Aabb2D::new(0.0, 0.0, 10.0, 10.0), 1);
        let b = tree.create_proxy(Aabb2D::new(20.0, 0.0, 30.0, 10.0), 2);

        assert!(tree.move_proxy(a, Aabb2D::new(40.0, 0.0, 50.0, 10.0), Vec2::ZERO));
        let hits: Vec<_> = tree
            .query_collect(Aabb2D::new(45.0, 5.0, 46.0, 6.0))
            .into_iter()
            .filter_map(|id| tree.user_data(id))
            .collect();
        assert_eq!(hits, [1]);

        tree.destroy_proxy(b);
        assert_eq!(tree.proxy_count(), 1);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn query_callback_can_be_a_type() {
        struct Counter(usize);
        impl QueryCallback for Counter {
            fn query(&mut self, _: ProxyId) -> ControlFlow<()> {
                self.0 += 1;
                ControlFlow::Continue(())
            }
        }

        let mut tree: DynamicTree<()> = DynamicTree::new();
        for i in 0..10 {
            let x = f64::from(i) * 2.0;
            let _ = tree.create_proxy(Aabb2D::new(x, 0.0, x + 1.0, 1.0), ());
        }
        let mut counter = Counter(0);
        tree.query(Aabb2D::new(0.0, 0.0, 5.0, 1.0), &mut counter);
        // Boxes at 0, 2, and 4 (plus margins).
        assert_eq!(counter.0, 3);
    }

    #[test]
    fn debug_output_summarizes() {
        let tree: DynamicTree<u8> = DynamicTree::new();
        let s = alloc::format!("{tree:?}");
        assert!(s.starts_with("DynamicTree"), "unexpected debug output {s}");
        assert!(s.contains("node_count: 0"), "unexpected debug output {s}");
    }
}
