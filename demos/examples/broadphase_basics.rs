// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Broad-phase basics.
//!
//! Scatter a few bodies, step a tiny simulation, feed each step's motion to the tree, and
//! collect candidate pairs for the proxies whose fat box was refreshed.
//!
//! Run:
//! - `cargo run -p understory_examples --example broadphase_basics`
//! - `RUST_LOG=understory_dynamic_tree=trace cargo run -p understory_examples --example broadphase_basics`

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use kurbo::{Point, Vec2};
use tracing_subscriber::EnvFilter;
use understory_dynamic_tree::{Aabb2D, DynamicTree, ProxyId, TreeConfig};

#[derive(Copy, Clone, Debug)]
struct Body {
    center: Point,
    velocity: Vec2,
}

impl Body {
    fn aabb(&self) -> Aabb2D<f64> {
        Aabb2D::from_center_half_extents(self.center, Vec2::new(0.5, 0.5))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("understory_dynamic_tree=debug")),
        )
        .init();

    // A small pool so the growth events show up in the log.
    let mut tree = DynamicTree::with_config(TreeConfig::default().with_initial_capacity(4));
    let mut bodies: Vec<Body> = (0..12)
        .map(|i| {
            let i = f64::from(i);
            Body {
                center: Point::new(i * 2.0, (i * 0.7).sin() * 3.0),
                velocity: Vec2::new(if i < 6.0 { 0.4 } else { -0.4 }, 0.0),
            }
        })
        .collect();
    let proxies: Vec<ProxyId> = bodies
        .iter()
        .enumerate()
        .map(|(i, b)| tree.create_proxy(b.aabb(), i))
        .collect();

    let dt = 0.5;
    for step in 0..8 {
        let mut reinserted = 0;
        for (body, &proxy) in bodies.iter_mut().zip(&proxies) {
            let displacement = dt * body.velocity;
            body.center += displacement;
            if tree.move_proxy(proxy, body.aabb(), displacement) {
                reinserted += 1;
            }
        }

        // Only proxies whose fat box changed can have gained new partners.
        let mut pairs = BTreeSet::new();
        for &proxy in &proxies {
            if !tree.was_moved(proxy) {
                continue;
            }
            let fat = tree.fat_aabb(proxy);
            tree.query(fat, &mut |other: ProxyId| {
                if other != proxy {
                    let (Some(a), Some(b)) = (tree.user_data(proxy), tree.user_data(other)) else {
                        return ControlFlow::Continue(());
                    };
                    pairs.insert((a.min(b), a.max(b)));
                }
                ControlFlow::Continue(())
            });
        }
        for &proxy in &proxies {
            tree.clear_moved(proxy);
        }

        println!(
            "step {step}: {reinserted} reinserted, height {}, candidate pairs {pairs:?}",
            tree.height()
        );
    }

    println!("area ratio before rebuild: {:.3}", tree.area_ratio());
    tree.rebuild_bottom_up();
    println!("area ratio after rebuild:  {:.3}", tree.area_ratio());
    assert!(tree.validate().is_ok(), "rebuilt tree should validate");

    // Recenter the world on the first body.
    tree.shift_origin(bodies[0].center.to_vec2());
    println!("{tree:?}");
}
