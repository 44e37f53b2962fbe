// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nearest hit along a ray.
//!
//! The tree only knows fat boxes, so the callback runs an exact slab test against the
//! tight box and clips the ray to each hit it confirms. Candidates beyond the closest hit
//! are skipped by the tree.
//!
//! Run:
//! - `cargo run -p understory_examples --example ray_cast_nearest`

use kurbo::Point;
use tracing_subscriber::EnvFilter;
use understory_dynamic_tree::{Aabb2D, DynamicTree, ProxyId, RayCastInput};

/// Entry fraction of the ray into `aabb`, if it enters within `input.max_fraction`.
fn slab_hit(input: &RayCastInput, aabb: &Aabb2D<f64>) -> Option<f64> {
    let d = input.p2 - input.p1;
    let mut t_min = 0.0_f64;
    let mut t_max = input.max_fraction;
    for (p, d, lo, hi) in [
        (input.p1.x, d.x, aabb.min_x, aabb.max_x),
        (input.p1.y, d.y, aabb.min_y, aabb.max_y),
    ] {
        if d == 0.0 {
            if p < lo || p > hi {
                return None;
            }
            continue;
        }
        let (t1, t2) = ((lo - p) / d, (hi - p) / d);
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Tight boxes are kept next to the tree; the payload indexes them.
    let shapes = [
        Aabb2D::new(-0.5, -0.5, 0.5, 0.5),
        Aabb2D::new(4.5, -0.5, 5.5, 0.5),
        Aabb2D::new(9.5, -0.5, 10.5, 0.5),
        Aabb2D::new(4.5, 3.0, 5.5, 4.0),
    ];
    let mut tree = DynamicTree::new();
    for (i, shape) in shapes.iter().enumerate() {
        let _ = tree.create_proxy(*shape, i);
    }

    let rays = [
        RayCastInput::new(Point::new(-1.0, 0.0), Point::new(11.0, 0.0)),
        RayCastInput::new(Point::new(11.0, 0.0), Point::new(-1.0, 0.0)),
        RayCastInput::new(Point::new(5.0, 10.0), Point::new(5.0, -10.0)),
        RayCastInput::new(Point::new(-1.0, 2.0), Point::new(11.0, 2.0)),
    ];
    for ray in &rays {
        let mut nearest: Option<(usize, f64)> = None;
        let mut candidates = 0;
        tree.ray_cast(ray, &mut |input: &RayCastInput, proxy: ProxyId| {
            candidates += 1;
            let Some(i) = tree.user_data(proxy) else {
                return -1.0;
            };
            match slab_hit(input, &shapes[i]) {
                Some(t) if t > 0.0 => {
                    nearest = Some((i, t));
                    t
                }
                // Starting inside a shape; nothing can be nearer.
                Some(_) => {
                    nearest = Some((i, 0.0));
                    0.0
                }
                None => -1.0,
            }
        });
        match nearest {
            Some((i, t)) => println!(
                "{:?} -> {:?}: shape {i} at {:?} ({candidates} candidates)",
                ray.p1,
                ray.p2,
                ray.point_at(t)
            ),
            None => println!("{:?} -> {:?}: no hit ({candidates} candidates)", ray.p1, ray.p2),
        }
    }
}
