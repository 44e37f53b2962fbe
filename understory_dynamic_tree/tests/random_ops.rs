// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Random create/move/destroy sequences checked against a plain list of proxies.

use kurbo::Vec2;
use proptest::prelude::*;
use understory_dynamic_tree::{Aabb2D, DynamicTree, ProxyId, TreeConfig};

#[derive(Clone, Debug)]
enum Op {
    Create(Aabb2D<f64>),
    Move(usize, Vec2, Vec2),
    Destroy(usize),
    Query(Aabb2D<f64>),
}

fn box_strategy() -> impl Strategy<Value = Aabb2D<f64>> {
    (-100.0..100.0f64, -100.0..100.0f64, 0.0..20.0f64, 0.0..20.0f64)
        .prop_map(|(x, y, w, h)| Aabb2D::from_xywh(x, y, w, h))
}

fn vec_strategy(range: f64) -> impl Strategy<Value = Vec2> {
    (-range..range, -range..range).prop_map(|(x, y)| Vec2::new(x, y))
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => box_strategy().prop_map(Op::Create),
        3 => (any::<usize>(), vec_strategy(5.0), vec_strategy(1.0))
            .prop_map(|(i, offset, d)| Op::Move(i, offset, d)),
        2 => any::<usize>().prop_map(Op::Destroy),
        1 => box_strategy().prop_map(Op::Query),
    ]
}

/// The proxies the tree is expected to hold, with their current tight boxes.
struct Model {
    live: Vec<(ProxyId, u32, Aabb2D<f64>)>,
    next_payload: u32,
}

fn brute_force(tree: &DynamicTree<u32>, model: &Model, query: Aabb2D<f64>) -> Vec<ProxyId> {
    let mut hits: Vec<_> = model
        .live
        .iter()
        .map(|(id, _, _)| *id)
        .filter(|id| tree.fat_aabb(*id).overlaps(&query))
        .collect();
    hits.sort();
    hits
}

fn check(tree: &DynamicTree<u32>, model: &Model) -> Result<(), TestCaseError> {
    prop_assert_eq!(tree.validate(), Ok(()));
    prop_assert!(tree.max_balance() <= 1, "balance {}", tree.max_balance());
    prop_assert_eq!(tree.height(), tree.compute_height());
    prop_assert_eq!(tree.proxy_count(), model.live.len());
    let expected_nodes = (2 * model.live.len()).saturating_sub(1);
    prop_assert_eq!(tree.node_count(), expected_nodes);
    for (id, payload, tight) in &model.live {
        prop_assert_eq!(tree.user_data(*id), Some(*payload));
        prop_assert!(
            tree.fat_aabb(*id).contains(tight),
            "fat box {:?} does not cover {:?}",
            tree.fat_aabb(*id),
            tight
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_under_random_ops(ops in prop::collection::vec(op_strategy(), 0..300)) {
        let mut tree: DynamicTree<u32> =
            DynamicTree::with_config(TreeConfig::default().with_initial_capacity(4));
        let mut model = Model { live: Vec::new(), next_payload: 0 };

        for op in ops {
            match op {
                Op::Create(aabb) => {
                    let payload = model.next_payload;
                    model.next_payload += 1;
                    let id = tree.create_proxy(aabb, payload);
                    prop_assert!(model.live.iter().all(|(other, _, _)| *other != id));
                    model.live.push((id, payload, aabb));
                }
                Op::Move(i, offset, displacement) => {
                    if model.live.is_empty() {
                        continue;
                    }
                    let slot = i % model.live.len();
                    let (id, _, tight) = model.live[slot];
                    let moved = tight.translate(offset);
                    let before = tree.fat_aabb(id);
                    let reinserted = tree.move_proxy(id, moved, displacement);
                    if !reinserted {
                        prop_assert_eq!(tree.fat_aabb(id), before);
                    }
                    model.live[slot].2 = moved;
                }
                Op::Destroy(i) => {
                    if model.live.is_empty() {
                        continue;
                    }
                    let (id, _, _) = model.live.swap_remove(i % model.live.len());
                    tree.destroy_proxy(id);
                }
                Op::Query(query) => {
                    let mut hits = tree.query_collect(query);
                    hits.sort();
                    prop_assert_eq!(hits, brute_force(&tree, &model, query));
                }
            }
            check(&tree, &model)?;
        }
    }

    #[test]
    fn query_matches_brute_force(
        boxes in prop::collection::vec(box_strategy(), 1..150),
        queries in prop::collection::vec(box_strategy(), 1..20),
    ) {
        let mut tree = DynamicTree::new();
        let mut model = Model { live: Vec::new(), next_payload: 0 };
        for (payload, aabb) in (0..).zip(boxes) {
            let id = tree.create_proxy(aabb, payload);
            model.live.push((id, payload, aabb));
        }
        for query in queries {
            let mut hits = tree.query_collect(query);
            hits.sort();
            prop_assert_eq!(hits, brute_force(&tree, &model, query));
        }
    }

    #[test]
    fn rebuild_keeps_proxies_and_queries(
        boxes in prop::collection::vec(box_strategy(), 1..80),
        query in box_strategy(),
    ) {
        let mut tree = DynamicTree::new();
        let mut model = Model { live: Vec::new(), next_payload: 0 };
        for (payload, aabb) in (0..).zip(boxes) {
            let id = tree.create_proxy(aabb, payload);
            model.live.push((id, payload, aabb));
        }
        let fat_before: Vec<_> = model.live.iter().map(|(id, _, _)| tree.fat_aabb(*id)).collect();

        tree.rebuild_bottom_up();

        prop_assert_eq!(tree.validate(), Ok(()));
        let fat_after: Vec<_> = model.live.iter().map(|(id, _, _)| tree.fat_aabb(*id)).collect();
        prop_assert_eq!(fat_before, fat_after);
        let mut hits = tree.query_collect(query);
        hits.sort();
        prop_assert_eq!(hits, brute_force(&tree, &model, query));
    }

    #[test]
    fn churn_does_not_grow_the_pool(
        boxes in prop::collection::vec(box_strategy(), 1..64),
        rounds in 1..8usize,
    ) {
        let mut tree: DynamicTree<usize> = DynamicTree::new();
        let mut capacity = None;
        for round in 0..rounds {
            let ids: Vec<_> = boxes.iter().map(|b| tree.create_proxy(*b, round)).collect();
            match capacity {
                None => capacity = Some(tree.capacity()),
                Some(c) => prop_assert_eq!(tree.capacity(), c),
            }
            for id in ids {
                tree.destroy_proxy(id);
            }
            prop_assert!(tree.is_empty());
            prop_assert_eq!(tree.node_count(), 0);
            prop_assert_eq!(tree.validate(), Ok(()));
        }
    }
}

#[test]
fn resting_proxy_is_not_reinserted() {
    let mut tree: DynamicTree<u32> = DynamicTree::new();
    let ids: Vec<_> = (0..20)
        .map(|i| {
            let x = f64::from(i) * 3.0;
            tree.create_proxy(Aabb2D::new(x, 0.0, x + 1.0, 1.0), i)
        })
        .collect();
    let inserted = tree.insertion_count();

    // Jitter below the margin never reinserts.
    for step in 0..100 {
        let jitter = if step % 2 == 0 { 0.05 } else { -0.05 };
        for (i, id) in (0..).zip(&ids) {
            let x = f64::from(i) * 3.0 + jitter;
            assert!(
                !tree.move_proxy(*id, Aabb2D::new(x, 0.0, x + 1.0, 1.0), Vec2::ZERO),
                "jitter reinserted proxy {i}"
            );
        }
    }
    assert_eq!(tree.insertion_count(), inserted);

    // Leaving the margin always reinserts.
    for (i, id) in (0..).zip(&ids) {
        let x = f64::from(i) * 3.0 + 0.5;
        assert!(
            tree.move_proxy(*id, Aabb2D::new(x, 0.0, x + 1.0, 1.0), Vec2::ZERO),
            "proxy {i} left its fat box but was not reinserted"
        );
    }
    assert_eq!(tree.insertion_count(), inserted + 20);
    assert_eq!(tree.validate(), Ok(()));
}
