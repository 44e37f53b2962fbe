// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::ControlFlow;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Vec2};
use understory_dynamic_tree::{Aabb2D, DynamicTree, ProxyId, RayCastInput};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Aabb2D::from_xywh(x0, y0, cell * 0.8, cell * 0.8));
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_random_rects(count: usize, extent: f64, size: f64) -> Vec<Aabb2D<f64>> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * extent;
            let y0 = rng.next_f64() * extent;
            Aabb2D::from_xywh(x0, y0, size, size)
        })
        .collect()
}

fn build(rects: &[Aabb2D<f64>]) -> (DynamicTree<u32>, Vec<ProxyId>) {
    let mut tree = DynamicTree::new();
    let ids = rects
        .iter()
        .zip(0..)
        .map(|(r, i)| tree.create_proxy(*r, i))
        .collect();
    (tree, ids)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("grid_n{n}"), |b| {
            b.iter(|| black_box(build(&rects)));
        });
    }
    let rects = gen_random_rects(10_000, 2000.0, 8.0);
    group.throughput(Throughput::Elements(rects.len() as u64));
    group.bench_function("random_10k", |b| {
        b.iter(|| black_box(build(&rects)));
    });
    group.finish();
}

fn bench_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("move");
    let rects = gen_random_rects(10_000, 2000.0, 8.0);
    group.throughput(Throughput::Elements(rects.len() as u64));

    // Motion inside the margin: every call is absorbed by the fat box.
    group.bench_function("jitter_10k", |b| {
        b.iter_batched(
            || build(&rects),
            |(mut tree, ids)| {
                for (id, r) in ids.iter().zip(&rects) {
                    let moved = r.translate(Vec2::new(0.05, -0.05));
                    black_box(tree.move_proxy(*id, moved, Vec2::ZERO));
                }
                tree
            },
            BatchSize::LargeInput,
        );
    });

    // Motion beyond the margin: every call reinserts.
    group.bench_function("drift_10k", |b| {
        b.iter_batched(
            || build(&rects),
            |(mut tree, ids)| {
                let d = Vec2::new(3.0, 1.0);
                for (id, r) in ids.iter().zip(&rects) {
                    black_box(tree.move_proxy(*id, r.translate(d), d));
                }
                tree
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    let rects = gen_random_rects(4096, 2000.0, 8.0);
    group.bench_function("destroy_create_half_4k", |b| {
        b.iter_batched(
            || build(&rects),
            |(mut tree, ids)| {
                for id in ids.iter().step_by(2) {
                    tree.destroy_proxy(*id);
                }
                for (r, i) in rects.iter().step_by(2).zip(0..) {
                    black_box(tree.create_proxy(*r, i));
                }
                tree
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let (tree, _) = build(&gen_random_rects(10_000, 2000.0, 8.0));
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    let windows: Vec<_> = (0..256)
        .map(|_| Aabb2D::from_xywh(rng.next_f64() * 1900.0, rng.next_f64() * 1900.0, 100.0, 100.0))
        .collect();
    group.throughput(Throughput::Elements(windows.len() as u64));
    group.bench_function("window_100_random_10k", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for w in &windows {
                tree.query(*w, &mut |_| {
                    hits += 1;
                    ControlFlow::Continue(())
                });
            }
            black_box(hits)
        });
    });
    group.bench_function("point_random_10k", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for w in &windows {
                tree.query_point(w.center(), &mut |_| {
                    hits += 1;
                    ControlFlow::Continue(())
                });
            }
            black_box(hits)
        });
    });
    group.finish();
}

fn bench_ray_cast(c: &mut Criterion) {
    let mut group = c.benchmark_group("ray_cast");
    let (tree, _) = build(&gen_random_rects(10_000, 2000.0, 8.0));
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let rays: Vec<_> = (0..256)
        .map(|_| {
            let p1 = Point::new(rng.next_f64() * 2000.0, rng.next_f64() * 2000.0);
            let p2 = Point::new(rng.next_f64() * 2000.0, rng.next_f64() * 2000.0);
            RayCastInput::new(p1, p2)
        })
        .collect();
    group.throughput(Throughput::Elements(rays.len() as u64));
    // Clip to the entry of each candidate's fat box along x, a cheap stand-in for a shape test.
    group.bench_function("closest_random_10k", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for ray in &rays {
                tree.ray_cast(ray, &mut |input: &RayCastInput, id: ProxyId| {
                    hits += 1;
                    let fat = tree.fat_aabb(id);
                    let dx = input.p2.x - input.p1.x;
                    if dx == 0.0 {
                        return input.max_fraction;
                    }
                    let t = ((fat.center().x - input.p1.x) / dx).clamp(0.0, input.max_fraction);
                    if t > 0.0 { t } else { input.max_fraction }
                });
            }
            black_box(hits)
        });
    });
    group.bench_function("all_hits_random_10k", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for ray in &rays {
                tree.ray_cast(ray, &mut |input: &RayCastInput, _: ProxyId| {
                    hits += 1;
                    input.max_fraction
                });
            }
            black_box(hits)
        });
    });
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    for &count in &[256usize, 1024] {
        let rects = gen_random_rects(count, 2000.0, 8.0);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("bottom_up_random_{count}"), |b| {
            b.iter_batched(
                || build(&rects).0,
                |mut tree| {
                    tree.rebuild_bottom_up();
                    tree
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_move,
    bench_churn,
    bench_query,
    bench_ray_cast,
    bench_rebuild,
);
criterion_main!(benches);
