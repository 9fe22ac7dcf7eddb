// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_broadphase::{
    Aabb3D, DynamicAabbTree, FlatVec, Frustum, Ray, SpatialData, SpatialPartition, TreeConfig,
    Vec3,
};

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

fn gen_grid_boxes(n: usize, cell: f64) -> Vec<Aabb3D<f64>> {
    let mut out = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let min = [x as f64 * cell, y as f64 * cell, z as f64 * cell];
                out.push(Aabb3D::from_min_max(
                    min,
                    [min[0] + cell, min[1] + cell, min[2] + cell],
                ));
            }
        }
    }
    out
}

fn gen_random_boxes(count: usize, world: f64, size: f64, seed: u64) -> Vec<Aabb3D<f64>> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            let min = [
                rng.next_f64() * world,
                rng.next_f64() * world,
                rng.next_f64() * world,
            ];
            Aabb3D::from_min_max(min, [min[0] + size, min[1] + size, min[2] + size])
        })
        .collect()
}

fn filled<S: SpatialPartition<u32, f64, u32>>(mut partition: S, boxes: &[Aabb3D<f64>]) -> S {
    for (i, b) in boxes.iter().copied().enumerate() {
        let _ = partition.insert_data(i as u32, SpatialData::new(b, i as u32));
    }
    partition
}

fn view_frustum() -> Frustum<f64> {
    Frustum::from_corners(
        [
            Vec3::new(450.0, 450.0, 0.0),
            Vec3::new(550.0, 450.0, 0.0),
            Vec3::new(550.0, 550.0, 0.0),
            Vec3::new(450.0, 550.0, 0.0),
        ],
        [
            Vec3::new(250.0, 250.0, 600.0),
            Vec3::new(750.0, 250.0, 600.0),
            Vec3::new(750.0, 750.0, 600.0),
            Vec3::new(250.0, 750.0, 600.0),
        ],
    )
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[8usize, 16, 24] {
        let boxes = gen_grid_boxes(n, 10.0);
        group.throughput(Throughput::Elements((n * n * n) as u64));
        group.bench_function(format!("tree_grid_n{}", n), |b| {
            b.iter_batched(
                DynamicAabbTree::<u32, f64, u32>::new,
                |tree| black_box(filled(tree, &boxes).height()),
                BatchSize::SmallInput,
            )
        });
    }
    let boxes = gen_random_boxes(4096, 1000.0, 8.0, 0xCAFE_F00D_DEAD_BEEF);
    group.bench_function("tree_random_4096", |b| {
        b.iter_batched(
            DynamicAabbTree::<u32, f64, u32>::new,
            |tree| black_box(filled(tree, &boxes).height()),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_update_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_churn");
    let boxes = gen_random_boxes(4096, 1000.0, 8.0, 0xBADC_F00D_1234_5678);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    // Small jitters mostly stay inside the fattened boxes; jumps always reinsert.
    let jitter: Vec<_> = boxes
        .iter()
        .map(|b| {
            let d = (rng.next_f64() - 0.5) * 0.6;
            Aabb3D::new(b.min + Vec3::splat(d), b.max + Vec3::splat(d))
        })
        .collect();
    let jumps = gen_random_boxes(4096, 1000.0, 8.0, 0xFACE_FEED_CAFE_BABE);
    for (name, moved) in [("jitter", &jitter), ("jump", &jumps)] {
        group.throughput(Throughput::Elements(moved.len() as u64));
        group.bench_function(format!("tree_{}", name), |b| {
            b.iter_batched(
                || filled(DynamicAabbTree::<u32, f64, u32>::new(), &boxes),
                |mut tree| {
                    let mut reinserted = 0usize;
                    for (i, m) in moved.iter().copied().enumerate() {
                        if tree.update(i as u32, SpatialData::new(m, i as u32)) == Ok(true) {
                            reinserted += 1;
                        }
                    }
                    black_box(reinserted);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    for &count in &[256usize, 4096] {
        let boxes = gen_random_boxes(count, 1000.0, 12.0, 0x5EED_0000_0000_0001);
        let tree = filled(DynamicAabbTree::<u32, f64, u32>::new(), &boxes);
        let tight = filled(
            DynamicAabbTree::<u32, f64, u32>::with_config(TreeConfig::tight()),
            &boxes,
        );
        let flat = filled(FlatVec::<u32, f64, u32>::new(), &boxes);
        let ray = Ray::new(Vec3::new(-10.0, 500.0, 500.0), Vec3::new(1.0, 0.01, -0.02));
        let frustum = view_frustum();

        group.bench_function(format!("tree_self_query_{}", count), |b| {
            let mut out = Vec::new();
            b.iter(|| {
                out.clear();
                tree.self_query(&mut out);
                black_box(out.len());
            })
        });
        group.bench_function(format!("tight_tree_self_query_{}", count), |b| {
            let mut out = Vec::new();
            b.iter(|| {
                out.clear();
                tight.self_query(&mut out);
                black_box(out.len());
            })
        });
        group.bench_function(format!("flatvec_self_query_{}", count), |b| {
            let mut out = Vec::new();
            b.iter(|| {
                out.clear();
                flat.self_query(&mut out);
                black_box(out.len());
            })
        });
        group.bench_function(format!("tree_ray_{}", count), |b| {
            let mut out = Vec::new();
            b.iter(|| {
                out.clear();
                tree.cast_ray(&ray, &mut out);
                black_box(out.len());
            })
        });
        group.bench_function(format!("flatvec_ray_{}", count), |b| {
            let mut out = Vec::new();
            b.iter(|| {
                out.clear();
                flat.cast_ray(&ray, &mut out);
                black_box(out.len());
            })
        });
        group.bench_function(format!("tree_frustum_{}", count), |b| {
            let mut out = Vec::new();
            b.iter(|| {
                out.clear();
                tree.cast_frustum(&frustum, &mut out);
                black_box(out.len());
            })
        });
        group.bench_function(format!("flatvec_frustum_{}", count), |b| {
            let mut out = Vec::new();
            b.iter(|| {
                out.clear();
                flat.cast_frustum(&frustum, &mut out);
                black_box(out.len());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_update_churn, bench_queries);
criterion_main!(benches);
