// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_broadphase::{Aabb3D, DynamicAabbTree, SpatialData, TreeConfig};

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

fn gen_grid_boxes(n: usize, cell: f64, scale: f64) -> Vec<Aabb3D<f64>> {
    let mut out = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let min = [x as f64 * cell, y as f64 * cell, z as f64 * cell];
                let s = cell * scale;
                out.push(Aabb3D::from_min_max(min, [min[0] + s, min[1] + s, min[2] + s]));
            }
        }
    }
    out
}

type Entry = GeomWithData<Rectangle<[f64; 3]>, u32>;

fn to_rstar(v: &[Aabb3D<f64>]) -> Vec<Entry> {
    v.iter()
        .enumerate()
        .map(|(i, b)| {
            let r = Rectangle::from_corners(
                [b.min.x, b.min.y, b.min.z],
                [b.max.x, b.max.y, b.max.z],
            );
            GeomWithData::new(r, i as u32)
        })
        .collect()
}

/// Overlapping pairs from an R-tree: one envelope query per entry.
fn rstar_pairs(tree: &RTree<Entry>) -> usize {
    let mut pairs = 0;
    for e in tree.iter() {
        let env = AABB::from_corners(e.geom().lower(), e.geom().upper());
        pairs += tree
            .locate_in_envelope_intersecting(&env)
            .filter(|o| o.data > e.data)
            .count();
    }
    pairs
}

fn bench_rstar_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("rstar_external_compare");
    for &n in &[8usize, 16] {
        let boxes = gen_grid_boxes(n, 10.0, 1.5);
        group.throughput(Throughput::Elements((n * n * n) as u64));

        group.bench_function(format!("understory_build_pairs_n{}", n), |b| {
            b.iter_batched(
                || DynamicAabbTree::<u32, f64, u32>::with_config(TreeConfig::tight()),
                |mut tree| {
                    for (i, r) in boxes.iter().copied().enumerate() {
                        let _ = tree.insert(i as u32, SpatialData::new(r, i as u32));
                    }
                    let mut out = Vec::new();
                    tree.self_query(&mut out);
                    black_box(out.len());
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("rstar_build_pairs_bulk_n{}", n), |b| {
            b.iter_batched(
                || to_rstar(&boxes),
                |entries| {
                    let tree = RTree::bulk_load(entries);
                    black_box(rstar_pairs(&tree));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rstar_external_compare);
criterion_main!(benches);
