// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Randomized and property tests that check the tree against a linear scan.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use understory_broadphase::{
    Aabb3D, DynamicAabbTree, FlatVec, Frustum, NodeRef, Ray, SpatialData, SpatialPartition,
    TreeConfig, Vec3,
};

/// Walk the tree through its public view and check every structural invariant.
///
/// Returns the number of leaves reached.
fn check_tree(tree: &DynamicAabbTree<u32, f64, u32>) -> usize {
    let Some(root) = tree.root() else {
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
        return 0;
    };
    assert!(root.parent().is_none());
    let mut leaves = 0;
    let mut stack: Vec<NodeRef<'_, u32, f64, u32>> = vec![root];
    while let Some(node) = stack.pop() {
        match (node.left(), node.right()) {
            (Some(l), Some(r)) => {
                assert_eq!(node.aabb(), l.aabb().union(&r.aabb()), "internal box is union");
                assert_eq!(node.height(), 1 + l.height().max(r.height()), "cached height");
                assert!(l.height().abs_diff(r.height()) <= 1, "balanced");
                assert_eq!(l.parent().map(|p| p.aabb()), Some(node.aabb()));
                assert_eq!(r.parent().map(|p| p.aabb()), Some(node.aabb()));
                stack.push(l);
                stack.push(r);
            }
            (None, None) => {
                leaves += 1;
                assert!(node.is_leaf());
                assert_eq!(node.height(), 0);
                let key = node.key().unwrap();
                let data = tree.get(key).unwrap();
                assert_eq!(node.tight_aabb(), Some(data.aabb));
                assert_eq!(node.client_data(), Some(data.client_data));
                assert!(node.aabb().contains(&data.aabb), "fat box contains real box");
            }
            _ => panic!("internal node with one child"),
        }
    }
    assert_eq!(leaves, tree.len());
    assert_eq!(tree.node_count(), 2 * leaves - 1, "no leaked nodes");
    leaves
}

fn random_box(rng: &mut StdRng, world: f64, max_size: f64) -> Aabb3D<f64> {
    let min = [
        rng.random_range(-world..world),
        rng.random_range(-world..world),
        rng.random_range(-world..world),
    ];
    let size = [
        rng.random_range(0.0..max_size),
        rng.random_range(0.0..max_size),
        rng.random_range(0.0..max_size),
    ];
    Aabb3D::from_min_max(min, [min[0] + size[0], min[1] + size[1], min[2] + size[2]])
}

fn sorted_pairs<S: SpatialPartition<u32, f64, u32>>(partition: &S) -> Vec<(u32, u32)> {
    let mut pairs = Vec::new();
    partition.self_query(&mut pairs);
    let mut out: Vec<_> = pairs.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect();
    out.sort_unstable();
    out
}

#[test]
fn tight_tree_matches_brute_force_pairs() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut tree: DynamicAabbTree<u32, f64, u32> =
        DynamicAabbTree::with_config(TreeConfig::tight());
    let mut flat: FlatVec<u32, f64, u32> = FlatVec::new();
    for k in 0..2_000_u32 {
        let b = random_box(&mut rng, 100.0, 6.0);
        tree.insert_data(k, SpatialData::new(b, k)).unwrap();
        flat.insert_data(k, SpatialData::new(b, k)).unwrap();
    }
    // Move a third of them and drop a tenth.
    for k in (0..2_000_u32).step_by(3) {
        let b = random_box(&mut rng, 100.0, 6.0);
        tree.update_data(k, SpatialData::new(b, k)).unwrap();
        flat.update_data(k, SpatialData::new(b, k)).unwrap();
    }
    for k in (0..2_000_u32).step_by(10) {
        assert_eq!(tree.remove_data(k), flat.remove_data(k));
    }
    assert_eq!(check_tree(&tree), flat.len());

    let got = sorted_pairs(&tree);
    let want = sorted_pairs(&flat);
    assert!(!want.is_empty(), "scene should produce some overlaps");
    assert_eq!(got, want);
    let mut dedup = got.clone();
    dedup.dedup();
    assert_eq!(dedup.len(), got.len(), "each pair reported once");
}

#[test]
fn fattened_tree_reports_superset_of_exact_pairs_and_hits() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut tree: DynamicAabbTree<u32, f64, u32> = DynamicAabbTree::new();
    let mut flat: FlatVec<u32, f64, u32> = FlatVec::new();
    for k in 0..1_000_u32 {
        let b = random_box(&mut rng, 50.0, 4.0);
        tree.insert(k, SpatialData::new(b, k)).unwrap();
        flat.insert_data(k, SpatialData::new(b, k)).unwrap();
    }
    let got = sorted_pairs(&tree);
    for pair in sorted_pairs(&flat) {
        assert!(got.binary_search(&pair).is_ok(), "missing pair {pair:?}");
    }

    for _ in 0..50 {
        let origin = Vec3::new(
            rng.random_range(-60.0..60.0),
            rng.random_range(-60.0..60.0),
            rng.random_range(-60.0..60.0),
        );
        let dir = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        let Ok(ray) = Ray::try_new(origin, dir) else {
            continue;
        };
        let mut exact = Vec::new();
        flat.cast_ray(&ray, &mut exact);
        let mut hits = Vec::new();
        tree.cast_ray(&ray, &mut hits);
        let hit_t: BTreeMap<u32, f64> = hits.iter().map(|h| (h.client_data, h.t)).collect();
        assert_eq!(hit_t.len(), hits.len(), "no duplicate hits");
        for e in exact {
            let t = hit_t
                .get(&e.client_data)
                .unwrap_or_else(|| panic!("ray missed {}", e.client_data));
            assert!(*t <= e.t, "fat box is entered no later than the real box");
        }
    }
}

#[test]
fn frustum_matches_brute_force_on_tight_tree() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut tree: DynamicAabbTree<u32, f64, u32> =
        DynamicAabbTree::with_config(TreeConfig::tight());
    let mut flat: FlatVec<u32, f64, u32> = FlatVec::new();
    for k in 0..1_500_u32 {
        let b = random_box(&mut rng, 80.0, 3.0);
        tree.insert(k, SpatialData::new(b, k)).unwrap();
        flat.insert_data(k, SpatialData::new(b, k)).unwrap();
    }
    let near = [
        Vec3::new(-5.0, -5.0, 1.0),
        Vec3::new(5.0, -5.0, 1.0),
        Vec3::new(5.0, 5.0, 1.0),
        Vec3::new(-5.0, 5.0, 1.0),
    ];
    let far = [
        Vec3::new(-40.0, -40.0, 70.0),
        Vec3::new(40.0, -40.0, 70.0),
        Vec3::new(40.0, 40.0, 70.0),
        Vec3::new(-40.0, 40.0, 70.0),
    ];
    let frustum = Frustum::from_corners(near, far);
    let mut got = Vec::new();
    tree.cast_frustum(&frustum, &mut got);
    let mut want = Vec::new();
    flat.cast_frustum(&frustum, &mut want);
    got.sort_unstable();
    want.sort_unstable();
    assert!(!want.is_empty());
    assert_eq!(got, want);
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u32, [f64; 3], f64),
    Update(u32, [f64; 3], f64),
    Remove(u32),
}

fn op() -> impl Strategy<Value = Op> {
    let key = 0..48_u32;
    let pos = prop::array::uniform3(-50.0..50.0_f64);
    prop_oneof![
        (key.clone(), pos.clone(), 0.0..5.0_f64).prop_map(|(k, p, s)| Op::Insert(k, p, s)),
        (key.clone(), pos, 0.0..5.0_f64).prop_map(|(k, p, s)| Op::Update(k, p, s)),
        key.prop_map(Op::Remove),
    ]
}

fn boxed(p: [f64; 3], s: f64) -> Aabb3D<f64> {
    Aabb3D::from_min_max(p, [p[0] + s, p[1] + s, p[2] + s])
}

proptest! {
    #[test]
    fn random_operations_keep_tree_valid(ops in prop::collection::vec(op(), 1..200)) {
        let mut tree: DynamicAabbTree<u32, f64, u32> = DynamicAabbTree::new();
        let mut model: BTreeMap<u32, Aabb3D<f64>> = BTreeMap::new();
        for op in ops {
            match op {
                Op::Insert(k, p, s) => {
                    let r = tree.insert(k, SpatialData::new(boxed(p, s), k));
                    prop_assert_eq!(r.is_ok(), !model.contains_key(&k));
                    model.entry(k).or_insert(boxed(p, s));
                }
                Op::Update(k, p, s) => {
                    let r = tree.update(k, SpatialData::new(boxed(p, s), k));
                    prop_assert_eq!(r.is_ok(), model.contains_key(&k));
                    if let Some(b) = model.get_mut(&k) {
                        *b = boxed(p, s);
                    }
                }
                Op::Remove(k) => {
                    let r = tree.remove(k);
                    prop_assert_eq!(r.ok(), model.remove(&k).map(|_| k));
                }
            }
            prop_assert_eq!(check_tree(&tree), model.len());
        }
        for (k, b) in &model {
            let data = tree.get(*k).unwrap();
            prop_assert_eq!(data.aabb, *b);
            prop_assert!(tree.fat_aabb(*k).unwrap().contains(b));
        }
    }

    #[test]
    fn insert_then_remove_restores_leaf_set(
        boxes in prop::collection::vec(
            (prop::array::uniform3(-20.0..20.0_f64), 0.0..3.0_f64),
            1..64,
        ),
        extra in (prop::array::uniform3(-20.0..20.0_f64), 0.0..3.0_f64),
    ) {
        let mut tree: DynamicAabbTree<u32, f64, u32> = DynamicAabbTree::new();
        for (i, (p, s)) in (0_u32..).zip(&boxes) {
            tree.insert(i, SpatialData::new(boxed(*p, *s), i)).unwrap();
        }
        let before: Vec<_> = tree.iter().map(|(k, d)| (k, *d)).collect();
        let key = u32::MAX;
        tree.insert(key, SpatialData::new(boxed(extra.0, extra.1), key)).unwrap();
        prop_assert_eq!(tree.remove(key), Ok(key));
        let after: Vec<_> = tree.iter().map(|(k, d)| (k, *d)).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(check_tree(&tree), boxes.len());
    }

    #[test]
    fn fattening_contains_original_and_is_stable(
        p in prop::array::uniform3(-1e3..1e3_f64),
        s in prop::array::uniform3(0.0..10.0_f64),
        factor in 1.0..3.0_f64,
        margin in 0.0..2.0_f64,
    ) {
        let b = Aabb3D::from_min_max(p, [p[0] + s[0], p[1] + s[1], p[2] + s[2]]);
        let fat = b.fattened(factor, margin);
        prop_assert!(fat.contains(&b));
        let again = TreeConfig::<f64>::tight();
        prop_assert_eq!(fat.fattened(again.fattening_factor(), again.margin()), fat);
    }
}
