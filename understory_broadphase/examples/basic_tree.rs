// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Understory Broadphase: insert, move, pair query, and ray cast.

use understory_broadphase::{Aabb3D, DynamicAabbTree, Ray, SpatialData, Vec3};

fn main() -> Result<(), understory_broadphase::PartitionError<u32>> {
    let mut tree: DynamicAabbTree<u32, f32, &str> = DynamicAabbTree::new();
    tree.insert(1, SpatialData::new(Aabb3D::from_min_max([0.0; 3], [1.0; 3]), "crate"))?;
    tree.insert(2, SpatialData::new(Aabb3D::from_min_max([5.0; 3], [6.0; 3]), "barrel"))?;
    tree.insert(3, SpatialData::new(Aabb3D::from_min_max([0.5; 3], [1.5; 3]), "player"))?;

    let mut pairs = Vec::new();
    tree.self_query(&mut pairs);
    println!("overlapping pairs: {pairs:?}");

    // Small move stays inside the fattened box; a big one reinserts.
    let nudged = Aabb3D::from_min_max([0.52, 0.5, 0.5], [1.52, 1.5, 1.5]);
    let restructured = tree.update(3, SpatialData::new(nudged, "player"))?;
    println!("nudge restructured the tree: {restructured}");
    let far = Aabb3D::from_min_max([20.0; 3], [21.0; 3]);
    let restructured = tree.update(3, SpatialData::new(far, "player"))?;
    println!("teleport restructured the tree: {restructured}");

    let ray = Ray::new(Vec3::new(-1.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
    let mut hits = Vec::new();
    tree.cast_ray(&ray, &mut hits);
    println!("ray hits: {hits:?}");
    println!("height {} over {} leaves", tree.height(), tree.len());
    Ok(())
}
