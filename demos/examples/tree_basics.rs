// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Moving bodies through a dynamic AABB tree, with structural logging.
//!
//! Run:
//! - `RUST_LOG=understory_broadphase=trace cargo run -p understory_demos --example tree_basics`

use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_broadphase::{Aabb3D, DynamicAabbTree, SpatialData, TreeConfig, Vec3};

#[derive(Copy, Clone, Debug)]
struct Body {
    id: u32,
    velocity: Vec3<f32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .init();

    let config = TreeConfig::new(1.2, 0.05)?;
    let mut tree: DynamicAabbTree<u32, f32, Body> = DynamicAabbTree::with_config(config);
    for id in 0..16_u32 {
        let x = (id % 4) as f32 * 3.0;
        let z = (id / 4) as f32 * 3.0;
        let aabb = Aabb3D::from_min_max([x, 0.0, z], [x + 1.0, 1.0, z + 1.0]);
        let velocity = Vec3::new(if id % 2 == 0 { 0.4 } else { -0.4 }, 0.0, 0.0);
        tree.insert(id, SpatialData::new(aabb, Body { id, velocity }))?;
    }
    info!(height = tree.height(), nodes = tree.node_count(), "built tree");

    let mut pairs = Vec::new();
    for step in 0..6 {
        let mut reinserted = 0;
        let moved: Vec<_> = tree
            .iter()
            .map(|(k, d)| {
                let v = d.client_data.velocity;
                let aabb = Aabb3D::new(d.aabb.min + v, d.aabb.max + v);
                (k, SpatialData::new(aabb, d.client_data))
            })
            .collect();
        for (k, data) in moved {
            if tree.update(k, data)? {
                reinserted += 1;
            }
        }
        pairs.clear();
        tree.self_query(&mut pairs);
        let ids: Vec<_> = pairs.iter().map(|(a, b)| (a.id, b.id)).collect();
        info!(step, reinserted, height = tree.height(), "pairs: {ids:?}");
    }
    Ok(())
}
