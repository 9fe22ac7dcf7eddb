// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visible-set example using frustum culling over a field of props.
//!
//! Run:
//! - `cargo run -p understory_demos --example frustum_visible_list`

use understory_broadphase::{Aabb3D, DynamicAabbTree, Frustum, SpatialData, Vec3};

const SPACING: f64 = 4.0;
const ROWS: u32 = 32;

/// A camera looking down +z from `eye`, with a square near and far plane.
fn camera(eye: Vec3<f64>, near: f64, far: f64, half_angle_tan: f64) -> Frustum<f64> {
    let corners = |d: f64| {
        let h = d * half_angle_tan;
        [
            Vec3::new(eye.x - h, eye.y - h, eye.z + d),
            Vec3::new(eye.x + h, eye.y - h, eye.z + d),
            Vec3::new(eye.x + h, eye.y + h, eye.z + d),
            Vec3::new(eye.x - h, eye.y + h, eye.z + d),
        ]
    };
    Frustum::from_corners(corners(near), corners(far))
}

fn main() {
    let mut tree: DynamicAabbTree<u32, f64, (u32, u32)> = DynamicAabbTree::new();
    for row in 0..ROWS {
        for col in 0..ROWS {
            let x = f64::from(col) * SPACING - 64.0;
            let z = f64::from(row) * SPACING;
            let aabb = Aabb3D::from_min_max([x, -1.0, z], [x + 1.0, 1.0, z + 1.0]);
            tree.insert(row * ROWS + col, SpatialData::new(aabb, (row, col)))
                .unwrap();
        }
    }

    // Simulate a camera dolly by moving the eye forward.
    let mut visible = Vec::new();
    for eye_z in [-10.0, 20.0, 60.0, 120.0] {
        let frustum = camera(Vec3::new(0.0, 0.0, eye_z), 1.0, 40.0, 0.5);
        visible.clear();
        tree.cast_frustum(&frustum, &mut visible);
        visible.sort_unstable();
        println!(
            "eye_z={eye_z:.1} -> {} visible, first few: {:?}",
            visible.len(),
            &visible[..visible.len().min(6)]
        );
    }
}
