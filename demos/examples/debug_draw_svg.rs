// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render the tree's bounding volumes to SVG, projected onto the XY plane.
//!
//! Each depth gets its own color; leaves are drawn with their real boxes.
//!
//! Run:
//! - `cargo run -p understory_demos --example debug_draw_svg > tree.svg`

use kurbo::{Affine, BezPath, Rect, Shape};
use understory_broadphase::{Aabb3D, DebugShape, DrawMask, DynamicAabbTree, SpatialData};

const PALETTE: [&str; 6] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4",
];

/// Stroke settings handed through the tree untouched.
#[derive(Debug)]
struct Stroke {
    width: f64,
    opacity: f64,
}

fn project(shape: &DebugShape<'_, f64, Stroke>, view: Affine) -> BezPath {
    let a = shape.aabb;
    view * Rect::new(a.min.x, a.min.y, a.max.x, a.max.y).to_path(0.1)
}

fn main() {
    let mut tree: DynamicAabbTree<u32, f64, u32> = DynamicAabbTree::new();
    // A loose spiral so the hierarchy has interesting nesting.
    for i in 0..48_u32 {
        let t = f64::from(i) * 0.35;
        let (x, y) = (t.cos() * t * 6.0, t.sin() * t * 6.0);
        let s = 2.0 + f64::from(i % 3);
        tree.insert(i, SpatialData::new(Aabb3D::from_min_max([x, y, 0.0], [x + s, y + s, s]), i))
            .unwrap();
    }

    let Some(root) = tree.root() else {
        return;
    };
    let bounds = root.aabb();
    let view = Affine::translate((-bounds.min.x + 10.0, -bounds.min.y + 10.0)).then_scale(4.0);
    let canvas = view.transform_rect_bbox(Rect::new(
        bounds.min.x - 10.0,
        bounds.min.y - 10.0,
        bounds.max.x + 10.0,
        bounds.max.y + 10.0,
    ));

    let mut paths = Vec::new();
    let internal = Stroke {
        width: 0.75,
        opacity: 0.6,
    };
    tree.debug_draw(None, &internal, DrawMask::INTERNAL, |shape| {
        paths.push((project(&shape, view), shape.depth, shape.style.width, shape.style.opacity));
    });
    let leaves = Stroke {
        width: 1.5,
        opacity: 1.0,
    };
    tree.debug_draw(None, &leaves, DrawMask::LEAVES | DrawMask::TIGHT, |shape| {
        paths.push((project(&shape, view), shape.depth, shape.style.width, shape.style.opacity));
    });

    println!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}">"#,
        canvas.width(),
        canvas.height()
    );
    for (path, depth, width, opacity) in paths {
        println!(
            r#"  <path d="{}" fill="none" stroke="{}" stroke-width="{width}" stroke-opacity="{opacity}"/>"#,
            path.to_svg(),
            PALETTE[depth % PALETTE.len()],
        );
    }
    println!("</svg>");
    eprintln!("height {} with {} nodes", tree.height(), tree.node_count());
}
