// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_broadphase --heading-base-level=0

//! Understory Broadphase: a dynamic 3D AABB tree for broad-phase queries.
//!
//! Understory Broadphase keeps a height-balanced bounding volume hierarchy over
//! moving objects and answers the coarse questions a physics or rendering
//! layer asks every frame.
//!
//! - Insert, update, and remove AABBs under caller-issued keys with a `Copy` payload.
//! - Cast rays and frusta against the hierarchy.
//! - Enumerate every overlapping pair once with [`DynamicAabbTree::self_query`].
//! - Visualize the hierarchy level by level with [`DynamicAabbTree::debug_draw`].
//!
//! Leaves store a fattened copy of each box (see [`TreeConfig`]), so objects
//! that move a little between frames are updated without restructuring. All
//! queries are conservative: they report candidates whose stored box matches
//! and leave exact tests to the caller.
//!
//! The [`SpatialPartition`] trait abstracts the operations so callers can swap
//! the tree for [`FlatVec`], a linear-scan partition that is handy for tiny
//! sets and as a reference in tests.
//!
//! # Example
//!
//! ```rust
//! use understory_broadphase::{Aabb3D, DynamicAabbTree, Ray, SpatialData, Vec3};
//!
//! let mut tree: DynamicAabbTree<u32, f64, &str> = DynamicAabbTree::new();
//! tree.insert(1, SpatialData::new(Aabb3D::from_min_max([0.0; 3], [1.0; 3]), "a"))?;
//! tree.insert(2, SpatialData::new(Aabb3D::from_min_max([5.0; 3], [6.0; 3]), "b"))?;
//! tree.insert(3, SpatialData::new(Aabb3D::from_min_max([0.5; 3], [1.5; 3]), "c"))?;
//!
//! // Overlapping pairs, each reported once in unspecified order.
//! let mut pairs = Vec::new();
//! tree.self_query(&mut pairs);
//! assert_eq!(pairs.len(), 1);
//!
//! // Moving an object far away restructures the tree.
//! let moved = tree.update(3, SpatialData::new(Aabb3D::from_min_max([9.0; 3], [10.0; 3]), "c"))?;
//! assert!(moved);
//!
//! let mut hits = Vec::new();
//! let ray = Ray::new(Vec3::new(-1.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
//! tree.cast_ray(&ray, &mut hits);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].client_data, "a");
//! # Ok::<(), understory_broadphase::PartitionError<u32>>(())
//! ```
//!
//! Frustum culling uses inward-facing planes; a box is kept unless it lies
//! entirely outside one of them:
//!
//! ```rust
//! use understory_broadphase::{Aabb3D, DynamicAabbTree, Frustum, Plane, SpatialData, Vec3};
//!
//! let mut tree: DynamicAabbTree<u32, f32, u32> = DynamicAabbTree::new();
//! for i in 0..10 {
//!     let x = i as f32 * 4.0;
//!     tree.insert(i, SpatialData::new(Aabb3D::from_min_max([x, 0.0, 0.0], [x + 1.0, 1.0, 1.0]), i))
//!         .unwrap();
//! }
//! // Everything with x >= 20.
//! let half_space = Frustum::new([Plane::from_point_normal(
//!     Vec3::new(20.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//! )]);
//! let mut visible = Vec::new();
//! tree.cast_frustum(&half_space, &mut visible);
//! visible.sort();
//! assert_eq!(visible, vec![5, 6, 7, 8, 9]);
//! ```
//!
//! ## Logging
//!
//! Structural changes emit [`tracing`] events: `debug` for inserts, removals,
//! and clears, `trace` for reinsertions and rotations. No subscriber is
//! installed by this crate.
//!
//! ### Float semantics
//!
//! Coordinates are `f32` or `f64`. Inserts and updates reject NaN, infinite,
//! and inverted boxes. Surface areas are accumulated in a widened type
//! (`f32`→`f64`) so insertion decisions stay stable for large coordinates.

#![no_std]

extern crate alloc;

pub mod backends;
pub mod config;
pub mod debug;
pub mod error;
pub mod partition;
mod query;
pub mod tree;
pub mod types;

pub use backends::flatvec::FlatVec;
pub use config::TreeConfig;
pub use debug::{DebugShape, DrawMask};
pub use error::{ConfigError, GeometryError, PartitionError};
pub use partition::{NodeRecord, RayHit, SpatialData, SpatialPartition};
pub use tree::{DynamicAabbTree, NodeRef};
pub use types::{Aabb3D, Classification, Frustum, Plane, Ray, Scalar, Vec3};
