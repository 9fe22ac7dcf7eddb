// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial partition trait and the data records that flow through it.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::debug::{DebugShape, DrawMask};
use crate::error::PartitionError;
use crate::types::{Aabb3D, Frustum, Ray, Scalar};

/// What a caller registers under a key: the object's real AABB and its payload.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpatialData<T, P> {
    /// The object's real (tight) bounds.
    pub aabb: Aabb3D<T>,
    /// Opaque payload handed back by queries.
    pub client_data: P,
}

impl<T, P> SpatialData<T, P> {
    /// Bundle an AABB with its payload.
    pub const fn new(aabb: Aabb3D<T>, client_data: P) -> Self {
        Self { aabb, client_data }
    }
}

/// One ray cast candidate.
///
/// `t` is where the ray enters the stored box, in multiples of the ray
/// direction. Results are not sorted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit<T, P> {
    /// Payload of the hit entry.
    pub client_data: P,
    /// Entry parameter along the ray.
    pub t: T,
}

/// A node visited by [`SpatialPartition::fill_out_data`], in pre-order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeRecord<T, P> {
    /// The stored box (fattened for tree leaves).
    pub aabb: Aabb3D<T>,
    /// Payload for leaves, `None` for internal nodes.
    pub client_data: Option<P>,
    /// Distance from the root.
    pub depth: usize,
}

/// Broad-phase spatial partition keyed by caller-issued keys.
///
/// Queries are conservative: they report every entry whose stored box may
/// satisfy the query and leave exact tests to the caller. Queries append to
/// caller-owned buffers so they can be reused frame to frame.
pub trait SpatialPartition<K: Copy + Ord + Debug, T: Scalar, P: Copy + Debug> {
    /// Register `data` under `key`.
    ///
    /// # Errors
    ///
    /// [`PartitionError::DuplicateKey`] if `key` is present and
    /// [`PartitionError::InvalidGeometry`] if the AABB is malformed.
    fn insert_data(&mut self, key: K, data: SpatialData<T, P>) -> Result<(), PartitionError<K>>;

    /// Replace the AABB and payload stored under `key`.
    ///
    /// Returns `true` when the partition had to restructure to accommodate the
    /// new box.
    ///
    /// # Errors
    ///
    /// [`PartitionError::KeyNotFound`] if `key` is absent and
    /// [`PartitionError::InvalidGeometry`] if the AABB is malformed.
    fn update_data(&mut self, key: K, data: SpatialData<T, P>) -> Result<bool, PartitionError<K>>;

    /// Remove `key`, returning its payload.
    ///
    /// # Errors
    ///
    /// [`PartitionError::KeyNotFound`] if `key` is absent.
    fn remove_data(&mut self, key: K) -> Result<P, PartitionError<K>>;

    /// Remove every entry.
    fn clear(&mut self);

    /// Number of registered keys.
    fn len(&self) -> usize;

    /// True if no keys are registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append entries whose stored box the ray touches.
    fn cast_ray(&self, ray: &Ray<T>, results: &mut Vec<RayHit<T, P>>);

    /// Append entries whose stored box is inside or straddles the frustum.
    fn cast_frustum(&self, frustum: &Frustum<T>, results: &mut Vec<P>);

    /// Append every pair of distinct entries whose stored boxes overlap, once each.
    fn self_query(&self, results: &mut Vec<(P, P)>);

    /// Emit debug shapes for the nodes at `level` (all levels for `None`).
    ///
    /// `style` is passed through to `draw` untouched.
    fn debug_draw<S>(
        &self,
        level: Option<usize>,
        style: &S,
        mask: DrawMask,
        draw: impl FnMut(DebugShape<'_, T, S>),
    );

    /// Append a pre-order description of the partition's nodes.
    fn fill_out_data(&self, results: &mut Vec<NodeRecord<T, P>>);
}
