// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector partition with linear scans. Small and simple; good for tiny sets
//! and as a reference when checking other partitions.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::Debug;

use tracing::debug;

use crate::debug::{DebugShape, DrawMask};
use crate::error::PartitionError;
use crate::partition::{NodeRecord, RayHit, SpatialData, SpatialPartition};
use crate::types::{Classification, Frustum, Ray, Scalar};

/// Flat vector partition with linear scans.
///
/// Boxes are stored exactly as given, so every query is exact with respect to
/// the registered AABBs. [`update_data`](SpatialPartition::update_data) never
/// restructures and always returns `false`.
pub struct FlatVec<K, T, P> {
    entries: Vec<Option<(K, SpatialData<T, P>)>>,
    slots: BTreeMap<K, usize>,
    free_list: Vec<usize>,
}

impl<K, T, P> Default for FlatVec<K, T, P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            slots: BTreeMap::new(),
            free_list: Vec::new(),
        }
    }
}

impl<K, T, P> FlatVec<K, T, P> {
    /// Create an empty partition.
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> impl Iterator<Item = &SpatialData<T, P>> + '_ {
        self.entries.iter().flatten().map(|(_, d)| d)
    }
}

impl<K, T, P> Debug for FlatVec<K, T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.entries.len();
        let alive = self.entries.iter().filter(|e| e.is_some()).count();
        f.debug_struct("FlatVec")
            .field("total_slots", &total)
            .field("alive", &alive)
            .finish_non_exhaustive()
    }
}

impl<K, T, P> SpatialPartition<K, T, P> for FlatVec<K, T, P>
where
    K: Copy + Ord + Debug,
    T: Scalar,
    P: Copy + Debug,
{
    fn insert_data(&mut self, key: K, data: SpatialData<T, P>) -> Result<(), PartitionError<K>> {
        data.aabb.validate()?;
        if self.slots.contains_key(&key) {
            return Err(PartitionError::DuplicateKey(key));
        }
        let slot = if let Some(i) = self.free_list.pop() {
            self.entries[i] = Some((key, data));
            i
        } else {
            self.entries.push(Some((key, data)));
            self.entries.len() - 1
        };
        let _ = self.slots.insert(key, slot);
        debug!(?key, slot, "flatvec insert");
        Ok(())
    }

    fn update_data(&mut self, key: K, data: SpatialData<T, P>) -> Result<bool, PartitionError<K>> {
        data.aabb.validate()?;
        let Some(&slot) = self.slots.get(&key) else {
            return Err(PartitionError::KeyNotFound(key));
        };
        self.entries[slot] = Some((key, data));
        Ok(false)
    }

    fn remove_data(&mut self, key: K) -> Result<P, PartitionError<K>> {
        let Some(slot) = self.slots.remove(&key) else {
            return Err(PartitionError::KeyNotFound(key));
        };
        self.free_list.push(slot);
        match self.entries[slot].take() {
            Some((_, data)) => Ok(data.client_data),
            None => Err(PartitionError::KeyNotFound(key)),
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
        self.free_list.clear();
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn cast_ray(&self, ray: &Ray<T>, results: &mut Vec<RayHit<T, P>>) {
        for d in self.live() {
            if let Some(t) = ray.intersect_aabb(&d.aabb) {
                results.push(RayHit {
                    client_data: d.client_data,
                    t,
                });
            }
        }
    }

    fn cast_frustum(&self, frustum: &Frustum<T>, results: &mut Vec<P>) {
        for d in self.live() {
            if frustum.classify_aabb(&d.aabb) != Classification::Outside {
                results.push(d.client_data);
            }
        }
    }

    fn self_query(&self, results: &mut Vec<(P, P)>) {
        let live: Vec<_> = self.live().collect();
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                if a.aabb.overlaps(&b.aabb) {
                    results.push((a.client_data, b.client_data));
                }
            }
        }
    }

    fn debug_draw<S>(
        &self,
        level: Option<usize>,
        style: &S,
        mask: DrawMask,
        mut draw: impl FnMut(DebugShape<'_, T, S>),
    ) {
        // Every entry is a leaf at depth zero.
        if level.is_some_and(|l| l != 0) || !mask.contains(DrawMask::LEAVES) {
            return;
        }
        for d in self.live() {
            draw(DebugShape {
                aabb: d.aabb,
                depth: 0,
                is_leaf: true,
                style,
            });
        }
    }

    fn fill_out_data(&self, results: &mut Vec<NodeRecord<T, P>>) {
        results.extend(self.live().map(|d| NodeRecord {
            aabb: d.aabb,
            client_data: Some(d.client_data),
            depth: 0,
        }));
    }
}
