// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traversal-based queries over [`DynamicAabbTree`].
//!
//! All queries prune on the stored (fattened) boxes and report candidates
//! without ordering them.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::debug::{DebugShape, DrawMask};
use crate::error::PartitionError;
use crate::partition::{NodeRecord, RayHit, SpatialData, SpatialPartition};
use crate::tree::{DynamicAabbTree, Kind, NodeIdx};
use crate::types::{Classification, Frustum, Ray, Scalar};

/// Pending work for the self-query traversal.
enum Visit {
    /// Report overlapping pairs inside one subtree.
    Within(NodeIdx),
    /// Report overlapping pairs with one leaf in each subtree.
    Between(NodeIdx, NodeIdx),
}

impl<K, T, P> DynamicAabbTree<K, T, P>
where
    K: Copy + Ord + Debug,
    T: Scalar,
    P: Copy + Debug,
{
    /// Append every leaf whose stored box the ray touches.
    ///
    /// Each hit carries the parameter at which the ray enters the fattened box.
    /// Both children of a hit node are always visited; there is no early out.
    pub fn cast_ray(&self, ray: &Ray<T>, results: &mut Vec<RayHit<T, P>>) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i.get()];
            let Some(t) = ray.intersect_aabb(&node.aabb) else {
                continue;
            };
            match &node.kind {
                Kind::Leaf { data, .. } => results.push(RayHit {
                    client_data: data.client_data,
                    t,
                }),
                Kind::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
                Kind::Free => debug_assert!(false, "reachable node is free"),
            }
        }
    }

    /// Append every leaf whose stored box is inside or straddles the frustum.
    ///
    /// Subtrees outside any plane are pruned. Once a node is inside a plane its
    /// descendants skip that plane, and a node inside every plane has its
    /// whole subtree reported without further tests.
    pub fn cast_frustum(&self, frustum: &Frustum<T>, results: &mut Vec<P>) {
        let Some(root) = self.root else {
            return;
        };
        let planes = frustum.planes();
        if planes.is_empty() {
            return;
        }
        // Bit `n` set: plane `n` already contains the node. Planes past 64 are always tested.
        let mut stack: Vec<(NodeIdx, u64)> = vec![(root, 0)];
        'nodes: while let Some((i, mut inside)) = stack.pop() {
            let node = &self.nodes[i.get()];
            let mut straddles = false;
            for (n, plane) in planes.iter().enumerate() {
                let bit = if n < 64 { 1_u64 << n } else { 0 };
                if inside & bit != 0 {
                    continue;
                }
                match plane.classify_aabb(&node.aabb) {
                    Classification::Outside => continue 'nodes,
                    Classification::Inside => inside |= bit,
                    Classification::Overlaps => straddles = true,
                }
            }
            if !straddles {
                self.collect_subtree(i, results);
                continue;
            }
            match &node.kind {
                Kind::Leaf { data, .. } => results.push(data.client_data),
                Kind::Internal { left, right, .. } => {
                    stack.push((*right, inside));
                    stack.push((*left, inside));
                }
                Kind::Free => debug_assert!(false, "reachable node is free"),
            }
        }
    }

    /// Append every pair of distinct leaves whose stored boxes overlap.
    ///
    /// Each unordered pair is reported exactly once, found at the lowest common
    /// ancestor of its two leaves.
    pub fn self_query(&self, results: &mut Vec<(P, P)>) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![Visit::Within(root)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Within(i) => {
                    if let Some((left, right)) = self.children(i) {
                        stack.push(Visit::Within(left));
                        stack.push(Visit::Within(right));
                        stack.push(Visit::Between(left, right));
                    }
                }
                Visit::Between(a, b) => {
                    let (na, nb) = (&self.nodes[a.get()], &self.nodes[b.get()]);
                    if !na.aabb.overlaps(&nb.aabb) {
                        continue;
                    }
                    match (self.children(a), self.children(b)) {
                        (None, None) => {
                            if let (Kind::Leaf { data: da, .. }, Kind::Leaf { data: db, .. }) =
                                (&na.kind, &nb.kind)
                            {
                                results.push((da.client_data, db.client_data));
                            }
                        }
                        (None, Some((bl, br))) => {
                            stack.push(Visit::Between(a, bl));
                            stack.push(Visit::Between(a, br));
                        }
                        (Some((al, ar)), None) => {
                            stack.push(Visit::Between(al, b));
                            stack.push(Visit::Between(ar, b));
                        }
                        (Some((al, ar)), Some((bl, br))) => {
                            stack.push(Visit::Between(al, bl));
                            stack.push(Visit::Between(al, br));
                            stack.push(Visit::Between(ar, bl));
                            stack.push(Visit::Between(ar, br));
                        }
                    }
                }
            }
        }
    }

    /// Emit the boxes of nodes at depth `level`, or at every depth for `None`.
    ///
    /// Nodes are visited in pre-order. `mask` selects leaves and/or internal
    /// nodes and whether leaves report their real or fattened box. The tree is
    /// not modified.
    pub fn debug_draw<S>(
        &self,
        level: Option<usize>,
        style: &S,
        mask: DrawMask,
        mut draw: impl FnMut(DebugShape<'_, T, S>),
    ) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![(root, 0_usize)];
        while let Some((i, depth)) = stack.pop() {
            let node = &self.nodes[i.get()];
            let here = level.is_none_or(|l| l == depth);
            match &node.kind {
                Kind::Leaf { data, .. } => {
                    if here && mask.contains(DrawMask::LEAVES) {
                        let aabb = if mask.contains(DrawMask::TIGHT) {
                            data.aabb
                        } else {
                            node.aabb
                        };
                        draw(DebugShape {
                            aabb,
                            depth,
                            is_leaf: true,
                            style,
                        });
                    }
                }
                Kind::Internal { left, right, .. } => {
                    if here && mask.contains(DrawMask::INTERNAL) {
                        draw(DebugShape {
                            aabb: node.aabb,
                            depth,
                            is_leaf: false,
                            style,
                        });
                    }
                    if level.is_none_or(|l| depth < l) {
                        stack.push((*right, depth + 1));
                        stack.push((*left, depth + 1));
                    }
                }
                Kind::Free => debug_assert!(false, "reachable node is free"),
            }
        }
    }

    /// Append a pre-order record of every node with its depth.
    pub fn fill_out_data(&self, results: &mut Vec<NodeRecord<T, P>>) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![(root, 0_usize)];
        while let Some((i, depth)) = stack.pop() {
            let node = &self.nodes[i.get()];
            let client_data = match &node.kind {
                Kind::Leaf { data, .. } => Some(data.client_data),
                Kind::Internal { left, right, .. } => {
                    stack.push((*right, depth + 1));
                    stack.push((*left, depth + 1));
                    None
                }
                Kind::Free => None,
            };
            results.push(NodeRecord {
                aabb: node.aabb,
                client_data,
                depth,
            });
        }
    }

    fn collect_subtree(&self, start: NodeIdx, results: &mut Vec<P>) {
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            match &self.nodes[i.get()].kind {
                Kind::Leaf { data, .. } => results.push(data.client_data),
                Kind::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
                Kind::Free => debug_assert!(false, "reachable node is free"),
            }
        }
    }
}

impl<K, T, P> SpatialPartition<K, T, P> for DynamicAabbTree<K, T, P>
where
    K: Copy + Ord + Debug,
    T: Scalar,
    P: Copy + Debug,
{
    fn insert_data(&mut self, key: K, data: SpatialData<T, P>) -> Result<(), PartitionError<K>> {
        self.insert(key, data)
    }

    fn update_data(&mut self, key: K, data: SpatialData<T, P>) -> Result<bool, PartitionError<K>> {
        self.update(key, data)
    }

    fn remove_data(&mut self, key: K) -> Result<P, PartitionError<K>> {
        self.remove(key)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn cast_ray(&self, ray: &Ray<T>, results: &mut Vec<RayHit<T, P>>) {
        Self::cast_ray(self, ray, results);
    }

    fn cast_frustum(&self, frustum: &Frustum<T>, results: &mut Vec<P>) {
        Self::cast_frustum(self, frustum, results);
    }

    fn self_query(&self, results: &mut Vec<(P, P)>) {
        Self::self_query(self, results);
    }

    fn debug_draw<S>(
        &self,
        level: Option<usize>,
        style: &S,
        mask: DrawMask,
        draw: impl FnMut(DebugShape<'_, T, S>),
    ) {
        Self::debug_draw(self, level, style, mask, draw);
    }

    fn fill_out_data(&self, results: &mut Vec<NodeRecord<T, P>>) {
        Self::fill_out_data(self, results);
    }
}
