// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug visualization hooks.
//!
//! Partitions never render anything themselves. [`debug_draw`] walks the
//! structure and hands each selected node's box to a callback together with a
//! caller-provided style value (typically a transform and a color).
//!
//! [`debug_draw`]: crate::SpatialPartition::debug_draw

use crate::types::Aabb3D;

bitflags::bitflags! {
    /// Selects which nodes [`debug_draw`](crate::SpatialPartition::debug_draw) reports.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DrawMask: u8 {
        /// Report leaves.
        const LEAVES   = 0b0000_0001;
        /// Report internal nodes.
        const INTERNAL = 0b0000_0010;
        /// For leaves, report the real box instead of the stored fattened one.
        const TIGHT    = 0b0000_0100;
    }
}

impl Default for DrawMask {
    fn default() -> Self {
        Self::LEAVES | Self::INTERNAL
    }
}

/// A box handed to a debug draw callback.
#[derive(Debug)]
pub struct DebugShape<'a, T, S> {
    /// Box to draw.
    pub aabb: Aabb3D<T>,
    /// Depth of the node; the root is `0`.
    pub depth: usize,
    /// Whether the node is a leaf.
    pub is_leaf: bool,
    /// Caller style, passed through unchanged.
    pub style: &'a S,
}
