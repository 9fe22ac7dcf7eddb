// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types reported by partitions, geometry validation, and configuration.

use core::fmt::Debug;

use thiserror::Error;

/// Why a piece of geometry was rejected at the API boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum GeometryError {
    /// A coordinate was NaN or infinite.
    #[error("geometry contains a NaN or infinite coordinate")]
    NonFinite,
    /// An AABB had `min > max` on some axis.
    #[error("aabb minimum exceeds maximum")]
    Inverted,
    /// A ray direction was the zero vector.
    #[error("ray direction has zero length")]
    ZeroDirection,
}

/// Errors from [`SpatialPartition`](crate::SpatialPartition) mutations.
///
/// All of these indicate caller misuse; none are retried internally and the
/// partition is left unchanged when one is returned.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum PartitionError<K: Debug> {
    /// Insert with a key that is already registered.
    #[error("key {0:?} is already registered")]
    DuplicateKey(K),
    /// Update or remove with a key that is not registered.
    #[error("key {0:?} not found")]
    KeyNotFound(K),
    /// The supplied AABB is degenerate.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
}

/// Rejected [`TreeConfig`](crate::TreeConfig) values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum ConfigError {
    /// The fattening factor was below one or not finite.
    #[error("fattening factor must be finite and at least 1")]
    FatteningFactor,
    /// The absolute margin was negative or not finite.
    #[error("margin must be finite and non-negative")]
    Margin,
}
