// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Alternative [`SpatialPartition`](crate::SpatialPartition) implementations.
//!
//! - `flatvec`: flat vector with linear scans and exact boxes. Useful for tiny
//!   sets and as a brute-force reference for the tree.

pub mod flatvec;
