// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction-time tuning for [`DynamicAabbTree`](crate::DynamicAabbTree).

use crate::error::ConfigError;
use crate::types::{Aabb3D, Scalar, lt};

/// Fattening parameters applied to every leaf box.
///
/// A leaf stores its real AABB enlarged around the center: half extents are
/// multiplied by `fattening_factor` and then padded by `margin`. Movement that
/// stays inside the enlarged box does not restructure the tree.
///
/// The default is a factor of `1.1` with no absolute margin. Use a non-zero
/// margin when indexing points or flat boxes, which a pure factor cannot grow.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TreeConfig<T> {
    fattening_factor: T,
    margin: T,
}

impl<T: Scalar> TreeConfig<T> {
    /// Validate and create a configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FatteningFactor`] if the factor is below one or not
    /// finite, [`ConfigError::Margin`] if the margin is negative or not finite.
    pub fn new(fattening_factor: T, margin: T) -> Result<Self, ConfigError> {
        if !T::is_finite(fattening_factor) || lt(fattening_factor, T::one()) {
            return Err(ConfigError::FatteningFactor);
        }
        if !T::is_finite(margin) || lt(margin, T::zero()) {
            return Err(ConfigError::Margin);
        }
        Ok(Self {
            fattening_factor,
            margin,
        })
    }

    /// Configuration that stores leaf boxes exactly as given.
    pub fn tight() -> Self {
        Self {
            fattening_factor: T::one(),
            margin: T::zero(),
        }
    }

    /// Relative growth of a leaf's half extents.
    pub fn fattening_factor(&self) -> T {
        self.fattening_factor
    }

    /// Absolute padding added on every axis after scaling.
    pub fn margin(&self) -> T {
        self.margin
    }

    pub(crate) fn fatten(&self, aabb: &Aabb3D<T>) -> Aabb3D<T> {
        aabb.fattened(self.fattening_factor, self.margin)
    }
}

impl Default for TreeConfig<f32> {
    fn default() -> Self {
        Self {
            fattening_factor: 1.1,
            margin: 0.0,
        }
    }
}

impl Default for TreeConfig<f64> {
    fn default() -> Self {
        Self {
            fattening_factor: 1.1,
            margin: 0.0,
        }
    }
}
