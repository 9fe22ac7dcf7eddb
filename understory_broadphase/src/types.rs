// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and the predicates the tree is built on.
//!
//! Everything here is generic over a floating [`Scalar`]. Cost metrics such as
//! [`Aabb3D::surface_area`] are returned in the scalar's widened accumulator.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;
use core::ops::{Add, Div, Mul, Neg, Sub};

use crate::error::GeometryError;

/// Floating-point scalar abstraction for 3D geometry.
///
/// Provides the handful of constants and operations needed by the slab test,
/// plane classification, and fattening, plus an associated widened accumulator
/// type for area comparisons (f32→f64).
pub trait Scalar:
    Copy
    + PartialOrd
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Widened accumulator type suitable for area/cost computations.
    type Acc: Copy
        + PartialOrd
        + Add<Output = Self::Acc>
        + Sub<Output = Self::Acc>
        + Mul<Output = Self::Acc>
        + Debug;

    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// One.
    fn one() -> Self;

    /// One half (used for centers and extents).
    fn half() -> Self;

    /// Positive infinity.
    fn infinity() -> Self;

    /// Absolute value.
    fn abs(v: Self) -> Self;

    /// True if the value is neither infinite nor NaN.
    fn is_finite(v: Self) -> bool;

    /// Convert a scalar to the accumulator type.
    fn widen(v: Self) -> Self::Acc;
}

impl Scalar for f32 {
    type Acc = f64;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn half() -> Self {
        0.5
    }

    #[inline]
    fn infinity() -> Self {
        Self::INFINITY
    }

    #[inline]
    fn abs(v: Self) -> Self {
        if v < 0.0 { -v } else { v }
    }

    #[inline]
    fn is_finite(v: Self) -> bool {
        v.is_finite()
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v as f64
    }
}

impl Scalar for f64 {
    type Acc = Self;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn half() -> Self {
        0.5
    }

    #[inline]
    fn infinity() -> Self {
        Self::INFINITY
    }

    #[inline]
    fn abs(v: Self) -> Self {
        if v < 0.0 { -v } else { v }
    }

    #[inline]
    fn is_finite(v: Self) -> bool {
        v.is_finite()
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v
    }
}

/// Helper alias for the widened accumulator type associated with a scalar `T`.
pub type ScalarAcc<T> = <T as Scalar>::Acc;

/// A point or direction in 3D.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Vec3<T> {
    /// X component.
    pub x: T,
    /// Y component.
    pub y: T,
    /// Z component.
    pub z: T,
}

impl<T> Vec3<T> {
    /// Create a vector from its components.
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Scalar> Vec3<T> {
    /// A vector with all components set to `v`.
    pub fn splat(v: T) -> Self {
        Self::new(v, v, v)
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::splat(T::zero())
    }

    /// Dot product.
    pub fn dot(self, o: Self) -> T {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    /// Cross product.
    pub fn cross(self, o: Self) -> Self {
        Self::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    /// Multiply every component by `s`.
    pub fn scale(self, s: T) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Component-wise absolute value.
    pub fn abs(self) -> Self {
        Self::new(T::abs(self.x), T::abs(self.y), T::abs(self.z))
    }

    /// Component-wise minimum.
    pub fn min(self, o: Self) -> Self {
        Self::new(min_t(self.x, o.x), min_t(self.y, o.y), min_t(self.z, o.z))
    }

    /// Component-wise maximum.
    pub fn max(self, o: Self) -> Self {
        Self::new(max_t(self.x, o.x), max_t(self.y, o.y), max_t(self.z, o.z))
    }

    /// True if every component is finite.
    pub fn is_finite(self) -> bool {
        T::is_finite(self.x) && T::is_finite(self.y) && T::is_finite(self.z)
    }

    /// True if every component is exactly zero.
    pub fn is_zero(self) -> bool {
        self.x == T::zero() && self.y == T::zero() && self.z == T::zero()
    }

    pub(crate) fn to_array(self) -> [T; 3] {
        [self.x, self.y, self.z]
    }
}

impl<T: Scalar> Add for Vec3<T> {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl<T: Scalar> Sub for Vec3<T> {
    type Output = Self;

    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl<T: Scalar> Neg for Vec3<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Axis-aligned bounding box in 3D.
///
/// A well-formed box has finite corners with `min <= max` on every axis; see
/// [`Aabb3D::validate`]. Touching faces count as overlapping.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3D<T> {
    /// Minimum corner.
    pub min: Vec3<T>,
    /// Maximum corner.
    pub max: Vec3<T>,
}

impl<T> Aabb3D<T> {
    /// Create a new AABB from min/max corners.
    pub const fn new(min: Vec3<T>, max: Vec3<T>) -> Self {
        Self { min, max }
    }
}

impl<T: Scalar> Aabb3D<T> {
    /// Create an AABB from the six coordinates of its corners.
    pub fn from_min_max(min: [T; 3], max: [T; 3]) -> Self {
        Self::new(
            Vec3::new(min[0], min[1], min[2]),
            Vec3::new(max[0], max[1], max[2]),
        )
    }

    /// Create an AABB centered at `center` with the given half extents.
    pub fn from_center_half_extents(center: Vec3<T>, half: Vec3<T>) -> Self {
        Self::new(center - half, center + half)
    }

    /// Center point.
    pub fn center(&self) -> Vec3<T> {
        (self.min + self.max).scale(T::half())
    }

    /// Half of the size along each axis.
    pub fn half_extents(&self) -> Vec3<T> {
        (self.max - self.min).scale(T::half())
    }

    /// Smallest AABB containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        union_aabb(*self, *other)
    }

    /// Whether the boxes share at least one point (inclusive on faces).
    pub fn overlaps(&self, other: &Self) -> bool {
        le(self.min.x, other.max.x)
            && le(other.min.x, self.max.x)
            && le(self.min.y, other.max.y)
            && le(other.min.y, self.max.y)
            && le(self.min.z, other.max.z)
            && le(other.min.z, self.max.z)
    }

    /// Whether `other` lies entirely inside this box (inclusive on faces).
    pub fn contains(&self, other: &Self) -> bool {
        le(self.min.x, other.min.x)
            && le(self.min.y, other.min.y)
            && le(self.min.z, other.min.z)
            && le(other.max.x, self.max.x)
            && le(other.max.y, self.max.y)
            && le(other.max.z, self.max.z)
    }

    /// Whether this AABB contains the point.
    pub fn contains_point(&self, p: Vec3<T>) -> bool {
        le(self.min.x, p.x)
            && le(self.min.y, p.y)
            && le(self.min.z, p.z)
            && le(p.x, self.max.x)
            && le(p.y, self.max.y)
            && le(p.z, self.max.z)
    }

    /// Surface area in the widened accumulator. This is the insertion cost metric.
    pub fn surface_area(&self) -> T::Acc {
        let d = self.max - self.min;
        let (x, y, z) = (
            T::widen(max_t(d.x, T::zero())),
            T::widen(max_t(d.y, T::zero())),
            T::widen(max_t(d.z, T::zero())),
        );
        let two = T::widen(T::one()) + T::widen(T::one());
        two * (x * y + y * z + z * x)
    }

    /// Volume in the widened accumulator.
    pub fn volume(&self) -> T::Acc {
        let d = self.max - self.min;
        T::widen(max_t(d.x, T::zero()))
            * T::widen(max_t(d.y, T::zero()))
            * T::widen(max_t(d.z, T::zero()))
    }

    /// Enlarge the box for storage in a leaf.
    ///
    /// Half extents are scaled by `factor` around the center and then padded by
    /// `margin` on every axis. The result always contains `self`, and a factor
    /// of one with no margin returns `self` unchanged.
    pub fn fattened(&self, factor: T, margin: T) -> Self {
        if factor == T::one() && margin == T::zero() {
            return *self;
        }
        let half = self.half_extents();
        let grown = half.scale(factor) + Vec3::splat(margin);
        let fat = Self::from_center_half_extents(self.center(), grown);
        // Rounding around the center must not cut into the original box.
        fat.union(self)
    }

    /// Check that the box is finite and not inverted.
    ///
    /// # Errors
    ///
    /// [`GeometryError::NonFinite`] for NaN or infinite corners and
    /// [`GeometryError::Inverted`] when `min > max` on any axis.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        if lt(self.max.x, self.min.x) || lt(self.max.y, self.min.y) || lt(self.max.z, self.min.z)
        {
            return Err(GeometryError::Inverted);
        }
        Ok(())
    }
}

/// A half-line starting at `origin` and extending along `direction`.
///
/// The direction does not need to be normalized; hit parameters are expressed
/// in multiples of it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray<T> {
    /// Start point.
    pub origin: Vec3<T>,
    /// Direction of travel.
    pub direction: Vec3<T>,
}

impl<T> Ray<T> {
    /// Create a ray without validating the direction.
    pub const fn new(origin: Vec3<T>, direction: Vec3<T>) -> Self {
        Self { origin, direction }
    }
}

impl<T: Scalar> Ray<T> {
    /// Create a ray, rejecting non-finite input and a zero direction.
    ///
    /// # Errors
    ///
    /// [`GeometryError::NonFinite`] or [`GeometryError::ZeroDirection`].
    pub fn try_new(origin: Vec3<T>, direction: Vec3<T>) -> Result<Self, GeometryError> {
        if !origin.is_finite() || !direction.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        if direction.is_zero() {
            return Err(GeometryError::ZeroDirection);
        }
        Ok(Self::new(origin, direction))
    }

    /// Point at parameter `t`.
    pub fn at(&self, t: T) -> Vec3<T> {
        self.origin + self.direction.scale(t)
    }

    /// Slab test against `aabb`.
    ///
    /// Returns the smallest `t >= 0` at which the ray is inside the box
    /// (`0` when the origin already is), or `None` on a miss.
    pub fn intersect_aabb(&self, aabb: &Aabb3D<T>) -> Option<T> {
        let o = self.origin.to_array();
        let d = self.direction.to_array();
        let lo = aabb.min.to_array();
        let hi = aabb.max.to_array();
        let mut t_min = T::zero();
        let mut t_max = T::infinity();
        for axis in 0..3 {
            if d[axis] == T::zero() {
                if lt(o[axis], lo[axis]) || lt(hi[axis], o[axis]) {
                    return None;
                }
                continue;
            }
            let inv = T::one() / d[axis];
            let mut t0 = (lo[axis] - o[axis]) * inv;
            let mut t1 = (hi[axis] - o[axis]) * inv;
            if t1 < t0 {
                core::mem::swap(&mut t0, &mut t1);
            }
            // NaN comparisons are false, so a degenerate slab leaves the interval alone.
            if t0 > t_min {
                t_min = t0;
            }
            if t1 < t_max {
                t_max = t1;
            }
            if t_max < t_min {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Result of classifying a box against a plane or frustum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Entirely on the outer side.
    Outside,
    /// Entirely on the inner side.
    Inside,
    /// Straddles the boundary.
    Overlaps,
}

/// An oriented plane `dot(normal, p) = offset`.
///
/// The inside half-space is `dot(normal, p) >= offset`. The normal does not
/// need to be unit length.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane<T> {
    /// Normal pointing towards the inside half-space.
    pub normal: Vec3<T>,
    /// Plane offset along the normal.
    pub offset: T,
}

impl<T> Plane<T> {
    /// Create a plane from its normal and offset.
    pub const fn new(normal: Vec3<T>, offset: T) -> Self {
        Self { normal, offset }
    }
}

impl<T: Scalar> Plane<T> {
    /// Plane through `point` whose inside is the side `normal` points to.
    pub fn from_point_normal(point: Vec3<T>, normal: Vec3<T>) -> Self {
        Self::new(normal, normal.dot(point))
    }

    /// Plane through three points; the inside is the side from which
    /// `a`, `b`, `c` appear counter-clockwise.
    pub fn from_points(a: Vec3<T>, b: Vec3<T>, c: Vec3<T>) -> Self {
        Self::from_point_normal(a, (b - a).cross(c - a))
    }

    /// Signed distance scaled by the normal's length; positive inside.
    pub fn signed_distance(&self, p: Vec3<T>) -> T {
        self.normal.dot(p) - self.offset
    }

    /// The same plane with the inside flipped.
    pub fn flipped(&self) -> Self {
        Self::new(-self.normal, -self.offset)
    }

    /// Classify `aabb` using the extreme-corner (effective radius) test.
    pub fn classify_aabb(&self, aabb: &Aabb3D<T>) -> Classification {
        let radius = self.normal.abs().dot(aabb.half_extents());
        let s = self.signed_distance(aabb.center());
        if s < -radius {
            Classification::Outside
        } else if s > radius {
            Classification::Inside
        } else {
            Classification::Overlaps
        }
    }
}

/// A convex volume bounded by an ordered set of planes.
///
/// Usually six planes (near, far, left, right, top, bottom), but any count is
/// accepted. A frustum without planes contains nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum<T> {
    planes: Vec<Plane<T>>,
}

impl<T: Scalar> Frustum<T> {
    /// Create a frustum from planes whose normals point inwards.
    pub fn new(planes: impl IntoIterator<Item = Plane<T>>) -> Self {
        Self {
            planes: planes.into_iter().collect(),
        }
    }

    /// Build the six planes of a frustum from its eight corners.
    ///
    /// Each quad is given as left-bottom, right-bottom, right-top, left-top.
    /// Planes are oriented so the frustum's centroid is inside, which makes the
    /// result independent of handedness.
    pub fn from_corners(near: [Vec3<T>; 4], far: [Vec3<T>; 4]) -> Self {
        let [lbn, rbn, rtn, ltn] = near;
        let [lbf, rbf, rtf, ltf] = far;
        let eighth = T::half() * T::half() * T::half();
        let centroid = near
            .iter()
            .chain(far.iter())
            .fold(Vec3::zero(), |acc, p| acc + *p)
            .scale(eighth);
        let raw = [
            Plane::from_points(lbn, rbn, rtn),
            Plane::from_points(lbf, rtf, rbf),
            Plane::from_points(lbn, ltn, ltf),
            Plane::from_points(rbn, rbf, rtf),
            Plane::from_points(ltn, rtn, rtf),
            Plane::from_points(lbn, lbf, rbf),
        ];
        Self::new(raw.into_iter().map(|p| {
            if p.signed_distance(centroid) < T::zero() {
                p.flipped()
            } else {
                p
            }
        }))
    }

    /// The bounding planes in order.
    pub fn planes(&self) -> &[Plane<T>] {
        &self.planes
    }

    /// True if the frustum has no planes.
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Classify `aabb` against every plane.
    ///
    /// An empty frustum classifies everything as [`Classification::Outside`].
    pub fn classify_aabb(&self, aabb: &Aabb3D<T>) -> Classification {
        if self.planes.is_empty() {
            return Classification::Outside;
        }
        let mut result = Classification::Inside;
        for plane in &self.planes {
            match plane.classify_aabb(aabb) {
                Classification::Outside => return Classification::Outside,
                Classification::Overlaps => result = Classification::Overlaps,
                Classification::Inside => {}
            }
        }
        result
    }
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

pub(crate) fn lt<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o == Ordering::Less)
        .unwrap_or(false)
}

pub(crate) fn union_aabb<T: Scalar>(a: Aabb3D<T>, b: Aabb3D<T>) -> Aabb3D<T> {
    Aabb3D::new(a.min.min(b.min), a.max.max(b.max))
}
