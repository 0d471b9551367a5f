//! Axis-aligned bounding boxes.
//!
//! ## Purpose
//!
//! This module provides the box geometry that lets the traversal reason about
//! whole subtrees: containment, centres, and the minimum and maximum scaled
//! distances between two boxes.
//!
//! ## Key concepts
//!
//! * **Gap**: Per dimension, the minimum distance between two intervals is
//!   the gap between them (zero when they overlap).
//! * **Span**: Per dimension, the maximum distance is the larger of the two
//!   cross differences of the endpoints.
//!
//! ## Invariants
//!
//! * `min_distance_sq(a, b) ≤ ‖p − q‖² ≤ max_distance_sq(a, b)` (scaled) for
//!   any `p` in `a` and `q` in `b`.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// ============================================================================
// Bounding Box
// ============================================================================

/// Axis-aligned bounding box in `d` dimensions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox<T> {
    /// Lower corner.
    pub min: Vec<T>,
    /// Upper corner.
    pub max: Vec<T>,
}

impl<T: Float> BoundingBox<T> {
    /// An empty box (every extent inverted), ready to grow.
    pub fn empty(dimensions: usize) -> Self {
        Self {
            min: vec![T::infinity(); dimensions],
            max: vec![T::neg_infinity(); dimensions],
        }
    }

    /// The tightest box around the given flattened points.
    pub fn from_points<'a, I>(points: I, dimensions: usize) -> Self
    where
        I: IntoIterator<Item = &'a [T]>,
        T: 'a,
    {
        let mut bounds = Self::empty(dimensions);
        for point in points {
            bounds.include(point);
        }
        bounds
    }

    /// Grow the box to contain `point`.
    #[inline]
    pub fn include(&mut self, point: &[T]) {
        for (k, &x) in point.iter().enumerate() {
            if x < self.min[k] {
                self.min[k] = x;
            }
            if x > self.max[k] {
                self.max[k] = x;
            }
        }
    }

    /// Number of dimensions.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.min.len()
    }

    /// Returns `true` if `point` lies inside the box (boundary inclusive).
    pub fn contains_point(&self, point: &[T]) -> bool {
        point
            .iter()
            .enumerate()
            .all(|(k, &x)| x >= self.min[k] && x <= self.max[k])
    }

    /// Returns `true` if `other` lies inside the box.
    pub fn contains_box(&self, other: &Self) -> bool {
        (0..self.dimensions()).all(|k| other.min[k] >= self.min[k] && other.max[k] <= self.max[k])
    }

    /// Centre of the box.
    pub fn centre(&self) -> Vec<T> {
        let two = T::one() + T::one();
        self.min
            .iter()
            .zip(self.max.iter())
            .map(|(&lo, &hi)| (lo + hi) / two)
            .collect()
    }

    /// Write `centre(self) − centre(other)` into `out`.
    #[inline]
    pub fn centre_offset(&self, other: &Self, out: &mut [T]) {
        let two = T::one() + T::one();
        for (k, o) in out.iter_mut().enumerate() {
            *o = ((self.min[k] + self.max[k]) - (other.min[k] + other.max[k])) / two;
        }
    }

    /// Write `centre(self) − point` into `out`.
    #[inline]
    pub fn centre_offset_to_point(&self, point: &[T], out: &mut [T]) {
        let two = T::one() + T::one();
        for (k, o) in out.iter_mut().enumerate() {
            *o = (self.min[k] + self.max[k]) / two - point[k];
        }
    }

    /// Dimension of greatest extent and that extent.
    pub fn widest_dimension(&self) -> (usize, T) {
        let mut best = (0, T::neg_infinity());
        for k in 0..self.dimensions() {
            let spread = self.max[k] - self.min[k];
            if spread > best.1 {
                best = (k, spread);
            }
        }
        best
    }

    // ========================================================================
    // Scaled Distances
    // ========================================================================

    /// Minimum squared scaled distance between any point of `self` and any point of `other`.
    pub fn min_distance_sq(&self, other: &Self, scales: &[T]) -> T {
        let mut sum = T::zero();
        for (k, &scale) in scales.iter().enumerate() {
            let gap = (other.min[k] - self.max[k])
                .max(self.min[k] - other.max[k])
                .max(T::zero())
                * scale;
            sum = sum + gap * gap;
        }
        sum
    }

    /// Maximum squared scaled distance between any point of `self` and any point of `other`.
    pub fn max_distance_sq(&self, other: &Self, scales: &[T]) -> T {
        let mut sum = T::zero();
        for (k, &scale) in scales.iter().enumerate() {
            let span = (other.max[k] - self.min[k])
                .abs()
                .max((self.max[k] - other.min[k]).abs())
                * scale;
            sum = sum + span * span;
        }
        sum
    }

    /// Minimum squared scaled distance from the box to a point.
    pub fn min_distance_sq_to_point(&self, point: &[T], scales: &[T]) -> T {
        let mut sum = T::zero();
        for (k, &scale) in scales.iter().enumerate() {
            let x = point[k];
            let gap = (self.min[k] - x).max(x - self.max[k]).max(T::zero()) * scale;
            sum = sum + gap * gap;
        }
        sum
    }

    /// Maximum squared scaled distance from the box to a point.
    pub fn max_distance_sq_to_point(&self, point: &[T], scales: &[T]) -> T {
        let mut sum = T::zero();
        for (k, &scale) in scales.iter().enumerate() {
            let x = point[k];
            let span = (x - self.min[k]).abs().max((self.max[k] - x).abs()) * scale;
            sum = sum + span * span;
        }
        sum
    }

    /// Squared scaled distance between the two box centres.
    pub fn centre_distance_sq(&self, other: &Self, scales: &[T]) -> T {
        let two = T::one() + T::one();
        let mut sum = T::zero();
        for (k, &scale) in scales.iter().enumerate() {
            let diff = ((self.min[k] + self.max[k]) - (other.min[k] + other.max[k])) / two * scale;
            sum = sum + diff * diff;
        }
        sum
    }
}
