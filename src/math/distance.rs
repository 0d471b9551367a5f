//! Bandwidth-scaled distances.
//!
//! ## Purpose
//!
//! This module provides the distance used by every kernel evaluation: the
//! Euclidean distance after dividing each coordinate difference by that
//! dimension's bandwidth. A scalar bandwidth is the special case of equal
//! per-dimension bandwidths.
//!
//! ## Design notes
//!
//! * **Inverse scales**: Bandwidths are inverted once so the hot loop only
//!   multiplies.
//! * **Squared comparisons**: Box bounds work on squared distances; the square
//!   root is taken once per kernel query.
//!
//! ## Invariants
//!
//! * Distance is always non-negative.
//! * `scales.len()` equals the number of dimensions.
//!
//! ## Non-goals
//!
//! * This module does not evaluate kernels.
//! * Metrics other than the scaled Euclidean distance are not provided.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// ============================================================================
// Scaled Euclidean Metric
// ============================================================================

/// Euclidean distance with per-dimension inverse bandwidths.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledMetric<T> {
    scales: Vec<T>,
}

impl<T: Float> ScaledMetric<T> {
    /// Build the metric from bandwidths.
    ///
    /// A single bandwidth is broadcast to all `dimensions`.
    pub fn from_bandwidths(bandwidths: &[T], dimensions: usize) -> Self {
        let scales = if bandwidths.len() == 1 {
            vec![T::one() / bandwidths[0]; dimensions]
        } else {
            bandwidths.iter().map(|&h| T::one() / h).collect()
        };
        Self { scales }
    }

    /// Inverse bandwidth per dimension.
    #[inline]
    pub fn scales(&self) -> &[T] {
        &self.scales
    }

    /// Squared scaled distance between two points.
    #[inline]
    pub fn distance_squared(&self, a: &[T], b: &[T]) -> T {
        debug_assert_eq!(a.len(), b.len());
        debug_assert_eq!(a.len(), self.scales.len());

        a.iter()
            .zip(b.iter())
            .zip(self.scales.iter())
            .map(|((&ai, &bi), &scale)| {
                let diff = (ai - bi) * scale;
                diff * diff
            })
            .fold(T::zero(), |acc, x| acc + x)
    }

    /// Scaled distance between two points.
    #[inline]
    pub fn distance(&self, a: &[T], b: &[T]) -> T {
        self.distance_squared(a, b).sqrt()
    }
}
