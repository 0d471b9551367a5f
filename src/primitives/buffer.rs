//! Accumulation buffers for weighted normal equations.
//!
//! ## Purpose
//!
//! This module provides `NormalEquations`, the sufficient statistics of a
//! weighted least-squares fit: the normal matrix `XᵀWX` and the right-hand
//! side `XᵀWy`. One buffer per query point collects its exact contributions
//! and its share of the pruned ones; the brute-force oracle fills the same
//! buffer.
//!
//! ## Design notes
//!
//! * **Dense storage**: The matrix is stored as a full `n x n` column-major
//!   slice, matching what the linear algebra backend consumes directly.
//! * **Two entry points**: Exact contributions enter one reference point at a
//!   time (`add_point`); pruned contributions enter as a scaled moment set
//!   (`add_moments`) through a precomputed sum table.
//!
//! ## Invariants
//!
//! * `xtw_x.len() == n_coeffs * n_coeffs` and `xtw_y.len() == n_coeffs`.
//! * `xtw_x[0]` is the accumulated kernel-weight sum.
//!
//! ## Non-goals
//!
//! * This module does not solve the system (see `math::linalg`).

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// ============================================================================
// Normal Equations
// ============================================================================

/// Weighted normal equations `XᵀWX β = XᵀWy` in a fixed monomial basis.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalEquations<T> {
    /// Normal matrix, column-major, `n_coeffs x n_coeffs`.
    pub xtw_x: Vec<T>,

    /// Right-hand side, length `n_coeffs`.
    pub xtw_y: Vec<T>,

    /// Number of basis functions.
    pub n_coeffs: usize,
}

impl<T: Float> NormalEquations<T> {
    /// Create an all-zero system for `n_coeffs` basis functions.
    pub fn new(n_coeffs: usize) -> Self {
        Self {
            xtw_x: vec![T::zero(); n_coeffs * n_coeffs],
            xtw_y: vec![T::zero(); n_coeffs],
            n_coeffs,
        }
    }

    /// Accumulated kernel-weight sum (`XᵀWX[0,0]`).
    #[inline]
    pub fn weight_sum(&self) -> T {
        self.xtw_x.first().copied().unwrap_or_else(T::zero)
    }

    /// Add one reference point with weight `weight`, basis values `basis`
    /// and target `y`.
    #[inline]
    pub fn add_point(&mut self, weight: T, basis: &[T], y: T) {
        let n = self.n_coeffs;
        debug_assert_eq!(basis.len(), n);

        for j in 0..n {
            let wb = weight * basis[j];
            let col = &mut self.xtw_x[j * n..(j + 1) * n];
            for (i, entry) in col.iter_mut().enumerate() {
                *entry = *entry + wb * basis[i];
            }
            self.xtw_y[j] = self.xtw_y[j] + wb * y;
        }
    }

    /// Add `weight` times a moment set.
    ///
    /// `data` holds weighted monomial sums up to twice the basis degree,
    /// `target` the weighted target sums over the basis, and `sum_table`
    /// maps entry `(i, j)` of the normal matrix to the position of the
    /// summed exponent in `data`.
    #[inline]
    pub fn add_moments(&mut self, weight: T, data: &[T], target: &[T], sum_table: &[usize]) {
        debug_assert_eq!(sum_table.len(), self.xtw_x.len());
        debug_assert_eq!(target.len(), self.n_coeffs);

        for (entry, &k) in self.xtw_x.iter_mut().zip(sum_table.iter()) {
            *entry = *entry + weight * data[k];
        }
        for (entry, &t) in self.xtw_y.iter_mut().zip(target.iter()) {
            *entry = *entry + weight * t;
        }
    }
}
