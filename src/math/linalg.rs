//! Linear algebra backend for the local solves.
//!
//! ## Purpose
//!
//! This module solves the small dense normal-equation systems produced for
//! every query point, and reports failure instead of returning an unreliable
//! solution when the system is ill-conditioned.
//!
//! ## Design notes
//!
//! * **Jacobi equilibration**: The matrix is scaled symmetrically by the
//!   inverse square roots of its diagonal before factorization, so the
//!   condition check is insensitive to the scale of each monomial.
//! * **SVD**: The scaled system is solved by singular value decomposition; the
//!   reciprocal condition number is the ratio of the extreme singular values.
//! * Generic over `FloatLinalg` types (f32 and f64) which delegate to nalgebra.
//!
//! ## Invariants
//!
//! * A returned solution is finite.
//! * `None` is returned when any diagonal entry is non-positive, the
//!   reciprocal condition number is below the tolerance, or the solve fails.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::fmt::Debug;
use num_traits::Float;

// ============================================================================
// FloatLinalg Trait
// ============================================================================

/// Helper trait to bridge generic Float types to the nalgebra backend.
pub trait FloatLinalg: Float + Debug + Send + Sync + 'static {
    /// Solve the symmetric system `a x = b` (`a` column-major, `n x n`).
    ///
    /// Returns `None` if the equilibrated system's reciprocal condition
    /// number is below `rcond`.
    fn solve_conditioned(a: &[Self], b: &[Self], n: usize, rcond: Self) -> Option<Vec<Self>>;

    /// Default conditioning tolerance, the square root of machine epsilon.
    fn default_condition_tolerance() -> Self {
        Self::epsilon().sqrt()
    }
}

impl FloatLinalg for f64 {
    #[inline]
    fn solve_conditioned(a: &[Self], b: &[Self], n: usize, rcond: Self) -> Option<Vec<Self>> {
        nalgebra_backend::solve_conditioned_f64(a, b, n, rcond)
    }
}

impl FloatLinalg for f32 {
    #[inline]
    fn solve_conditioned(a: &[Self], b: &[Self], n: usize, rcond: Self) -> Option<Vec<Self>> {
        nalgebra_backend::solve_conditioned_f32(a, b, n, rcond)
    }
}

// ============================================================================
// Nalgebra Backend Implementation
// ============================================================================

/// Nalgebra-based linear algebra operations.
pub mod nalgebra_backend {
    use super::*;
    use nalgebra::{DMatrix, DVector};

    /// Solve an equilibrated symmetric system using f64 precision.
    pub fn solve_conditioned_f64(
        xtw_x: &[f64],
        xtw_y: &[f64],
        n_coeffs: usize,
        rcond: f64,
    ) -> Option<Vec<f64>> {
        let mut scale = Vec::with_capacity(n_coeffs);
        for i in 0..n_coeffs {
            let diag = xtw_x[i * n_coeffs + i];
            if !(diag > 0.0) || !diag.is_finite() {
                return None;
            }
            scale.push(1.0 / Float::sqrt(diag));
        }

        let matrix = DMatrix::from_fn(n_coeffs, n_coeffs, |i, j| {
            xtw_x[j * n_coeffs + i] * scale[i] * scale[j]
        });
        let rhs = DVector::from_fn(n_coeffs, |i, _| xtw_y[i] * scale[i]);

        let svd = matrix.svd(true, true);
        let largest = svd.singular_values.iter().fold(0.0_f64, |m, &s| m.max(s));
        let smallest = svd
            .singular_values
            .iter()
            .fold(f64::INFINITY, |m, &s| m.min(s));
        if !(largest > 0.0) || smallest / largest < rcond {
            return None;
        }

        let z: DVector<f64> = svd.solve(&rhs, 0.0).ok()?;
        let solution: Vec<f64> = z.iter().zip(scale.iter()).map(|(&v, &s)| v * s).collect();

        if solution.iter().all(|v| v.is_finite()) {
            Some(solution)
        } else {
            None
        }
    }

    /// Solve an equilibrated symmetric system using f32 precision.
    pub fn solve_conditioned_f32(
        xtw_x: &[f32],
        xtw_y: &[f32],
        n_coeffs: usize,
        rcond: f32,
    ) -> Option<Vec<f32>> {
        let mut scale = Vec::with_capacity(n_coeffs);
        for i in 0..n_coeffs {
            let diag = xtw_x[i * n_coeffs + i];
            if !(diag > 0.0) || !diag.is_finite() {
                return None;
            }
            scale.push(1.0 / Float::sqrt(diag));
        }

        let matrix = DMatrix::from_fn(n_coeffs, n_coeffs, |i, j| {
            xtw_x[j * n_coeffs + i] * scale[i] * scale[j]
        });
        let rhs = DVector::from_fn(n_coeffs, |i, _| xtw_y[i] * scale[i]);

        let svd = matrix.svd(true, true);
        let largest = svd.singular_values.iter().fold(0.0_f32, |m, &s| m.max(s));
        let smallest = svd
            .singular_values
            .iter()
            .fold(f32::INFINITY, |m, &s| m.min(s));
        if !(largest > 0.0) || smallest / largest < rcond {
            return None;
        }

        let z: DVector<f32> = svd.solve(&rhs, 0.0).ok()?;
        let solution: Vec<f32> = z.iter().zip(scale.iter()).map(|(&v, &s)| v * s).collect();

        if solution.iter().all(|v| v.is_finite()) {
            Some(solution)
        } else {
            None
        }
    }
}
