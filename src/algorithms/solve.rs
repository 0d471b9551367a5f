//! Local weighted least-squares solve.
//!
//! ## Purpose
//!
//! This module turns one query point's accumulated normal equations into a
//! local polynomial fit, or a documented fallback value when the fit is not
//! identifiable.
//!
//! ## Design notes
//!
//! * **Query-centred frame**: Each query's system is accumulated in
//!   monomials of `r − q`. The solution is therefore already the Taylor
//!   expansion at the query, `p(x) = Σ β[α] (x − q)^α`, and conditioning
//!   does not depend on where the query sits. Coefficients in the caller's
//!   frame are recovered with a Taylor shift by `−q`.
//! * **Degeneracy is data**: No-support and singular systems produce a
//!   `Degenerate` estimate with a fallback value, never an error.
//!
//! ## Key concepts
//!
//! * **Coefficients**: Polynomial coefficients in the global monomial basis,
//!   in the caller's frame.
//! * **Local coefficients**: Taylor coefficients of the fitted polynomial at
//!   the query. Entry 0 is the point estimate; the entries at unit
//!   multi-indices are the first partial derivatives.
//!
//! ## Invariants
//!
//! * A system whose kernel-weight sum is not positive yields
//!   `Degeneracy::NoKernelSupport`.
//! * A system that fails the conditioning check yields
//!   `Degeneracy::SingularSystem` with the weighted average `Σwy / Σw`.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::math::linalg::FloatLinalg;
use crate::math::multi_index::MultiIndexSet;
use crate::primitives::buffer::NormalEquations;

// ============================================================================
// Polynomial Degree
// ============================================================================

/// Polynomial degree for local regression fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolynomialDegree {
    /// Degree 0: Local constant (weighted mean)
    Constant,

    /// Degree 1: Local linear regression (default)
    #[default]
    Linear,

    /// Degree 2: Local quadratic regression
    Quadratic,

    /// Degree 3: Local cubic regression
    Cubic,

    /// Degree 4: Local quartic regression
    Quartic,

    /// Any other degree. Cost grows with the `2p` moment set, which the
    /// builder caps.
    Degree(usize),
}

impl PolynomialDegree {
    /// Get the numeric degree value.
    #[inline]
    pub const fn value(&self) -> usize {
        match self {
            PolynomialDegree::Constant => 0,
            PolynomialDegree::Linear => 1,
            PolynomialDegree::Quadratic => 2,
            PolynomialDegree::Cubic => 3,
            PolynomialDegree::Quartic => 4,
            PolynomialDegree::Degree(p) => *p,
        }
    }

    /// Number of coefficients for an nD polynomial of this degree.
    #[inline]
    pub const fn num_coefficients_nd(&self, dimensions: usize) -> usize {
        MultiIndexSet::num_terms(dimensions, self.value())
    }

    /// Number of moments per reference node (terms of twice this degree).
    #[inline]
    pub const fn num_moments_nd(&self, dimensions: usize) -> usize {
        MultiIndexSet::num_terms(dimensions, 2 * self.value())
    }
}

// ============================================================================
// Fallback Policy and Degeneracy
// ============================================================================

/// Value reported for queries with no kernel support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ZeroWeightFallback {
    /// Weighted mean of all reference targets (default).
    #[default]
    UseGlobalMean,

    /// Zero.
    ReturnZero,
}

/// Why a query could not be solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Degeneracy {
    /// The local system is rank-deficient or ill-conditioned.
    SingularSystem,

    /// No reference point receives a positive kernel weight.
    NoKernelSupport,
}

// ============================================================================
// Local Fit and Estimate
// ============================================================================

/// A solved local polynomial.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalFit<T> {
    /// Coefficients in the global monomial basis, caller's frame.
    pub coefficients: Vec<T>,

    /// Taylor coefficients at the query point.
    pub local_coefficients: Vec<T>,

    /// Accumulated kernel-weight sum.
    pub weight_sum: T,

    /// Number of dimensions.
    pub dimensions: usize,
}

impl<T: Float> LocalFit<T> {
    /// Fitted value at the query point.
    #[inline]
    pub fn estimate(&self) -> T {
        self.local_coefficients[0]
    }

    /// First partial derivatives at the query point, `None` for degree 0.
    pub fn gradient(&self) -> Option<&[T]> {
        self.local_coefficients.get(1..=self.dimensions)
    }
}

/// Per-query outcome.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocalEstimate<T> {
    /// The local system was solved.
    Solved(LocalFit<T>),

    /// The local system could not be solved; `value` is the fallback estimate.
    Degenerate {
        /// Cause of the failure.
        reason: Degeneracy,
        /// Fallback estimate.
        value: T,
    },
}

impl<T: Float> LocalEstimate<T> {
    /// Point estimate (fitted or fallback).
    #[inline]
    pub fn value(&self) -> T {
        match self {
            LocalEstimate::Solved(fit) => fit.estimate(),
            LocalEstimate::Degenerate { value, .. } => *value,
        }
    }

    /// Returns `true` if the query fell back.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, LocalEstimate::Degenerate { .. })
    }

    /// The solved fit, if any.
    pub fn fit(&self) -> Option<&LocalFit<T>> {
        match self {
            LocalEstimate::Solved(fit) => Some(fit),
            LocalEstimate::Degenerate { .. } => None,
        }
    }

    /// The degeneracy reason, if any.
    pub fn degeneracy(&self) -> Option<Degeneracy> {
        match self {
            LocalEstimate::Solved(_) => None,
            LocalEstimate::Degenerate { reason, .. } => Some(*reason),
        }
    }
}

// ============================================================================
// Local Solver
// ============================================================================

/// Solves accumulated normal equations into local estimates.
#[derive(Debug, Clone)]
pub struct LocalSolver<'a, T> {
    basis: &'a MultiIndexSet,
    condition_tolerance: T,
    fallback: ZeroWeightFallback,
    global_mean: T,
}

impl<'a, T: FloatLinalg> LocalSolver<'a, T> {
    /// Create a solver for systems accumulated in monomials of `r − q`.
    ///
    /// `global_mean` is the weighted mean of all reference targets.
    pub fn new(
        basis: &'a MultiIndexSet,
        condition_tolerance: T,
        fallback: ZeroWeightFallback,
        global_mean: T,
    ) -> Self {
        Self {
            basis,
            condition_tolerance,
            fallback,
            global_mean,
        }
    }

    /// Fallback value for a query without kernel support.
    #[inline]
    pub fn no_support_value(&self) -> T {
        match self.fallback {
            ZeroWeightFallback::UseGlobalMean => self.global_mean,
            ZeroWeightFallback::ReturnZero => T::zero(),
        }
    }

    /// Solve one query's system, centred on `query`.
    pub fn solve(&self, equations: &NormalEquations<T>, query: &[T]) -> LocalEstimate<T> {
        let weight_sum = equations.weight_sum();

        if !(weight_sum > T::min_positive_value()) {
            return LocalEstimate::Degenerate {
                reason: Degeneracy::NoKernelSupport,
                value: self.no_support_value(),
            };
        }

        let n = equations.n_coeffs;
        let Some(local) = T::solve_conditioned(
            &equations.xtw_x,
            &equations.xtw_y,
            n,
            self.condition_tolerance,
        ) else {
            return LocalEstimate::Degenerate {
                reason: Degeneracy::SingularSystem,
                value: equations.xtw_y[0] / weight_sum,
            };
        };

        let back: Vec<T> = query.iter().map(|&x| -x).collect();
        LocalEstimate::Solved(LocalFit {
            coefficients: self.basis.taylor_shift(&local, &back),
            local_coefficients: local,
            weight_sum,
            dimensions: self.basis.dimensions(),
        })
    }
}
