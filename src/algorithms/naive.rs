//! Brute-force local polynomial regression.
//!
//! ## Purpose
//!
//! This module evaluates the kernel between every query and every reference
//! point and solves each query's normal equations with the same
//! `LocalSolver` as the dual-tree path. It is the correctness oracle for the
//! accelerated algorithm and a reasonable choice for small problems.
//!
//! ## Design notes
//!
//! * **Shared pieces**: Accumulation (`NormalEquations::add_point`), the
//!   basis and the solver are the ones the traversal uses, so any
//!   disagreement isolates the traversal.
//! * **Parallel**: With the `parallel` feature, queries are processed with
//!   `par_iter`; each query is independent.
//!
//! ## Non-goals
//!
//! * No pruning or approximation of any kind.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// Internal dependencies
use crate::algorithms::solve::{LocalEstimate, LocalSolver};
use crate::math::distance::ScaledMetric;
use crate::math::kernel::Kernel;
use crate::math::linalg::FloatLinalg;
use crate::math::multi_index::MultiIndexSet;
use crate::primitives::buffer::NormalEquations;

// ============================================================================
// Naive Regression
// ============================================================================

/// Exhaustive evaluation over all query/reference pairs.
pub struct NaiveRegression<'a, T, K: ?Sized> {
    kernel: &'a K,
    metric: &'a ScaledMetric<T>,
    dimensions: usize,
    references: &'a [T],
    targets: &'a [T],
    weights: &'a [T],
    basis: &'a MultiIndexSet,
}

impl<'a, T: FloatLinalg, K: Kernel<T> + ?Sized> NaiveRegression<'a, T, K> {
    /// Prepare the oracle.
    pub fn new(
        kernel: &'a K,
        metric: &'a ScaledMetric<T>,
        basis: &'a MultiIndexSet,
        references: &'a [T],
        targets: &'a [T],
        weights: &'a [T],
    ) -> Self {
        Self {
            kernel,
            metric,
            dimensions: basis.dimensions(),
            references,
            targets,
            weights,
            basis,
        }
    }

    /// Exact normal equations of one query, in monomials of `r − query`.
    pub fn equations(&self, query: &[T]) -> NormalEquations<T> {
        let mut equations = NormalEquations::new(self.basis.len());
        let mut delta = vec![T::zero(); self.dimensions];
        let mut values = vec![T::zero(); self.basis.len()];

        for (i, point) in self.references.chunks_exact(self.dimensions).enumerate() {
            let distance = self.metric.distance(query, point);
            let w = self.kernel.evaluate(distance) * self.weights[i];
            if w > T::zero() {
                for ((d, &r), &q) in delta.iter_mut().zip(point).zip(query) {
                    *d = r - q;
                }
                self.basis.evaluate(&delta, &mut values);
                equations.add_point(w, &values, self.targets[i]);
            }
        }

        equations
    }

    /// Solve every query (flattened), in input order.
    pub fn fit(
        &self,
        queries: &[T],
        solver: &LocalSolver<'_, T>,
        parallel: bool,
    ) -> Vec<LocalEstimate<T>> {
        let solve_one = |query: &[T]| solver.solve(&self.equations(query), query);

        #[cfg(feature = "parallel")]
        {
            if parallel {
                return queries
                    .par_chunks_exact(self.dimensions)
                    .map(solve_one)
                    .collect();
            }
        }
        #[cfg(not(feature = "parallel"))]
        let _ = parallel;

        queries.chunks_exact(self.dimensions).map(solve_one).collect()
    }
}
