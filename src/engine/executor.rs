//! Execution engine for local polynomial regression.
//!
//! ## Purpose
//!
//! This module orchestrates one regression run: it validates the inputs,
//! builds the two trees and the moment cache, runs the traversal, settles
//! postponed statistics into the query points, solves every local system,
//! and returns the results in the caller's query order.
//!
//! ## Design notes
//!
//! * **No global origin**: Coordinates are used as given. Every monomial is
//!   formed from an offset inside one node or between a reference and its
//!   query, so accuracy does not depend on where the data sits.
//! * **Shared preparation**: The dual-tree and brute-force paths share the
//!   same validation, basis, metric and solver.
//! * **Parallel solve**: With the `parallel` feature the per-query solves run
//!   under `par_iter`, each on its own system.
//! * Generic over `Float` types to support f32 and f64.
//!
//! ## Key concepts
//!
//! * **Basis set**: Multi-indices of degree `p`; its size is the number of
//!   coefficients.
//! * **Wide set**: Multi-indices of degree `2p`, indexing the node moments.
//!
//! ## Invariants
//!
//! * Trees and moments are built once per run and never mutated afterwards.
//! * Output has exactly one estimate per query, in query order.
//!
//! ## Non-goals
//!
//! * This module does not validate builder parameters (handled by `api`).
//! * This module does not format results (see `output`).

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// Internal dependencies
use crate::algorithms::moments::MomentCache;
use crate::algorithms::naive::NaiveRegression;
use crate::algorithms::pruning::{Pruner, PruningMode};
use crate::algorithms::solve::{
    Degeneracy, LocalEstimate, LocalSolver, PolynomialDegree, ZeroWeightFallback,
};
use crate::engine::accumulator::{settle, QueryAccumulator};
use crate::engine::output::LprResult;
use crate::engine::traversal::{DualTreeTraversal, TraversalStats};
use crate::engine::validator::Validator;
use crate::math::distance::ScaledMetric;
use crate::math::kernel::{Kernel, WeightFunction};
use crate::math::linalg::FloatLinalg;
use crate::math::multi_index::MultiIndexSet;
use crate::math::tree::SpaceTree;
use crate::primitives::buffer::NormalEquations;
use crate::primitives::errors::LprError;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for one regression run.
#[derive(Debug, Clone, PartialEq)]
pub struct LprConfig<T> {
    /// Number of predictor dimensions.
    pub dimensions: usize,

    /// Bandwidths: one shared value, or one per dimension.
    pub bandwidths: Vec<T>,

    /// Local polynomial degree.
    pub degree: PolynomialDegree,

    /// Built-in kernel used by `fit` and `fit_weighted`.
    pub weight_function: WeightFunction,

    /// Error-budget rule.
    pub pruning_mode: PruningMode,

    /// Absolute kernel-weight-sum tolerance.
    pub absolute_tolerance: T,

    /// Relative kernel-weight-sum tolerance.
    pub relative_tolerance: T,

    /// Maximum points per tree leaf.
    pub leaf_size: usize,

    /// Reciprocal condition number below which a local system is singular.
    pub condition_tolerance: T,

    /// Value reported for queries without kernel support.
    pub zero_weight_fallback: ZeroWeightFallback,

    /// Whether to use parallel execution.
    pub parallel: bool,
}

impl<T: FloatLinalg> Default for LprConfig<T> {
    fn default() -> Self {
        Self {
            dimensions: 1,
            bandwidths: vec![T::one()],
            degree: PolynomialDegree::default(),
            weight_function: WeightFunction::default(),
            pruning_mode: PruningMode::default(),
            absolute_tolerance: T::zero(),
            relative_tolerance: T::from(0.01).unwrap_or_else(T::zero),
            leaf_size: 32,
            condition_tolerance: T::default_condition_tolerance(),
            zero_weight_fallback: ZeroWeightFallback::default(),
            parallel: true,
        }
    }
}

impl<T: FloatLinalg> LprConfig<T> {
    /// Validate every parameter.
    pub fn validate(&self) -> Result<(), LprError> {
        Validator::validate_dimensions(self.dimensions)?;
        Validator::validate_bandwidths(&self.bandwidths, self.dimensions)?;
        Validator::validate_degree(self.degree, self.dimensions)?;
        Validator::validate_tolerance(self.absolute_tolerance)?;
        Validator::validate_tolerance(self.relative_tolerance)?;
        Validator::validate_condition_tolerance(self.condition_tolerance)?;
        Validator::validate_leaf_size(self.leaf_size)?;
        Ok(())
    }
}

// ============================================================================
// Prepared Problem
// ============================================================================

/// Validated weights plus the pieces both paths share.
struct Prepared<T> {
    weights: Vec<T>,
    metric: ScaledMetric<T>,
    basis: MultiIndexSet,
    global_mean: T,
}

// ============================================================================
// Executor
// ============================================================================

/// Runs regressions for a fixed configuration.
#[derive(Debug, Clone)]
pub struct LprExecutor<T> {
    config: LprConfig<T>,
}

impl<T: FloatLinalg> LprExecutor<T> {
    /// Create an executor from a configuration.
    pub fn from_config(config: LprConfig<T>) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &LprConfig<T> {
        &self.config
    }

    fn prepare(
        &self,
        references: &[T],
        targets: &[T],
        weights: Option<&[T]>,
        queries: &[T],
    ) -> Result<Prepared<T>, LprError> {
        let d = self.config.dimensions;
        self.config.validate()?;
        Validator::validate_inputs(references, targets, weights, queries, d)?;

        let weights: Vec<T> = match weights {
            Some(w) => w.to_vec(),
            None => vec![T::one(); targets.len()],
        };

        let total = weights.iter().fold(T::zero(), |acc, &w| acc + w);
        let weighted = weights
            .iter()
            .zip(targets.iter())
            .fold(T::zero(), |acc, (&w, &y)| acc + w * y);

        Ok(Prepared {
            weights,
            metric: ScaledMetric::from_bandwidths(&self.config.bandwidths, d),
            basis: MultiIndexSet::new(d, self.config.degree.value()),
            global_mean: weighted / total,
        })
    }

    /// Run the dual-tree regression with `kernel`.
    pub fn run<K: Kernel<T> + ?Sized>(
        &self,
        kernel: &K,
        references: &[T],
        targets: &[T],
        weights: Option<&[T]>,
        queries: &[T],
    ) -> Result<LprResult<T>, LprError> {
        let prepared = self.prepare(references, targets, weights, queries)?;
        let config = &self.config;
        let d = config.dimensions;

        tracing::debug!(
            target: "lpr",
            references = targets.len(),
            queries = queries.len() / d,
            dimensions = d,
            degree = config.degree.value(),
            kernel = kernel.name(),
            mode = config.pruning_mode.name(),
            "fit_started"
        );

        // Trees and moments
        let wide = MultiIndexSet::new(d, 2 * config.degree.value());
        let sum_table = prepared
            .basis
            .sum_table(&wide)
            .ok_or(LprError::InvalidDegree(config.degree.value()))?;

        let reference_tree = SpaceTree::new(references, d, config.leaf_size);
        let query_tree = SpaceTree::new(queries, d, config.leaf_size);
        let tree_targets = reference_tree.permute(targets);
        let tree_weights = reference_tree.permute(&prepared.weights);

        tracing::trace!(
            target: "lpr",
            reference_nodes = reference_tree.nodes().len(),
            reference_depth = reference_tree.depth(),
            query_nodes = query_tree.nodes().len(),
            query_depth = query_tree.depth(),
            "trees_built"
        );

        let basis_len = prepared.basis.len();
        let moments = MomentCache::new(
            &reference_tree,
            &tree_targets,
            &tree_weights,
            &wide,
            basis_len,
        );

        // Traversal
        let total_weight = moments.get(reference_tree.root()).total_weight();
        let pruner = Pruner::new(
            kernel,
            prepared.metric.scales(),
            config.pruning_mode,
            config.absolute_tolerance,
            config.relative_tolerance,
            config.leaf_size,
            total_weight,
        );
        let traversal = DualTreeTraversal::new(
            &query_tree,
            &reference_tree,
            &moments,
            pruner,
            kernel,
            &prepared.metric,
            &prepared.basis,
            &wide,
            &tree_targets,
            &tree_weights,
            config.parallel,
        );

        let mut states =
            vec![QueryAccumulator::new(wide.len(), basis_len); query_tree.nodes().len()];
        let mut points = vec![NormalEquations::new(basis_len); query_tree.len()];
        let stats = traversal.run(&mut states, &mut points);

        let incomplete = settle(
            &query_tree,
            &wide,
            &sum_table,
            &mut states,
            &mut points,
            total_weight,
        );
        if incomplete > 0 {
            tracing::warn!(target: "lpr", incomplete, "unresolved_query_leaves");
        }

        // Local solves
        let solver = LocalSolver::new(
            &prepared.basis,
            config.condition_tolerance,
            config.zero_weight_fallback,
            prepared.global_mean,
        );
        let tree_estimates = self.solve_all(&solver, &points, &query_tree);

        let mut ordered: Vec<Option<LocalEstimate<T>>> = (0..query_tree.len()).map(|_| None).collect();
        for (pos, estimate) in tree_estimates.into_iter().enumerate() {
            ordered[query_tree.original_index(pos)] = Some(estimate);
        }
        let estimates: Vec<LocalEstimate<T>> = ordered.into_iter().flatten().collect();

        Ok(self.finish(estimates, queries, kernel.name(), Some(config.pruning_mode), stats))
    }

    /// Run the brute-force regression with `kernel`.
    pub fn run_naive<K: Kernel<T> + ?Sized>(
        &self,
        kernel: &K,
        references: &[T],
        targets: &[T],
        weights: Option<&[T]>,
        queries: &[T],
    ) -> Result<LprResult<T>, LprError> {
        let prepared = self.prepare(references, targets, weights, queries)?;

        tracing::debug!(
            target: "lpr",
            references = targets.len(),
            queries = queries.len() / self.config.dimensions,
            degree = self.config.degree.value(),
            kernel = kernel.name(),
            "naive_fit_started"
        );

        let solver = LocalSolver::new(
            &prepared.basis,
            self.config.condition_tolerance,
            self.config.zero_weight_fallback,
            prepared.global_mean,
        );
        let naive = NaiveRegression::new(
            kernel,
            &prepared.metric,
            &prepared.basis,
            references,
            targets,
            &prepared.weights,
        );
        let estimates = naive.fit(queries, &solver, self.config.parallel);

        Ok(self.finish(
            estimates,
            queries,
            kernel.name(),
            None,
            TraversalStats::default(),
        ))
    }

    /// Solve every query system, in tree order.
    fn solve_all(
        &self,
        solver: &LocalSolver<'_, T>,
        points: &[NormalEquations<T>],
        query_tree: &SpaceTree<T>,
    ) -> Vec<LocalEstimate<T>> {
        let solve_one = |(pos, equations): (usize, &NormalEquations<T>)| {
            solver.solve(equations, query_tree.point(pos))
        };

        #[cfg(feature = "parallel")]
        {
            if self.config.parallel {
                return points.par_iter().enumerate().map(solve_one).collect();
            }
        }

        points.iter().enumerate().map(solve_one).collect()
    }

    fn finish(
        &self,
        estimates: Vec<LocalEstimate<T>>,
        queries: &[T],
        kernel: &'static str,
        pruning_mode: Option<PruningMode>,
        stats: TraversalStats,
    ) -> LprResult<T> {
        let values: Vec<T> = estimates.iter().map(|e| e.value()).collect();

        let result = LprResult {
            estimates,
            values,
            queries: queries.to_vec(),
            dimensions: self.config.dimensions,
            degree: self.config.degree,
            kernel,
            pruning_mode,
            stats,
        };

        let singular = result.count_degenerate(Degeneracy::SingularSystem);
        let unsupported = result.count_degenerate(Degeneracy::NoKernelSupport);
        if singular + unsupported > 0 {
            tracing::warn!(
                target: "lpr",
                singular,
                unsupported,
                "degenerate_queries"
            );
        }

        result
    }
}
