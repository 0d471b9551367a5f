//! High-level API for dual-tree local polynomial regression.
//!
//! ## Purpose
//!
//! This module provides the primary user-facing entry point. It implements a
//! fluent builder for configuring the regression and produces a validated,
//! reusable `LprModel`.
//!
//! ## Design notes
//!
//! * **Ergonomic**: Fluent builder with sensible defaults for all parameters.
//! * **Validated**: All parameters are validated when `.build()` is called.
//! * **Strict**: Setting a parameter twice is reported as an error instead of
//!   silently keeping the last value.
//! * **Type-Safe**: Generic over `Float` types for flexible precision.
//!
//! ## Key concepts
//!
//! ### Configuration Flow
//!
//! 1. Create a [`LprBuilder`] via `Lpr::new()`.
//! 2. Chain configuration methods (`.bandwidth()`, `.degree()`, etc.).
//! 3. Call `.build()?` to get an [`LprModel`].
//! 4. Call `.fit(...)` as many times as needed.
//!
//! ### Defaults
//!
//! | Parameter            | Default             |
//! |----------------------|---------------------|
//! | dimensions           | 1                   |
//! | bandwidth            | 1.0                 |
//! | degree               | Linear              |
//! | kernel               | Epanechnikov        |
//! | pruning_mode         | QuickPlusRelative   |
//! | absolute_tolerance   | 0                   |
//! | relative_tolerance   | 0.01                |
//! | leaf_size            | 32                  |
//! | condition_tolerance  | sqrt(epsilon)       |
//! | zero_weight_fallback | UseGlobalMean       |
//! | parallel             | true                |

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// Internal dependencies
use crate::engine::executor::LprExecutor;
use crate::engine::validator::Validator;

// Publicly re-exported types
pub use crate::algorithms::pruning::PruningMode;
pub use crate::algorithms::solve::{
    Degeneracy, LocalEstimate, LocalFit, PolynomialDegree, ZeroWeightFallback,
};
pub use crate::engine::executor::LprConfig;
pub use crate::engine::output::LprResult;
pub use crate::engine::traversal::TraversalStats;
pub use crate::math::kernel::{Kernel, WeightFunction};
pub use crate::math::linalg::FloatLinalg;
pub use crate::primitives::errors::LprError;

// ============================================================================
// Builder
// ============================================================================

/// Fluent builder for configuring a local polynomial regression.
#[derive(Debug, Clone)]
pub struct LprBuilder<T: FloatLinalg> {
    /// Number of predictor dimensions (default: 1).
    pub dimensions: Option<usize>,

    /// Bandwidths, one shared value or one per dimension (default: 1.0).
    pub bandwidths: Option<Vec<T>>,

    /// Polynomial degree for local regression (default: Linear).
    pub polynomial_degree: Option<PolynomialDegree>,

    /// Kernel weight function (default: Epanechnikov).
    pub weight_function: Option<WeightFunction>,

    /// Error-budget rule (default: QuickPlusRelative).
    pub pruning_mode: Option<PruningMode>,

    /// Absolute kernel-weight-sum tolerance (default: 0).
    pub absolute_tolerance: Option<T>,

    /// Relative kernel-weight-sum tolerance (default: 0.01).
    pub relative_tolerance: Option<T>,

    /// Maximum points per tree leaf (default: 32).
    pub leaf_size: Option<usize>,

    /// Reciprocal condition number threshold (default: sqrt(epsilon)).
    pub condition_tolerance: Option<T>,

    /// Behavior for queries with no kernel support (default: UseGlobalMean).
    pub zero_weight_fallback: Option<ZeroWeightFallback>,

    /// Parallel execution hint (default: true).
    pub parallel: Option<bool>,

    /// Tracks if any parameter was set multiple times (for validation).
    #[doc(hidden)]
    pub duplicate_param: Option<&'static str>,
}

impl<T: FloatLinalg> Default for LprBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatLinalg> LprBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            dimensions: None,
            bandwidths: None,
            polynomial_degree: None,
            weight_function: None,
            pruning_mode: None,
            absolute_tolerance: None,
            relative_tolerance: None,
            leaf_size: None,
            condition_tolerance: None,
            zero_weight_fallback: None,
            parallel: None,
            duplicate_param: None,
        }
    }

    /// Set the number of predictor dimensions.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        if self.dimensions.is_some() {
            self.duplicate_param = Some("dimensions");
        }
        self.dimensions = Some(dimensions);
        self
    }

    /// Set one bandwidth shared by all dimensions.
    pub fn bandwidth(mut self, bandwidth: T) -> Self {
        if self.bandwidths.is_some() {
            self.duplicate_param = Some("bandwidth");
        }
        self.bandwidths = Some(vec![bandwidth]);
        self
    }

    /// Set one bandwidth per dimension.
    pub fn bandwidths(mut self, bandwidths: Vec<T>) -> Self {
        if self.bandwidths.is_some() {
            self.duplicate_param = Some("bandwidth");
        }
        self.bandwidths = Some(bandwidths);
        self
    }

    /// Set the polynomial degree for local regression.
    ///
    /// - `Constant` (degree 0): Kernel-weighted mean
    /// - `Linear` (degree 1, default): Local linear fit, design-adaptive at boundaries
    /// - `Quadratic` and above: Better for curved regions, more moments per node
    /// - `Degree(p)`: Any other degree, as long as the `2p` moment set stays
    ///   within the validator's limit
    pub fn degree(mut self, degree: PolynomialDegree) -> Self {
        if self.polynomial_degree.is_some() {
            self.duplicate_param = Some("degree");
        }
        self.polynomial_degree = Some(degree);
        self
    }

    /// Set the kernel weight function.
    pub fn kernel(mut self, kernel: WeightFunction) -> Self {
        if self.weight_function.is_some() {
            self.duplicate_param = Some("kernel");
        }
        self.weight_function = Some(kernel);
        self
    }

    /// Set the error-budget rule.
    pub fn pruning_mode(mut self, mode: PruningMode) -> Self {
        if self.pruning_mode.is_some() {
            self.duplicate_param = Some("pruning_mode");
        }
        self.pruning_mode = Some(mode);
        self
    }

    /// Set the absolute kernel-weight-sum tolerance.
    pub fn absolute_tolerance(mut self, tolerance: T) -> Self {
        if self.absolute_tolerance.is_some() {
            self.duplicate_param = Some("absolute_tolerance");
        }
        self.absolute_tolerance = Some(tolerance);
        self
    }

    /// Set the relative kernel-weight-sum tolerance.
    pub fn relative_tolerance(mut self, tolerance: T) -> Self {
        if self.relative_tolerance.is_some() {
            self.duplicate_param = Some("relative_tolerance");
        }
        self.relative_tolerance = Some(tolerance);
        self
    }

    /// Set the maximum number of points per tree leaf.
    pub fn leaf_size(mut self, leaf_size: usize) -> Self {
        if self.leaf_size.is_some() {
            self.duplicate_param = Some("leaf_size");
        }
        self.leaf_size = Some(leaf_size);
        self
    }

    /// Set the reciprocal condition number below which a local system is singular.
    pub fn condition_tolerance(mut self, tolerance: T) -> Self {
        if self.condition_tolerance.is_some() {
            self.duplicate_param = Some("condition_tolerance");
        }
        self.condition_tolerance = Some(tolerance);
        self
    }

    /// Set behavior for queries with no kernel support.
    pub fn zero_weight_fallback(mut self, policy: ZeroWeightFallback) -> Self {
        if self.zero_weight_fallback.is_some() {
            self.duplicate_param = Some("zero_weight_fallback");
        }
        self.zero_weight_fallback = Some(policy);
        self
    }

    /// Enable or disable parallel execution.
    ///
    /// Has no effect without the `parallel` feature.
    pub fn parallel(mut self, parallel: bool) -> Self {
        if self.parallel.is_some() {
            self.duplicate_param = Some("parallel");
        }
        self.parallel = Some(parallel);
        self
    }

    /// Validate the configuration and build a model.
    pub fn build(self) -> Result<LprModel<T>, LprError> {
        // Check for duplicate parameter configuration
        Validator::validate_no_duplicates(self.duplicate_param)?;

        let defaults = LprConfig::<T>::default();
        let config = LprConfig {
            dimensions: self.dimensions.unwrap_or(defaults.dimensions),
            bandwidths: self.bandwidths.unwrap_or(defaults.bandwidths),
            degree: self.polynomial_degree.unwrap_or(defaults.degree),
            weight_function: self.weight_function.unwrap_or(defaults.weight_function),
            pruning_mode: self.pruning_mode.unwrap_or(defaults.pruning_mode),
            absolute_tolerance: self
                .absolute_tolerance
                .unwrap_or(defaults.absolute_tolerance),
            relative_tolerance: self
                .relative_tolerance
                .unwrap_or(defaults.relative_tolerance),
            leaf_size: self.leaf_size.unwrap_or(defaults.leaf_size),
            condition_tolerance: self
                .condition_tolerance
                .unwrap_or(defaults.condition_tolerance),
            zero_weight_fallback: self
                .zero_weight_fallback
                .unwrap_or(defaults.zero_weight_fallback),
            parallel: self.parallel.unwrap_or(defaults.parallel),
        };

        config.validate()?;

        Ok(LprModel {
            executor: LprExecutor::from_config(config),
        })
    }
}

// ============================================================================
// Model
// ============================================================================

/// A validated regression configuration, ready to fit.
///
/// Point sets are flattened row-major: point `i` occupies
/// `[i * dimensions, (i + 1) * dimensions)`.
#[derive(Debug, Clone)]
pub struct LprModel<T: FloatLinalg> {
    executor: LprExecutor<T>,
}

impl<T: FloatLinalg> LprModel<T> {
    /// The validated configuration.
    pub fn config(&self) -> &LprConfig<T> {
        self.executor.config()
    }

    /// Fit with unit reference weights and evaluate at `queries`.
    pub fn fit(
        &self,
        references: &[T],
        targets: &[T],
        queries: &[T],
    ) -> Result<LprResult<T>, LprError> {
        let kernel = self.config().weight_function;
        self.executor
            .run(&kernel, references, targets, None, queries)
    }

    /// Fit with per-reference weights and evaluate at `queries`.
    pub fn fit_weighted(
        &self,
        references: &[T],
        targets: &[T],
        weights: &[T],
        queries: &[T],
    ) -> Result<LprResult<T>, LprError> {
        let kernel = self.config().weight_function;
        self.executor
            .run(&kernel, references, targets, Some(weights), queries)
    }

    /// Fit with a caller-supplied kernel.
    ///
    /// The kernel's `bound` must bracket its values over any distance range,
    /// or the error guarantee of pruning does not hold.
    pub fn fit_with_kernel<K: Kernel<T> + ?Sized>(
        &self,
        kernel: &K,
        references: &[T],
        targets: &[T],
        weights: Option<&[T]>,
        queries: &[T],
    ) -> Result<LprResult<T>, LprError> {
        self.executor
            .run(kernel, references, targets, weights, queries)
    }

    /// Brute-force fit with the configured kernel and unit weights.
    ///
    /// Evaluates every query/reference pair; intended for validation and
    /// small problems.
    pub fn fit_naive(
        &self,
        references: &[T],
        targets: &[T],
        queries: &[T],
    ) -> Result<LprResult<T>, LprError> {
        let kernel = self.config().weight_function;
        self.executor
            .run_naive(&kernel, references, targets, None, queries)
    }

    /// Brute-force fit with a caller-supplied kernel and optional weights.
    pub fn fit_naive_with_kernel<K: Kernel<T> + ?Sized>(
        &self,
        kernel: &K,
        references: &[T],
        targets: &[T],
        weights: Option<&[T]>,
        queries: &[T],
    ) -> Result<LprResult<T>, LprError> {
        self.executor
            .run_naive(kernel, references, targets, weights, queries)
    }
}
