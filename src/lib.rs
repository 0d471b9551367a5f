//! # Dual-Tree Local Polynomial Regression for Rust
//!
//! Local Polynomial Regression (LPR) with dual-tree acceleration: kernel
//! sums over whole groups of reference points are approximated from
//! precomputed moments, under a user-controlled error tolerance.
//!
//! ## What is Local Polynomial Regression?
//!
//! At each query point `q`, LPR fits a polynomial of degree `p` to the
//! reference points by weighted least squares, with weights given by a
//! kernel of the bandwidth-scaled distance to `q`:
//!
//! ```text
//! minimize  Σ_r  K(‖(q − r) / h‖) · ω_r · (y_r − Σ_α β_α r^α)²
//! ```
//!
//! The fitted value at `q` is the point estimate; the fitted polynomial also
//! yields the local gradient. Degree 0 is the Nadaraya-Watson estimator;
//! degree 1 removes its boundary bias.
//!
//! **How the dual-tree acceleration works:**
//!
//! 1. Build a space-partitioning tree over the references and one over the
//!    queries.
//! 2. For every reference node, precompute weighted monomial moments up to
//!    degree `2p`.
//! 3. Walk pairs of (query node, reference node). When the kernel varies
//!    little over a pair, add the reference node's moments times a single
//!    weight to every query in the node at once; otherwise split.
//! 4. Push the postponed sums down to the query points and solve each
//!    query's small linear system.
//!
//! Naive evaluation costs `O(N·M)` kernel evaluations; with a compact
//! kernel and a moderate tolerance, most node pairs are resolved without
//! touching individual points.
//!
//! ## Quick Start
//!
//! ```rust
//! use dualtree_lpr::prelude::*;
//!
//! let x: Vec<f64> = vec![0.0, 1.0, 2.0, 3.0, 4.0];
//! let y = vec![1.0, 3.0, 5.0, 7.0, 9.0];
//!
//! // Build the model
//! let model = Lpr::new()
//!     .bandwidth(10.0)     // Kernel bandwidth
//!     .degree(Linear)      // Local linear fit
//!     .build()?;
//!
//! // Evaluate at the query points
//! let result = model.fit(&x, &y, &[2.0, 2.5])?;
//!
//! assert!((result.values[0] - 5.0).abs() < 1e-8);
//! assert!((result.values[1] - 6.0).abs() < 1e-8);
//!
//! // Coefficients of the fitted polynomial, intercept first
//! let coefficients = result.coefficients(0).unwrap();
//! assert!((coefficients[0] - 1.0).abs() < 1e-8);
//! assert!((coefficients[1] - 2.0).abs() < 1e-8);
//!
//! println!("{}", result);
//! # Result::<(), LprError>::Ok(())
//! ```
//!
//! ### Full Configuration
//!
//! ```rust
//! use dualtree_lpr::prelude::*;
//!
//! // 2D references on a grid, flattened row-major
//! let mut references = Vec::new();
//! let mut targets = Vec::new();
//! for i in 0..20 {
//!     for j in 0..20 {
//!         let (u, v) = (i as f64 / 19.0, j as f64 / 19.0);
//!         references.extend_from_slice(&[u, v]);
//!         targets.push(u * u + v);
//!     }
//! }
//! let queries = vec![0.5, 0.5, 0.25, 0.75];
//!
//! let model = Lpr::new()
//!     .dimensions(2)                      // Number of predictor dimensions
//!     .bandwidths(vec![0.3, 0.4])         // Per-dimension bandwidths
//!     .degree(Quadratic)                  // Local quadratic fit
//!     .kernel(Epanechnikov)               // Kernel function
//!     .pruning_mode(QuickPlusRelative)    // Error-budget rule
//!     .absolute_tolerance(0.0)            // Absolute kernel-sum tolerance
//!     .relative_tolerance(0.01)           // Relative kernel-sum tolerance
//!     .leaf_size(16)                      // Points per tree leaf
//!     .zero_weight_fallback(UseGlobalMean) // Value for queries with no support
//!     .parallel(true)                     // Parallel traversal and solves
//!     .build()?;
//!
//! let result = model.fit(&references, &targets, &queries)?;
//! assert_eq!(result.len(), 2);
//! assert_eq!(result.n_degenerate(), 0);
//!
//! // First partial derivatives at the query point
//! let gradient = result.gradient(0).unwrap();
//! assert_eq!(gradient.len(), 2);
//! # Result::<(), LprError>::Ok(())
//! ```
//!
//! ### Result and Error Handling
//!
//! Configuration and input-shape problems are returned as [`LprError`]
//! before any work is done:
//!
//! ```rust
//! use dualtree_lpr::prelude::*;
//!
//! let err = Lpr::<f64>::new().bandwidth(-1.0).build().unwrap_err();
//! assert_eq!(err, LprError::InvalidBandwidth(-1.0));
//!
//! let model = Lpr::new().dimensions(2).build()?;
//! let err = model.fit(&[0.0, 1.0, 2.0], &[1.0], &[0.0, 0.0]).unwrap_err();
//! assert!(err.is_input_shape_mismatch());
//! # Result::<(), LprError>::Ok(())
//! ```
//!
//! Queries whose local system cannot be solved do not fail the run. They are
//! reported as [`LocalEstimate::Degenerate`] with a fallback value:
//!
//! * `NoKernelSupport`: no reference has positive kernel weight. The value is
//!   the global weighted mean of the targets (`UseGlobalMean`, default) or
//!   zero (`ReturnZero`).
//! * `SingularSystem`: the local design is rank-deficient or ill-conditioned
//!   (reciprocal condition number below `condition_tolerance`). The value is
//!   the local kernel-weighted average.
//!
//! ```rust
//! use dualtree_lpr::prelude::*;
//!
//! let model = Lpr::<f64>::new().bandwidth(0.5).degree(Linear).build()?;
//! let result = model.fit(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], &[10.0])?;
//!
//! match &result.estimates[0] {
//!     LocalEstimate::Degenerate { reason, value } => {
//!         assert_eq!(*reason, NoKernelSupport);
//!         assert!((*value - 2.0).abs() < 1e-12);
//!     }
//!     LocalEstimate::Solved(_) => unreachable!(),
//! }
//! # Result::<(), LprError>::Ok(())
//! ```
//!
//! ## Accuracy Control
//!
//! Pruning replaces the kernel weights of a node pair by a constant, which
//! perturbs each query's accumulated kernel-weight sum. The traversal
//! guarantees that this perturbation stays within a per-query budget:
//!
//! | Pruning mode        | Budget                                        |
//! |---------------------|-----------------------------------------------|
//! | `Quick`             | `absolute_tolerance`                          |
//! | `QuickPlusRelative` | `max(absolute_tolerance, relative_tolerance · S)` |
//!
//! where `S` is a lower bound on the query's kernel-weight sum. With both
//! tolerances at zero, only exact approximations are taken (node pairs
//! entirely outside a compact kernel's support, or inside a flat region) and
//! the result equals the brute-force fit ([`LprModel::fit_naive`]).
//!
//! ## Custom Kernels
//!
//! Any type implementing [`Kernel`] can be used through
//! [`LprModel::fit_with_kernel`]. The default `bound` assumes the kernel is
//! non-increasing in distance; override it otherwise.
//!
//! ```rust
//! use dualtree_lpr::prelude::*;
//!
//! struct Cauchy;
//!
//! impl Kernel<f64> for Cauchy {
//!     fn evaluate(&self, distance: f64) -> f64 {
//!         1.0 / (1.0 + distance * distance)
//!     }
//! }
//!
//! let model = Lpr::new().bandwidth(1.0).degree(Constant).build()?;
//! let result = model.fit_with_kernel(&Cauchy, &[0.0, 1.0], &[2.0, 2.0], None, &[0.5])?;
//! assert!((result.values[0] - 2.0).abs() < 1e-12);
//! # Result::<(), LprError>::Ok(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature    | Default | Description                                        |
//! |------------|---------|----------------------------------------------------|
//! | `std`      | yes     | Standard library support                           |
//! | `parallel` | yes     | Parallel traversal and solves with `rayon`         |
//! | `serde`    | no      | `Serialize` for results, trees and moment caches   |
//! | `dev`      | no      | Exposes internal modules under `internals`         |
//!
//! Without `std` the crate is `no_std` + `alloc`.
//!
//! ## Logging
//!
//! The crate emits `tracing` events under the `lpr` target: fit start and
//! traversal statistics at `DEBUG`, tree and moment construction at `TRACE`,
//! degenerate-query counts at `WARN`. No subscriber is installed.
//!
//! ## References
//!
//! - Fan, J. & Gijbels, I. (1996). "Local Polynomial Modelling and Its Applications"
//! - Gray, A. G. & Moore, A. W. (2001). "N-Body Problems in Statistical Learning"
//! - Lee, D., Gray, A. G. & Moore, A. W. (2006). "Dual-Tree Fast Gauss Transforms"

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]

#[cfg(not(feature = "std"))]
#[macro_use]
extern crate alloc;

// ============================================================================
// Internal Modules
// ============================================================================

// Layer 1: Primitives - data structures and basic utilities.
//
// Contains the error type and the normal-equation accumulation buffers.
mod primitives;

// Layer 2: Math - pure mathematical functions.
//
// Contains multi-index sets, kernels, scaled distances, bounding boxes,
// the space-partitioning tree and the conditioned solver.
mod math;

// Layer 3: Algorithms - core regression algorithms.
//
// Contains the moment cache, the pruning rule, the local solve and
// the brute-force oracle.
mod algorithms;

// Layer 4: Engine - orchestration and execution control.
//
// Contains validation, query accumulators, the dual-tree traversal,
// the executor and the result type.
mod engine;

// High-level fluent API.
//
// Provides the `Lpr` builder and the `LprModel` it produces.
mod api;

pub use api::{
    Degeneracy, FloatLinalg, Kernel, LocalEstimate, LocalFit, LprBuilder, LprConfig, LprError,
    LprModel, LprResult, PolynomialDegree, PruningMode, TraversalStats, WeightFunction,
    ZeroWeightFallback,
};

// ============================================================================
// Prelude
// ============================================================================

/// Standard prelude.
///
/// This module is intended to be wildcard-imported for convenient access
/// to the most commonly used types:
///
/// ```
/// use dualtree_lpr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{
        Degeneracy::{NoKernelSupport, SingularSystem},
        Kernel, LocalEstimate, LocalFit, LprBuilder as Lpr, LprError, LprModel, LprResult,
        PolynomialDegree::{Constant, Cubic, Degree, Linear, Quadratic, Quartic},
        PruningMode::{Quick, QuickPlusRelative},
        WeightFunction::{Biweight, Cosine, Epanechnikov, Gaussian, Triangle, Tricube, Uniform},
        ZeroWeightFallback::{ReturnZero, UseGlobalMean},
    };
}

// ============================================================================
// Testing re-exports
// ============================================================================

/// Internal modules for development and testing.
///
/// This module re-exports internal modules for development and testing purposes.
/// It is only available with the `dev` feature enabled.
///
/// **Warning**: These are internal implementation details and may change without notice.
/// Do not use in production code.
#[cfg(feature = "dev")]
pub mod internals {
    /// Internal primitive types and utilities.
    pub mod primitives {
        pub use crate::primitives::*;
    }
    /// Internal math functions.
    pub mod math {
        pub use crate::math::*;
    }
    /// Internal core algorithms.
    pub mod algorithms {
        pub use crate::algorithms::*;
    }
    /// Internal execution engine.
    pub mod engine {
        pub use crate::engine::*;
    }
    /// Internal API.
    pub mod api {
        pub use crate::api::*;
    }
}
