//! Pruning rule for query/reference node pairs.
//!
//! ## Purpose
//!
//! This module decides, for a pair of nodes `(Q, R)`, whether `R`'s whole
//! contribution to every query in `Q` can be approximated by a single kernel
//! weight, must be computed exactly, or needs a finer split.
//!
//! ## Design notes
//!
//! * **Kernel range**: The scaled minimum and maximum box distances give a
//!   conservative weight range `[w_lo, w_hi]`. Approximating every pair
//!   weight by the midpoint errs on the kernel-weight sum by at most
//!   `e = (w_hi − w_lo) · W_R`, which is charged to `Q` in full.
//! * **Budget**: The error each query may accumulate. `Quick` uses the
//!   absolute tolerance; `QuickPlusRelative` uses the larger of the absolute
//!   tolerance and `τ_rel · S_lo(Q)`, where `S_lo(Q)` is a lower bound on the
//!   kernel-weight sum already accumulated by every query in `Q`.
//! * **Allowance**: The unused budget is granted to `R` in proportion to its
//!   share of the reference mass still unresolved for `Q`, so the charges
//!   over all remaining references can never exceed the budget.
//!
//! ## Invariants
//!
//! * With zero tolerances only exact approximations (`w_lo == w_hi`) prune.
//! * Every query's kernel-weight-sum error is at most its final budget.
//!
//! ## Non-goals
//!
//! * This module does not apply the decision (see `engine::traversal`).

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::math::kernel::Kernel;
use crate::math::tree::TreeNode;

// ============================================================================
// Pruning Mode
// ============================================================================

/// Error-budget rule used when deciding to prune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PruningMode {
    /// Budget is the absolute tolerance only.
    Quick,

    /// Budget is `max(absolute, relative · lower weight sum)` (default).
    #[default]
    QuickPlusRelative,
}

impl PruningMode {
    /// Get the name of the pruning mode.
    pub const fn name(&self) -> &'static str {
        match self {
            PruningMode::Quick => "Quick",
            PruningMode::QuickPlusRelative => "QuickPlusRelative",
        }
    }
}

// ============================================================================
// Query Bounds
// ============================================================================

/// Bounds valid for every query point of a query node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryBounds<T> {
    /// Lower bound on the reference mass already accounted for.
    pub resolved: T,

    /// Upper bound on the kernel-weight-sum error already consumed.
    pub used_error: T,

    /// Lower bound on the accumulated kernel-weight sum.
    pub weight_sum_lower: T,
}

impl<T: Float> QueryBounds<T> {
    /// Bounds of a node that has seen no references.
    pub fn zero() -> Self {
        Self {
            resolved: T::zero(),
            used_error: T::zero(),
            weight_sum_lower: T::zero(),
        }
    }

    /// Bounds valid for the union of two sibling nodes.
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            resolved: self.resolved.min(other.resolved),
            used_error: self.used_error.max(other.used_error),
            weight_sum_lower: self.weight_sum_lower.min(other.weight_sum_lower),
        }
    }
}

// ============================================================================
// Prune Decision
// ============================================================================

/// Outcome of the pruning rule for one node pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PruneDecision<T> {
    /// Approximate every pair weight by `weight`.
    Approximate {
        /// Constant kernel weight applied to the reference moments.
        weight: T,
        /// Error charged to the query node.
        error: T,
        /// Guaranteed kernel-weight sum contributed (`w_lo · W_R`).
        lower: T,
    },

    /// Evaluate every point pair exactly.
    BaseCase,

    /// Split one or both nodes.
    Recurse,
}

// ============================================================================
// Pruner
// ============================================================================

/// Applies the pruning rule with a fixed kernel and tolerances.
#[derive(Debug)]
pub struct Pruner<'a, T, K: ?Sized> {
    kernel: &'a K,
    scales: &'a [T],
    mode: PruningMode,
    absolute_tolerance: T,
    relative_tolerance: T,
    leaf_size: usize,
    total_weight: T,
}

impl<'a, T: Float, K: Kernel<T> + ?Sized> Pruner<'a, T, K> {
    /// Create a pruner.
    ///
    /// `scales` are the inverse bandwidths and `total_weight` the total
    /// reference weight `W_total`.
    pub fn new(
        kernel: &'a K,
        scales: &'a [T],
        mode: PruningMode,
        absolute_tolerance: T,
        relative_tolerance: T,
        leaf_size: usize,
        total_weight: T,
    ) -> Self {
        Self {
            kernel,
            scales,
            mode,
            absolute_tolerance,
            relative_tolerance,
            leaf_size,
            total_weight,
        }
    }

    /// Error budget for a query node with the given accumulated weight-sum lower bound.
    #[inline]
    pub fn budget(&self, weight_sum_lower: T) -> T {
        match self.mode {
            PruningMode::Quick => self.absolute_tolerance,
            PruningMode::QuickPlusRelative => self
                .absolute_tolerance
                .max(self.relative_tolerance * weight_sum_lower),
        }
    }

    /// Conservative kernel-weight range between two nodes.
    #[inline]
    pub fn weight_range(&self, q_node: &TreeNode<T>, r_node: &TreeNode<T>) -> (T, T) {
        let min_distance = q_node.bounds.min_distance_sq(&r_node.bounds, self.scales).sqrt();
        let max_distance = q_node.bounds.max_distance_sq(&r_node.bounds, self.scales).sqrt();
        self.kernel.bound(min_distance, max_distance)
    }

    /// Decide how to handle the pair `(q_node, r_node)`.
    ///
    /// `r_weight` is the reference node's total weight `W_R`.
    ///
    /// The prune test runs first, so a pair of leaves that fits its error
    /// allowance is approximated rather than evaluated exactly. Exact
    /// evaluation is only forced at zero tolerance, where the allowance is
    /// zero and only a kernel that is constant over the pair can pass.
    pub fn decide(
        &self,
        q_node: &TreeNode<T>,
        r_node: &TreeNode<T>,
        q_bounds: &QueryBounds<T>,
        r_weight: T,
    ) -> PruneDecision<T> {
        let (w_lo, w_hi) = self.weight_range(q_node, r_node);
        let error = (w_hi - w_lo) * r_weight;

        let remaining = (self.budget(q_bounds.weight_sum_lower) - q_bounds.used_error).max(T::zero());
        let unresolved = (self.total_weight - q_bounds.resolved).max(r_weight);
        let allowance = if unresolved > T::zero() {
            remaining * r_weight / unresolved
        } else {
            T::zero()
        };

        if error <= allowance {
            let two = T::one() + T::one();
            return PruneDecision::Approximate {
                weight: (w_lo + w_hi) / two,
                error,
                lower: w_lo * r_weight,
            };
        }

        if (q_node.is_leaf() && r_node.is_leaf())
            || q_node.count().saturating_mul(r_node.count()) <= self.leaf_size
        {
            return PruneDecision::BaseCase;
        }

        PruneDecision::Recurse
    }
}
