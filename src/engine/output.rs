//! Regression results.
//!
//! ## Purpose
//!
//! This module defines `LprResult`, the value returned by every fit: one
//! `LocalEstimate` per query in the caller's order, the point estimates as a
//! plain vector, and a summary of the run.
//!
//! ## Design notes
//!
//! * **Degenerate queries are data**: They are counted and reported, never
//!   turned into errors.
//! * **Display**: A fixed-width summary and estimate table for quick
//!   inspection.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::fmt::{self, Display, Formatter};
use num_traits::Float;

// Internal dependencies
use crate::algorithms::pruning::PruningMode;
use crate::algorithms::solve::{Degeneracy, LocalEstimate, PolynomialDegree};
use crate::engine::traversal::TraversalStats;

// ============================================================================
// Result Type
// ============================================================================

/// Output of a local polynomial regression run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LprResult<T> {
    /// Per-query outcomes, in query order.
    pub estimates: Vec<LocalEstimate<T>>,

    /// Point estimates (fitted or fallback), in query order.
    pub values: Vec<T>,

    /// Query coordinates as supplied, flattened.
    pub queries: Vec<T>,

    /// Number of dimensions.
    pub dimensions: usize,

    /// Polynomial degree used.
    pub degree: PolynomialDegree,

    /// Kernel name.
    pub kernel: &'static str,

    /// Pruning mode used, `None` for brute-force runs.
    pub pruning_mode: Option<PruningMode>,

    /// Traversal work counters (zero for brute-force runs).
    pub stats: TraversalStats,
}

impl<T: Float> LprResult<T> {
    /// Number of queries.
    #[inline]
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    /// Returns `true` if the result holds no queries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// Number of queries that fell back.
    pub fn n_degenerate(&self) -> usize {
        self.estimates.iter().filter(|e| e.is_degenerate()).count()
    }

    /// Number of queries that fell back for the given reason.
    pub fn count_degenerate(&self, reason: Degeneracy) -> usize {
        self.estimates
            .iter()
            .filter(|e| e.degeneracy() == Some(reason))
            .count()
    }

    /// Coefficients (caller's frame) of query `i`, if it was solved.
    pub fn coefficients(&self, i: usize) -> Option<&[T]> {
        self.estimates
            .get(i)
            .and_then(|e| e.fit())
            .map(|fit| fit.coefficients.as_slice())
    }

    /// Gradient at query `i`, if it was solved with degree at least 1.
    pub fn gradient(&self, i: usize) -> Option<&[T]> {
        self.estimates.get(i).and_then(|e| e.fit()).and_then(|f| f.gradient())
    }
}

// ============================================================================
// Display
// ============================================================================

impl<T: Float + Display> Display for LprResult<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Queries: {}", self.len())?;
        writeln!(f, "  Dimensions: {}", self.dimensions)?;
        writeln!(f, "  Degree: {}", self.degree.value())?;
        writeln!(f, "  Kernel: {}", self.kernel)?;
        match self.pruning_mode {
            Some(mode) => writeln!(f, "  Pruning: {}", mode.name())?,
            None => writeln!(f, "  Pruning: None (brute force)")?,
        }
        writeln!(f, "  Degenerate: {}", self.n_degenerate())?;

        if self.pruning_mode.is_some() {
            writeln!(f)?;
            writeln!(f, "Traversal:")?;
            writeln!(f, "  Node pairs:         {}", self.stats.visited_pairs)?;
            writeln!(f, "  Prunes:             {}", self.stats.prunes)?;
            writeln!(f, "  Base cases:         {}", self.stats.base_cases)?;
            writeln!(f, "  Kernel evaluations: {}", self.stats.kernel_evaluations)?;
        }

        writeln!(f)?;
        writeln!(f, "Estimates:")?;
        write!(f, "  ")?;
        if self.dimensions == 1 {
            write!(f, "{:>8}", "X")?;
        } else {
            for k in 0..self.dimensions {
                write!(f, "{:>7}{}", "X", k + 1)?;
            }
        }
        writeln!(f, " {:>12} {:>10}", "Estimate", "Status")?;
        writeln!(f, "  {}", "-".repeat(8 * self.dimensions + 24))?;

        for (i, estimate) in self.estimates.iter().enumerate() {
            write!(f, "  ")?;
            for k in 0..self.dimensions {
                let x = self.queries.get(i * self.dimensions + k).copied();
                match x {
                    Some(x) => write!(f, "{:>8.2}", x)?,
                    None => write!(f, "{:>8}", "-")?,
                }
            }
            let status = match estimate.degeneracy() {
                None => "Solved",
                Some(Degeneracy::SingularSystem) => "Singular",
                Some(Degeneracy::NoKernelSupport) => "NoSupport",
            };
            writeln!(f, " {:>12.5} {:>10}", estimate.value(), status)?;
        }

        Ok(())
    }
}
