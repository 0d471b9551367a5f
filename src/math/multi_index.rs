//! Multi-index enumeration for multivariate polynomial bases.
//!
//! ## Purpose
//!
//! This module enumerates the exponent tuples `α = (α_1, ..., α_d)` with
//! `|α| ≤ p` that index the monomial basis `x^α` of a degree-`p` polynomial in
//! `d` variables, and provides the monomial operations built on top of them.
//!
//! ## Design notes
//!
//! * **Graded-lexicographic order**: Tuples are ordered by total degree, then
//!   lexicographically descending on the first coordinate, then the second,
//!   and so on. For `d = 2, p = 2`:
//!   `(0,0), (1,0), (0,1), (2,0), (1,1), (0,2)`.
//! * **Prefix property**: Because the order is graded, the degree-`p` set is a
//!   prefix of the degree-`2p` set. Moment tables indexed by the wide set can
//!   therefore be sliced for the basis.
//! * **Parent recurrence**: Every non-zero tuple is its parent (the tuple with
//!   the first non-zero coordinate decremented) plus one unit exponent, so all
//!   monomials of a point are evaluated with one multiplication each.
//!
//! ## Key concepts
//!
//! * **Sum table**: For a basis pair `(α, β)`, the position of `α + β` in the
//!   wide set. Turns moment sums into normal-matrix entries by lookup.
//! * **Taylor shift**: Re-expanding `p(z)` around another origin,
//!   `c_γ = Σ_{α ≥ γ} β_α Π_i C(α_i, γ_i) s_i^{α_i - γ_i}`.
//! * **Moment shift**: The same binomial expansion applied the other way
//!   round. Sums of `(x − a)^γ` become sums of `(x − b)^γ` with
//!   `M'_γ = Σ_{δ ≤ γ} C(γ, δ) (a − b)^{γ − δ} M_δ`.
//! * **Shift terms**: Every `(γ, δ ≤ γ)` pair with its binomial factor,
//!   enumerated once per set and shared by both shifts.
//!
//! ## Invariants
//!
//! * `len() == C(p + d, d)`; every tuple is distinct and sums to at most `p`.
//! * Position 0 is the zero tuple; positions `1..=d` are the unit tuples
//!   `e_1..e_d` when `p ≥ 1`.
//! * Enumeration is deterministic.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::collections::BTreeMap;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// ============================================================================
// Multi-Index Set
// ============================================================================

/// One term of the binomial expansion of `(z + s)^γ`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ShiftTerm {
    /// Position of `γ`.
    high: usize,
    /// Position of `δ ≤ γ`.
    low: usize,
    /// Position of `γ − δ`.
    power: usize,
    /// `Π_k C(γ_k, δ_k)`.
    binomial: f64,
}

/// Ordered set of exponent tuples of total degree at most `degree`.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiIndexSet {
    dimensions: usize,
    degree: usize,

    /// Flattened exponents, `dimensions` entries per tuple.
    exponents: Vec<usize>,

    /// `(parent position, unit dimension)` for every tuple after the first.
    parents: Vec<(usize, usize)>,

    lookup: BTreeMap<Vec<usize>, usize>,

    /// Sorted by `high`.
    shift_terms: Vec<ShiftTerm>,
}

impl MultiIndexSet {
    /// Enumerate all tuples with `dimensions` entries summing to at most `degree`.
    pub fn new(dimensions: usize, degree: usize) -> Self {
        let count = Self::num_terms(dimensions, degree);
        let mut exponents = Vec::with_capacity(count * dimensions);

        if dimensions > 0 {
            let mut current = vec![0usize; dimensions];
            for total in 0..=degree {
                push_compositions(total, 0, &mut current, &mut exponents);
            }
        }

        let mut lookup = BTreeMap::new();
        for (i, tuple) in exponents.chunks(dimensions.max(1)).enumerate() {
            lookup.insert(tuple.to_vec(), i);
        }

        let mut parents = Vec::with_capacity(count.saturating_sub(1));
        for tuple in exponents.chunks(dimensions.max(1)).skip(1) {
            if let Some(k) = tuple.iter().position(|&a| a > 0) {
                let mut parent = tuple.to_vec();
                parent[k] -= 1;
                let position = lookup.get(&parent).copied().unwrap_or(0);
                parents.push((position, k));
            }
        }

        let shift_terms = build_shift_terms(&exponents, dimensions, &lookup);

        Self {
            dimensions,
            degree,
            exponents,
            parents,
            lookup,
            shift_terms,
        }
    }

    /// Number of tuples with `dimensions` entries and total degree at most `degree`,
    /// i.e. `C(degree + dimensions, dimensions)`.
    pub const fn num_terms(dimensions: usize, degree: usize) -> usize {
        let mut result = 1usize;
        let mut i = 1;
        while i <= dimensions {
            result = result * (degree + i) / i;
            i += 1;
        }
        result
    }

    /// Number of tuples in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.parents.len() + usize::from(self.dimensions > 0)
    }

    /// Returns `true` if the set has no tuples (zero dimensions).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of variables.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Maximum total degree.
    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Exponent tuple at position `i`.
    #[inline]
    pub fn exponents(&self, i: usize) -> &[usize] {
        &self.exponents[i * self.dimensions..(i + 1) * self.dimensions]
    }

    /// Iterate over all tuples in order.
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.exponents.chunks(self.dimensions.max(1))
    }

    /// Position of a tuple, if it belongs to the set.
    pub fn position(&self, alpha: &[usize]) -> Option<usize> {
        self.lookup.get(alpha).copied()
    }

    /// Positions of the unit tuples `e_1..e_d` (empty for degree 0).
    pub fn unit_positions(&self) -> Vec<usize> {
        if self.degree == 0 {
            return Vec::new();
        }
        (0..self.dimensions)
            .filter_map(|k| {
                let mut unit = vec![0usize; self.dimensions];
                unit[k] = 1;
                self.position(&unit)
            })
            .collect()
    }

    // ========================================================================
    // Monomial Operations
    // ========================================================================

    /// Evaluate every monomial `point^α` in set order into `out`.
    #[inline]
    pub fn evaluate<T: Float>(&self, point: &[T], out: &mut [T]) {
        debug_assert_eq!(point.len(), self.dimensions);
        debug_assert!(out.len() >= self.len());

        if let Some(first) = out.first_mut() {
            *first = T::one();
        }
        for (i, &(parent, k)) in self.parents.iter().enumerate() {
            out[i + 1] = out[parent] * point[k];
        }
    }

    /// For every pair `(α, β)` of this set, the position of `α + β` in `wide`.
    ///
    /// Returns `None` if `wide` does not contain every sum, i.e. its degree is
    /// below twice this set's degree or the dimensions differ.
    pub fn sum_table(&self, wide: &MultiIndexSet) -> Option<Vec<usize>> {
        if wide.dimensions != self.dimensions {
            return None;
        }

        let n = self.len();
        let mut table = Vec::with_capacity(n * n);
        let mut sum = vec![0usize; self.dimensions];

        for i in 0..n {
            for j in 0..n {
                for (k, s) in sum.iter_mut().enumerate() {
                    *s = self.exponents(i)[k] + self.exponents(j)[k];
                }
                table.push(wide.position(&sum)?);
            }
        }

        Some(table)
    }

    /// Coefficients of `q(z) = p(z + shift)` given the coefficients of `p`.
    pub fn taylor_shift<T: Float>(&self, coefficients: &[T], shift: &[T]) -> Vec<T> {
        debug_assert_eq!(coefficients.len(), self.len());
        debug_assert_eq!(shift.len(), self.dimensions);

        let n = self.len();
        let mut powers = vec![T::zero(); n];
        self.evaluate(shift, &mut powers);

        let mut shifted = vec![T::zero(); n];
        for term in &self.shift_terms {
            let beta = coefficients[term.high];
            if beta.is_zero() {
                continue;
            }
            let binom = T::from(term.binomial).unwrap_or_else(T::zero);
            shifted[term.low] = shifted[term.low] + beta * binom * powers[term.power];
        }

        shifted
    }

    /// Translate monomial sums to a new centre and add them, scaled, to `out`.
    ///
    /// `moments[γ]` holds `Σ ω (x − a)^γ`; on return `out[γ]` has gained
    /// `scale · Σ ω (x − b)^γ` with `shift = a − b`. Only the first
    /// `out.len()` positions are written, which by the prefix property
    /// depend on the first `out.len()` moments only.
    pub fn shift_moments_into<T: Float>(&self, moments: &[T], shift: &[T], scale: T, out: &mut [T]) {
        let n = out.len();
        debug_assert!(n <= self.len());
        debug_assert!(moments.len() >= n);
        debug_assert_eq!(shift.len(), self.dimensions);

        if n == 0 || scale.is_zero() {
            return;
        }

        let mut powers = vec![T::zero(); n];
        powers[0] = T::one();
        for (i, &(parent, k)) in self.parents.iter().take(n - 1).enumerate() {
            powers[i + 1] = powers[parent] * shift[k];
        }

        for term in self.shift_terms.iter().take_while(|t| t.high < n) {
            let m = moments[term.low];
            if m.is_zero() {
                continue;
            }
            let binom = T::from(term.binomial).unwrap_or_else(T::zero);
            out[term.high] = out[term.high] + scale * m * binom * powers[term.power];
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Push every tuple of `current[dim..]` summing to `remaining`, first
/// coordinate descending.
fn push_compositions(remaining: usize, dim: usize, current: &mut [usize], out: &mut Vec<usize>) {
    let last = current.len() - 1;
    if dim == last {
        current[dim] = remaining;
        out.extend_from_slice(current);
        return;
    }

    for first in (0..=remaining).rev() {
        current[dim] = first;
        push_compositions(remaining - first, dim + 1, current, out);
    }
    current[dim] = 0;
}

/// Every `(γ, δ ≤ γ)` pair of the set, in order of `γ`.
///
/// The sub-tuples `δ` are walked with an odometer, so the cost is the
/// number of terms rather than the square of the set size.
fn build_shift_terms(
    exponents: &[usize],
    dimensions: usize,
    lookup: &BTreeMap<Vec<usize>, usize>,
) -> Vec<ShiftTerm> {
    let mut terms = Vec::new();
    if dimensions == 0 {
        return terms;
    }

    let mut low = vec![0usize; dimensions];
    let mut power = vec![0usize; dimensions];

    for (high, gamma) in exponents.chunks(dimensions).enumerate() {
        low.iter_mut().for_each(|x| *x = 0);

        loop {
            let mut factor = 1.0;
            for k in 0..dimensions {
                power[k] = gamma[k] - low[k];
                factor *= binomial(gamma[k], low[k]);
            }
            if let (Some(&l), Some(&p)) = (lookup.get(&low), lookup.get(&power)) {
                terms.push(ShiftTerm {
                    high,
                    low: l,
                    power: p,
                    binomial: factor,
                });
            }

            let mut k = 0;
            while k < dimensions {
                if low[k] < gamma[k] {
                    low[k] += 1;
                    break;
                }
                low[k] = 0;
                k += 1;
            }
            if k == dimensions {
                break;
            }
        }
    }

    terms
}

/// Binomial coefficient `C(n, k)` as a float.
fn binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
    }
    result
}
