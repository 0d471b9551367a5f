//! Input validation for regression configuration and data.
//!
//! ## Purpose
//!
//! This module checks configuration parameters and input point sets before
//! any tree is built, so that shape and value problems surface as errors
//! instead of panics deep in the traversal.
//!
//! ## Design notes
//!
//! * **Fail-Fast**: Validation stops at the first error encountered.
//! * **Efficiency**: Checks are ordered from cheap to expensive.
//! * **Generics**: Validation is generic over `Float` types.
//!
//! ## Key concepts
//!
//! * **Shape checks**: Non-empty point sets, coordinate counts divisible by
//!   the dimension count, per-point arrays matching the reference count.
//! * **Finite Checks**: Ensures all inputs are finite (no NaN/Inf).
//! * **Weights**: Non-negative with a positive total.
//!
//! ## Invariants
//!
//! * All validated inputs satisfy their respective mathematical constraints.
//! * Validation logic is deterministic and side-effect free.
//!
//! ## Non-goals
//!
//! * This module does not sort, transform, or filter input data.
//! * This module does not provide automatic correction of invalid inputs.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::format;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::algorithms::solve::PolynomialDegree;
use crate::primitives::errors::LprError;

/// Largest moment table (terms of twice the degree) accepted per node.
pub const MAX_MOMENT_TERMS: usize = 1 << 16;

// ============================================================================
// Validator
// ============================================================================

/// Validation utility for regression configuration and input data.
///
/// Provides static methods for validating parameters and inputs. All methods
/// return `Result<(), LprError>` and fail fast upon identifying the first
/// violation.
pub struct Validator;

impl Validator {
    // ========================================================================
    // Core Input Validation
    // ========================================================================

    /// Validate reference points, targets, optional weights and query points.
    pub fn validate_inputs<T: Float>(
        references: &[T],
        targets: &[T],
        weights: Option<&[T]>,
        queries: &[T],
        dimensions: usize,
    ) -> Result<(), LprError> {
        // Check 1: Non-empty point sets
        if references.is_empty() || queries.is_empty() {
            return Err(LprError::EmptyInput);
        }

        // Check 2: Whole points only
        Self::validate_points(references, dimensions)?;
        Self::validate_points(queries, dimensions)?;

        // Check 3: Per-point arrays match the reference count
        let n = references.len() / dimensions;
        if targets.len() != n {
            return Err(LprError::MismatchedInputs {
                x_len: n,
                y_len: targets.len(),
            });
        }
        if let Some(w) = weights {
            if w.len() != n {
                return Err(LprError::MismatchedInputs {
                    x_len: n,
                    y_len: w.len(),
                });
            }
        }

        // Check 4: All values finite
        Self::validate_finite(references, "references")?;
        Self::validate_finite(targets, "targets")?;
        Self::validate_finite(queries, "queries")?;

        // Check 5: Weights non-negative with positive total
        if let Some(w) = weights {
            Self::validate_weights(w)?;
        }

        Ok(())
    }

    /// Validate that a flattened point set holds whole points.
    pub fn validate_points<T: Float>(points: &[T], dimensions: usize) -> Result<(), LprError> {
        if dimensions == 0 {
            return Err(LprError::InvalidDimensions(dimensions));
        }
        if points.len() % dimensions != 0 {
            return Err(LprError::DimensionMismatch {
                len: points.len(),
                dimensions,
            });
        }
        Ok(())
    }

    /// Validate that every value is finite.
    pub fn validate_finite<T: Float>(values: &[T], name: &str) -> Result<(), LprError> {
        for (i, &val) in values.iter().enumerate() {
            if !val.is_finite() {
                return Err(LprError::InvalidNumericValue(format!(
                    "{}[{}]={}",
                    name,
                    i,
                    val.to_f64().unwrap_or(f64::NAN)
                )));
            }
        }
        Ok(())
    }

    /// Validate reference weights.
    pub fn validate_weights<T: Float>(weights: &[T]) -> Result<(), LprError> {
        let mut total = T::zero();
        for (i, &w) in weights.iter().enumerate() {
            if !w.is_finite() || w < T::zero() {
                return Err(LprError::InvalidWeights(format!(
                    "weights[{}]={} (must be finite and >= 0)",
                    i,
                    w.to_f64().unwrap_or(f64::NAN)
                )));
            }
            total = total + w;
        }
        if !(total > T::zero()) {
            return Err(LprError::InvalidWeights(format!(
                "total weight is {} (must be > 0)",
                total.to_f64().unwrap_or(f64::NAN)
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Parameter Validation
    // ========================================================================

    /// Validate the number of dimensions.
    pub fn validate_dimensions(dimensions: usize) -> Result<(), LprError> {
        if dimensions == 0 {
            return Err(LprError::InvalidDimensions(dimensions));
        }
        Ok(())
    }

    /// Validate bandwidths (one, or one per dimension).
    pub fn validate_bandwidths<T: Float>(
        bandwidths: &[T],
        dimensions: usize,
    ) -> Result<(), LprError> {
        if bandwidths.len() != 1 && bandwidths.len() != dimensions {
            return Err(LprError::InvalidBandwidthLength {
                got: bandwidths.len(),
                expected: dimensions,
            });
        }
        for &h in bandwidths {
            if !h.is_finite() || h <= T::zero() {
                return Err(LprError::InvalidBandwidth(h.to_f64().unwrap_or(f64::NAN)));
            }
        }
        Ok(())
    }

    /// Validate an absolute or relative error tolerance.
    pub fn validate_tolerance<T: Float>(tol: T) -> Result<(), LprError> {
        if !tol.is_finite() || tol < T::zero() {
            return Err(LprError::InvalidTolerance(
                tol.to_f64().unwrap_or(f64::NAN),
            ));
        }
        Ok(())
    }

    /// Validate the reciprocal-condition-number tolerance.
    pub fn validate_condition_tolerance<T: Float>(tol: T) -> Result<(), LprError> {
        if !tol.is_finite() || tol < T::zero() || tol >= T::one() {
            return Err(LprError::InvalidConditionTolerance(
                tol.to_f64().unwrap_or(f64::NAN),
            ));
        }
        Ok(())
    }

    /// Validate the leaf size.
    pub fn validate_leaf_size(leaf_size: usize) -> Result<(), LprError> {
        if leaf_size == 0 {
            return Err(LprError::InvalidLeafSize(leaf_size));
        }
        Ok(())
    }

    /// Validate that the moment table of the degree stays bounded.
    pub fn validate_degree(degree: PolynomialDegree, dimensions: usize) -> Result<(), LprError> {
        let p = degree.value();
        let mut terms = 1usize;
        for i in 1..=dimensions {
            let factor = p.checked_mul(2).and_then(|w| w.checked_add(i));
            terms = match factor.and_then(|f| terms.checked_mul(f)) {
                Some(t) => t / i,
                None => return Err(LprError::InvalidDegree(p)),
            };
            if terms > MAX_MOMENT_TERMS {
                return Err(LprError::InvalidDegree(p));
            }
        }
        Ok(())
    }

    /// Validate that no parameters were set multiple times in the builder.
    pub fn validate_no_duplicates(duplicate_param: Option<&'static str>) -> Result<(), LprError> {
        if let Some(param) = duplicate_param {
            return Err(LprError::DuplicateParameter { parameter: param });
        }
        Ok(())
    }
}
