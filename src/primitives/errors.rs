//! Error types for dual-tree local polynomial regression.
//!
//! ## Purpose
//!
//! This module defines the single error type returned by every fallible
//! operation of the crate: builder validation, input validation and the
//! execution pipeline.
//!
//! ## Design notes
//!
//! * **Fatal only**: Every variant aborts a run before the traversal starts.
//!   Per-query degeneracies are not errors; they are reported on the result.
//! * **Self-describing**: Variants carry the offending value so the message
//!   is actionable without a debugger.
//! * **no_std**: `Display` is hand-written; `std::error::Error` is implemented
//!   only with the `std` feature.
//!
//! ## Non-goals
//!
//! * This module does not perform validation itself (see `engine::validator`).

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(feature = "std")]
use std::string::String;

// External dependencies
use core::fmt;

// ============================================================================
// Error Type
// ============================================================================

/// Errors raised while configuring or running a regression.
#[derive(Debug, Clone, PartialEq)]
pub enum LprError {
    /// A reference or query point set is empty.
    EmptyInput,

    /// A flattened point set whose length is not a multiple of the dimension count.
    DimensionMismatch {
        /// Length of the flattened coordinate slice.
        len: usize,
        /// Configured number of dimensions.
        dimensions: usize,
    },

    /// Per-point arrays (targets, weights) disagree with the number of points.
    MismatchedInputs {
        /// Number of reference points.
        x_len: usize,
        /// Number of per-point values supplied.
        y_len: usize,
    },

    /// A coordinate, target or weight is NaN or infinite.
    InvalidNumericValue(String),

    /// Reference weights are negative or sum to zero.
    InvalidWeights(String),

    /// Bandwidth is not strictly positive and finite.
    InvalidBandwidth(f64),

    /// Per-dimension bandwidth vector has the wrong length.
    InvalidBandwidthLength {
        /// Number of bandwidths supplied.
        got: usize,
        /// Number of dimensions configured.
        expected: usize,
    },

    /// Absolute or relative error tolerance is negative or not finite.
    InvalidTolerance(f64),

    /// Conditioning tolerance is outside [0, 1).
    InvalidConditionTolerance(f64),

    /// Leaf size is zero.
    InvalidLeafSize(usize),

    /// Number of dimensions is zero.
    InvalidDimensions(usize),

    /// Polynomial degree whose moment table would be unreasonably large.
    InvalidDegree(usize),

    /// A builder parameter was set more than once.
    DuplicateParameter {
        /// Name of the parameter.
        parameter: &'static str,
    },
}

impl LprError {
    /// Returns `true` for errors describing inconsistent input shapes.
    pub fn is_input_shape_mismatch(&self) -> bool {
        matches!(
            self,
            LprError::EmptyInput
                | LprError::DimensionMismatch { .. }
                | LprError::MismatchedInputs { .. }
        )
    }
}

impl fmt::Display for LprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LprError::EmptyInput => write!(f, "Input arrays are empty"),
            LprError::DimensionMismatch { len, dimensions } => write!(
                f,
                "Dimension mismatch: {} coordinates is not a multiple of {} dimensions",
                len, dimensions
            ),
            LprError::MismatchedInputs { x_len, y_len } => write!(
                f,
                "Length mismatch: {} reference points, {} values",
                x_len, y_len
            ),
            LprError::InvalidNumericValue(s) => write!(f, "Invalid numeric value: {}", s),
            LprError::InvalidWeights(s) => write!(f, "Invalid weights: {}", s),
            LprError::InvalidBandwidth(h) => {
                write!(f, "Invalid bandwidth: {} (must be > 0 and finite)", h)
            }
            LprError::InvalidBandwidthLength { got, expected } => write!(
                f,
                "Invalid bandwidth length: got {}, expected 1 or {}",
                got, expected
            ),
            LprError::InvalidTolerance(t) => {
                write!(f, "Invalid tolerance: {} (must be >= 0 and finite)", t)
            }
            LprError::InvalidConditionTolerance(t) => write!(
                f,
                "Invalid condition tolerance: {} (must be >= 0 and < 1)",
                t
            ),
            LprError::InvalidLeafSize(n) => write!(f, "Invalid leaf size: {} (must be >= 1)", n),
            LprError::InvalidDimensions(d) => {
                write!(f, "Invalid dimensions: {} (must be >= 1)", d)
            }
            LprError::InvalidDegree(p) => write!(
                f,
                "Invalid degree: {} (moment table too large for the configured dimensions)",
                p
            ),
            LprError::DuplicateParameter { parameter } => write!(
                f,
                "Parameter '{}' was set multiple times. Each parameter can only be configured once.",
                parameter
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LprError {}
