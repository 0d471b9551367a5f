//! Kernel (weight) functions for local polynomial regression.
//!
//! ## Purpose
//!
//! This module defines the kernel capability used by the traversal: a kernel
//! maps a bandwidth-scaled distance to a weight, and bounds the weights
//! attainable over a range of distances so whole node pairs can be pruned.
//!
//! ## Design notes
//!
//! * **Capability trait**: `Kernel<T>` has two operations, `evaluate` and
//!   `bound`. Callers may supply their own kernels; `WeightFunction` is the
//!   built-in implementation.
//! * **Monotone default**: The default `bound` assumes the kernel is
//!   non-increasing in distance and returns `(K(max), K(min))`.
//! * **Scaled distances**: Distances are already divided by the bandwidth;
//!   compact kernels are supported on `[0, 1)`.
//!
//! ## Invariants
//!
//! * Kernels are non-negative.
//! * `bound(min, max)` brackets `evaluate(u)` for every `u` in `[min, max]`.
//! * Compactly supported kernels return exactly zero at or beyond `u = 1`,
//!   so node pairs outside the support prune exactly.
//!
//! ## Non-goals
//!
//! * This module does not perform weight normalization.
//! * This module does not select bandwidths.

// External dependencies
use core::f64::consts::PI;
use num_traits::Float;

// ============================================================================
// Kernel Trait
// ============================================================================

/// A radially symmetric kernel over bandwidth-scaled distances.
pub trait Kernel<T: Float>: Sync {
    /// Weight at scaled distance `distance` (non-negative).
    fn evaluate(&self, distance: T) -> T;

    /// Conservative `(lower, upper)` weight bounds over `[min_distance, max_distance]`.
    fn bound(&self, min_distance: T, max_distance: T) -> (T, T) {
        (self.evaluate(max_distance), self.evaluate(min_distance))
    }

    /// Human-readable kernel name.
    fn name(&self) -> &'static str {
        "Custom"
    }
}

// ============================================================================
// Weight Function Enum
// ============================================================================

/// Built-in kernel functions.
///
/// Each kernel maps a scaled distance `u ≥ 0` to a weight. All kernels except
/// the Gaussian are supported on `u < 1`.
///
/// | Kernel       | Formula            |
/// |--------------|--------------------|
/// | Cosine       | cos(pi*u/2)        |
/// | Epanechnikov | 1 - u^2            |
/// | Gaussian     | exp(-u^2 / 2)      |
/// | Biweight     | (1 - u^2)^2        |
/// | Triangle     | 1 - u              |
/// | Tricube      | (1 - u^3)^3        |
/// | Uniform      | 1                  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightFunction {
    /// Cosine kernel: K(u) = cos(pi * u / 2) for u < 1.
    Cosine,

    /// Epanechnikov kernel: K(u) = 1 - u^2 for u < 1.
    ///
    /// This is the default kernel.
    #[default]
    Epanechnikov,

    /// Gaussian kernel: K(u) = exp(-u^2 / 2), unbounded support.
    Gaussian,

    /// Biweight (quartic) kernel: K(u) = (1 - u^2)^2 for u < 1.
    Biweight,

    /// Triangular kernel: K(u) = 1 - u for u < 1.
    Triangle,

    /// Tricube kernel: K(u) = (1 - u^3)^3 for u < 1.
    Tricube,

    /// Uniform kernel: K(u) = 1 for u < 1.
    Uniform,
}

impl WeightFunction {
    /// Get the name of the weight function.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            WeightFunction::Cosine => "Cosine",
            WeightFunction::Epanechnikov => "Epanechnikov",
            WeightFunction::Gaussian => "Gaussian",
            WeightFunction::Biweight => "Biweight",
            WeightFunction::Triangle => "Triangle",
            WeightFunction::Tricube => "Tricube",
            WeightFunction::Uniform => "Uniform",
        }
    }

    /// Returns `true` if the kernel vanishes for `u ≥ 1`.
    #[inline]
    pub const fn is_bounded(&self) -> bool {
        !matches!(self, WeightFunction::Gaussian)
    }

    /// Compute the weight K(u) for a scaled distance.
    #[inline]
    pub fn compute_weight<T: Float>(&self, u: T) -> T {
        let abs_u = u.abs();

        if self.is_bounded() && abs_u >= T::one() {
            return T::zero();
        }

        match self {
            WeightFunction::Cosine => {
                let half_pi = T::from(PI / 2.0).unwrap_or_else(T::one);
                (half_pi * abs_u).cos()
            }

            WeightFunction::Epanechnikov => T::one() - abs_u * abs_u,

            WeightFunction::Gaussian => {
                let half = T::from(0.5).unwrap_or_else(T::zero);
                (-(half * abs_u * abs_u)).exp()
            }

            WeightFunction::Biweight => {
                let tmp = T::one() - abs_u * abs_u;
                tmp * tmp
            }

            WeightFunction::Triangle => T::one() - abs_u,

            WeightFunction::Tricube => {
                let tmp = T::one() - abs_u * abs_u * abs_u;
                tmp * tmp * tmp
            }

            WeightFunction::Uniform => T::one(),
        }
    }
}

impl<T: Float> Kernel<T> for WeightFunction {
    #[inline]
    fn evaluate(&self, distance: T) -> T {
        self.compute_weight(distance)
    }

    fn name(&self) -> &'static str {
        WeightFunction::name(self)
    }
}
