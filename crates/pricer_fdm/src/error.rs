//! Error types for the finite-difference engine.
//!
//! This module provides:
//! - `FdmError`: Errors from grid construction, operator assembly and time stepping
//! - `InterpolationError`: Errors from solution interpolation
//!
//! Every error is fatal to the pricing run that raised it. The schemes are
//! deterministic, so nothing is retried internally.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type FdmResult<T> = Result<T, FdmError>;

/// Categorised finite-difference errors.
///
/// # Variants
/// - `Configuration`: Invalid construction parameters (grid sizes, axis counts,
///   scheme parameters, time bounds, dimensionality mismatches)
/// - `Index`: Out-of-range coordinate, flat index, axis or neighbour lookup
/// - `NumericalSolve`: A linear solve hit a non-invertible system or failed
///   to converge
/// - `Interpolation`: The final solution could not be interpolated
///
/// # Examples
/// ```
/// use pricer_fdm::FdmError;
///
/// let err = FdmError::Configuration("damping steps exceed steps".to_string());
/// assert_eq!(format!("{}", err), "Invalid configuration: damping steps exceed steps");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FdmError {
    /// Invalid construction parameters.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Out-of-range coordinate or index lookup.
    #[error("Index out of range: {0}")]
    Index(String),

    /// Linear solve failed (singular system or no convergence).
    #[error("Numerical solve failed: {0}")]
    NumericalSolve(String),

    /// Solution interpolation failed.
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
}

impl FdmError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an index error.
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create a numerical solve error.
    pub fn numerical_solve(message: impl Into<String>) -> Self {
        Self::NumericalSolve(message.into())
    }

    /// Check that a vector has the expected length.
    pub(crate) fn check_len(what: &str, got: usize, expected: usize) -> FdmResult<()> {
        if got != expected {
            return Err(Self::Configuration(format!(
                "{} has length {}, expected {}",
                what, got, expected
            )));
        }
        Ok(())
    }
}

/// Interpolation-related errors.
///
/// # Variants
/// - `OutOfBounds`: Query point outside valid interpolation domain
/// - `InsufficientData`: Not enough data points for interpolation
/// - `NonMonotonicData`: Abscissae are not strictly increasing
/// - `InvalidInput`: General invalid input error
///
/// # Examples
/// ```
/// use pricer_fdm::InterpolationError;
///
/// let err = InterpolationError::OutOfBounds { x: 5.0, min: 0.0, max: 3.0 };
/// assert!(format!("{}", err).contains("outside valid domain"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    /// Query point outside valid interpolation domain.
    #[error("Query point {x} outside valid domain [{min}, {max}]")]
    OutOfBounds {
        /// The query point that was out of bounds
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Insufficient data points for interpolation.
    #[error("Insufficient data points: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Abscissae not strictly increasing.
    #[error("Data is not strictly increasing at index {index}")]
    NonMonotonicData {
        /// Index where monotonicity violation was detected
        index: usize,
    },

    /// Invalid input data or parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            FdmError::index("coordinate 7 on axis 1 (dim 5)").to_string(),
            "Index out of range: coordinate 7 on axis 1 (dim 5)"
        );
        assert_eq!(
            FdmError::numerical_solve("zero pivot").to_string(),
            "Numerical solve failed: zero pivot"
        );
    }

    #[test]
    fn test_interpolation_error_converts() {
        let err: FdmError = InterpolationError::InsufficientData { got: 2, need: 3 }.into();
        assert!(matches!(err, FdmError::Interpolation(_)));
        assert!(err.to_string().contains("need at least 3"));
    }

    #[test]
    fn test_check_len() {
        assert!(FdmError::check_len("rhs", 4, 4).is_ok());
        let err = FdmError::check_len("rhs", 3, 4).unwrap_err();
        assert!(matches!(err, FdmError::Configuration(msg) if msg.contains("rhs has length 3")));
    }
}
