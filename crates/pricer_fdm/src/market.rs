//! Market curves consumed by PDE generators.
//!
//! Curves are plain functions of time; the engine never looks at dates or
//! day counts.

use crate::error::{FdmError, FdmResult};

/// Intervals shorter than this are treated as instantaneous in
/// [`YieldCurve::forward_rate`].
const INSTANTANEOUS_DT: f64 = 1e-8;

/// Bump used to differentiate the log discount factor.
const FORWARD_BUMP: f64 = 1e-4;

/// Discount curve as a function of time.
///
/// # Invariants
///
/// - `D(0) = 1`
/// - `D(t) > 0` for all `t >= 0`
///
/// # Example
///
/// ```
/// use pricer_fdm::market::{FlatCurve, YieldCurve};
///
/// let curve = FlatCurve::new(0.05);
/// let df = curve.discount_factor(1.0).unwrap();
/// assert!((df - 0.951229).abs() < 1e-5);
///
/// let fwd = curve.forward_rate(1.0, 2.0).unwrap();
/// assert!((fwd - 0.05).abs() < 1e-12);
/// ```
pub trait YieldCurve: Send + Sync {
    /// Discount factor `D(t)`.
    fn discount_factor(&self, t: f64) -> FdmResult<f64>;

    /// Continuously compounded forward rate over `[t1, t2]`.
    ///
    /// ```text
    /// f(t1, t2) = -ln(D(t2) / D(t1)) / (t2 - t1)
    /// ```
    ///
    /// For `t2 - t1` below `1e-8` the instantaneous forward at `t1` is
    /// returned.
    fn forward_rate(&self, t1: f64, t2: f64) -> FdmResult<f64> {
        if t2 < t1 {
            return Err(FdmError::configuration(format!(
                "forward period [{}, {}] is reversed",
                t1, t2
            )));
        }
        let (start, end) = if t2 - t1 < INSTANTANEOUS_DT {
            (t1, t1 + FORWARD_BUMP)
        } else {
            (t1, t2)
        };
        let df1 = self.discount_factor(start)?;
        let df2 = self.discount_factor(end)?;
        Ok(-(df2 / df1).ln() / (end - start))
    }
}

/// Curve with one constant continuously compounded rate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatCurve {
    rate: f64,
}

impl FlatCurve {
    /// Construct a flat curve with the given constant rate.
    #[inline]
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// The constant rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl YieldCurve for FlatCurve {
    fn discount_factor(&self, t: f64) -> FdmResult<f64> {
        if t < 0.0 || !t.is_finite() {
            return Err(FdmError::configuration(format!(
                "discount factor requested at invalid time {}",
                t
            )));
        }
        Ok((-self.rate * t).exp())
    }

    fn forward_rate(&self, t1: f64, t2: f64) -> FdmResult<f64> {
        if t2 < t1 {
            return Err(FdmError::configuration(format!(
                "forward period [{}, {}] is reversed",
                t1, t2
            )));
        }
        Ok(self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Curve relying on the default methods
    struct LinearRateCurve {
        a: f64,
        b: f64,
    }

    impl YieldCurve for LinearRateCurve {
        fn discount_factor(&self, t: f64) -> FdmResult<f64> {
            // instantaneous forward a + b·t
            Ok((-(self.a * t + 0.5 * self.b * t * t)).exp())
        }
    }

    #[test]
    fn test_flat_curve() {
        let curve = FlatCurve::new(0.03);
        assert_eq!(curve.discount_factor(0.0).unwrap(), 1.0);
        assert_relative_eq!(curve.discount_factor(2.0).unwrap(), (-0.06f64).exp(), epsilon = 1e-14);
        assert_eq!(curve.forward_rate(1.0, 1.0).unwrap(), 0.03);
        assert!(curve.discount_factor(-1.0).is_err());
    }

    #[test]
    fn test_default_forward_rate() {
        let curve = LinearRateCurve { a: 0.02, b: 0.01 };
        // average of a + b·t over [1, 3]
        assert_relative_eq!(curve.forward_rate(1.0, 3.0).unwrap(), 0.04, epsilon = 1e-12);
        // instantaneous at t = 2
        assert_relative_eq!(curve.forward_rate(2.0, 2.0).unwrap(), 0.04, epsilon = 1e-5);
        assert!(curve.forward_rate(2.0, 1.0).is_err());
    }
}
