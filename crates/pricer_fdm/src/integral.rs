//! Quadrature of grid functions over a mesher.
//!
//! The 1D rule is applied axis by axis with the last axis outermost: the
//! flat vector is cut into contiguous slabs along the last axis, each slab is
//! integrated recursively over the remaining axes, and the slab integrals are
//! combined with the rule on the last axis' coordinates.
//!
//! # Example
//!
//! ```
//! use pricer_fdm::integral::{FdmMesherIntegral, QuadratureRule};
//! use pricer_fdm::meshers::{Fdm1dMesher, FdmMesher, FdmMesherComposite};
//!
//! let mesher = FdmMesherComposite::new(vec![
//!     Fdm1dMesher::uniform(0.0, 1.0, 11).unwrap(),
//!     Fdm1dMesher::uniform(0.0, 2.0, 21).unwrap(),
//! ])
//! .unwrap();
//! let x = mesher.locations(0).unwrap();
//! let y = mesher.locations(1).unwrap();
//! let f: Vec<f64> = x.iter().zip(&y).map(|(x, y)| x * x * y).collect();
//!
//! let integral = FdmMesherIntegral::new(&mesher, QuadratureRule::Simpson).unwrap();
//! // ∫∫ x² y dx dy = 1/3 · 2
//! assert!((integral.integrate(&f).unwrap() - 2.0 / 3.0).abs() < 1e-12);
//! ```

use crate::error::{FdmError, FdmResult};
use crate::meshers::FdmMesher;
use tracing::debug;

/// Composite 1D quadrature rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuadratureRule {
    /// Non-uniform composite Simpson; needs an odd number of points per axis.
    #[default]
    Simpson,
    /// Composite trapezoid.
    Trapezoid,
}

impl QuadratureRule {
    /// Integrate samples `f` taken at increasing abscissae `x`.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` if the lengths differ, or for Simpson with
    /// an even number of points.
    pub fn integrate_1d(&self, x: &[f64], f: &[f64]) -> FdmResult<f64> {
        FdmError::check_len("integrand", f.len(), x.len())?;
        match self {
            QuadratureRule::Simpson => simpson(x, f),
            QuadratureRule::Trapezoid => Ok(trapezoid(x, f)),
        }
    }

    fn check_points(&self, axis: usize, n: usize) -> FdmResult<()> {
        if *self == QuadratureRule::Simpson && n % 2 == 0 {
            return Err(FdmError::configuration(format!(
                "Simpson integration needs an odd number of points, axis {} has {}",
                axis, n
            )));
        }
        Ok(())
    }
}

/// Panel `(x0, x1, x2)` weight:
/// `(h0+h1)/6·[(2-h1/h0)f0 + (h0+h1)²/(h0h1)f1 + (2-h0/h1)f2]`.
fn simpson(x: &[f64], f: &[f64]) -> FdmResult<f64> {
    QuadratureRule::Simpson.check_points(0, x.len())?;
    let mut sum = 0.0;
    for j in (1..x.len().saturating_sub(1)).step_by(2) {
        let h0 = x[j] - x[j - 1];
        let h1 = x[j + 1] - x[j];
        let hs = h0 + h1;
        let middle = hs * hs / (h0 * h1) * f[j];
        sum += hs / 6.0 * ((2.0 - h1 / h0) * f[j - 1] + middle + (2.0 - h0 / h1) * f[j + 1]);
    }
    Ok(sum)
}

fn trapezoid(x: &[f64], f: &[f64]) -> f64 {
    x.windows(2)
        .zip(f.windows(2))
        .map(|(x, f)| 0.5 * (x[1] - x[0]) * (f[0] + f[1]))
        .sum()
}

/// Integral of a grid function over the whole mesher domain.
#[derive(Clone, Debug)]
pub struct FdmMesherIntegral {
    rule: QuadratureRule,
    axis_locations: Vec<Vec<f64>>,
    size: usize,
}

impl FdmMesherIntegral {
    /// Prepare the integration of grid functions on `mesher`.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` for Simpson when an axis has an even number
    /// of points.
    pub fn new<M: FdmMesher + ?Sized>(mesher: &M, rule: QuadratureRule) -> FdmResult<Self> {
        let layout = mesher.layout();
        let axis_locations = (0..layout.dim())
            .map(|axis| mesher.axis_locations(axis))
            .collect::<FdmResult<Vec<_>>>()?;
        for (axis, xs) in axis_locations.iter().enumerate() {
            rule.check_points(axis, xs.len())?;
        }
        debug!(?rule, dims = ?layout.dims(), "mesher integral");
        Ok(Self {
            rule,
            axis_locations,
            size: layout.size(),
        })
    }

    /// The quadrature rule.
    pub fn rule(&self) -> QuadratureRule {
        self.rule
    }

    /// `∫ f` over the grid, `f` in flat-index order.
    pub fn integrate(&self, f: &[f64]) -> FdmResult<f64> {
        FdmError::check_len("integrand", f.len(), self.size)?;
        self.integrate_axes(f, self.axis_locations.len())
    }

    /// Integrate over axes `0..count`, `f` covering exactly those axes.
    fn integrate_axes(&self, f: &[f64], count: usize) -> FdmResult<f64> {
        let outer = &self.axis_locations[count - 1];
        if count == 1 {
            return self.rule.integrate_1d(outer, f);
        }
        let slab = f.len() / outer.len();
        let partial = f
            .chunks(slab)
            .map(|chunk| self.integrate_axes(chunk, count - 1))
            .collect::<FdmResult<Vec<_>>>()?;
        self.rule.integrate_1d(outer, &partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshers::{Fdm1dMesher, FdmMesherComposite};
    use approx::assert_relative_eq;

    #[test]
    fn test_simpson_exact_for_quadratics_on_nonuniform_grid() {
        let x = [0.0, 0.3, 1.0, 1.2, 2.0, 2.9, 3.0];
        let f: Vec<f64> = x.iter().map(|x| x * x - 2.0 * x + 0.5).collect();
        // ∫_0^3 (x² - 2x + 0.5) dx = 9 - 9 + 1.5
        let value = QuadratureRule::Simpson.integrate_1d(&x, &f).unwrap();
        assert_relative_eq!(value, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_simpson_even_points_rejected() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let result = QuadratureRule::Simpson.integrate_1d(&x, &[1.0; 4]);
        assert!(matches!(result, Err(FdmError::Configuration(_))));

        let mesher = FdmMesherComposite::new(vec![Fdm1dMesher::uniform(0.0, 1.0, 10).unwrap()])
            .unwrap();
        assert!(FdmMesherIntegral::new(&mesher, QuadratureRule::Simpson).is_err());
        assert!(FdmMesherIntegral::new(&mesher, QuadratureRule::Trapezoid).is_ok());
    }

    #[test]
    fn test_trapezoid_exact_for_linear() {
        let x = [0.0, 0.5, 2.0, 2.5];
        let f: Vec<f64> = x.iter().map(|x| 3.0 * x + 1.0).collect();
        let value = QuadratureRule::Trapezoid.integrate_1d(&x, &f).unwrap();
        assert_relative_eq!(value, 1.5 * 6.25 + 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_three_dimensional_integral() {
        let mesher = FdmMesherComposite::new(vec![
            Fdm1dMesher::uniform(0.0, 1.0, 5).unwrap(),
            Fdm1dMesher::from_locations(vec![-1.0, -0.2, 0.0, 0.7, 1.0]).unwrap(),
            Fdm1dMesher::uniform(1.0, 3.0, 3).unwrap(),
        ])
        .unwrap();
        let integral = FdmMesherIntegral::new(&mesher, QuadratureRule::Simpson).unwrap();
        let x = mesher.locations(0).unwrap();
        let y = mesher.locations(1).unwrap();
        let z = mesher.locations(2).unwrap();
        let f: Vec<f64> = (0..x.len()).map(|i| x[i] * y[i] * y[i] * z[i]).collect();
        // (1/2)·(2/3)·4
        assert_relative_eq!(integral.integrate(&f).unwrap(), 4.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_integrand_length_checked() {
        let mesher = FdmMesherComposite::new(vec![Fdm1dMesher::uniform(0.0, 1.0, 5).unwrap()])
            .unwrap();
        let integral = FdmMesherIntegral::new(&mesher, QuadratureRule::Trapezoid).unwrap();
        assert!(integral.integrate(&[1.0; 4]).is_err());
    }
}
