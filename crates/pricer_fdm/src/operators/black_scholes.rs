//! Black-Scholes generator in log-spot coordinates.

use super::composite::FdmLinearOpComposite;
use super::{FdmLinearOp, RowCoefficients, SparseMatrix, TripleBandLinearOp};
use crate::error::{FdmError, FdmResult};
use crate::layout::FdmLinearOpLayout;
use crate::market::YieldCurve;
use crate::meshers::FdmMesher;
use std::sync::Arc;
use tracing::{debug, trace};

/// `L = (r - q - σ²/2)·∂x + σ²/2·∂xx - r` on the log-spot axis `x = ln S`.
///
/// The rates are the forward rates of the curves over the interval passed to
/// [`FdmLinearOpComposite::set_time`]. On a multi-dimensional layout the other
/// directions are zero operators.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pricer_fdm::market::FlatCurve;
/// use pricer_fdm::meshers::{Fdm1dMesher, FdmMesherComposite};
/// use pricer_fdm::operators::{FdmBlackScholesOp, FdmLinearOpComposite};
///
/// let mesher = FdmMesherComposite::new(vec![
///     Fdm1dMesher::uniform(100f64.ln() - 2.0, 100f64.ln() + 2.0, 101).unwrap(),
/// ])
/// .unwrap();
/// let mut op = FdmBlackScholesOp::new(
///     &mesher,
///     0,
///     Arc::new(FlatCurve::new(0.05)),
///     Arc::new(FlatCurve::new(0.0)),
///     0.2,
/// )
/// .unwrap();
/// op.set_time(0.0, 0.1).unwrap();
///
/// // a constant is discounted at r
/// let lu = op.apply(&vec![1.0; 101]).unwrap();
/// assert!((lu[50] + 0.05).abs() < 1e-12);
/// ```
#[derive(Clone)]
pub struct FdmBlackScholesOp {
    axis: usize,
    layout: Arc<FdmLinearOpLayout>,
    dx: TripleBandLinearOp,
    dxx: TripleBandLinearOp,
    map: TripleBandLinearOp,
    r_curve: Arc<dyn YieldCurve>,
    q_curve: Arc<dyn YieldCurve>,
    volatility: f64,
    rates: (f64, f64),
}

impl FdmBlackScholesOp {
    /// Build the operator along the log-spot `axis` of `mesher`.
    ///
    /// Coefficients are initialised for the instant `t = 0`.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` for a negative or non-finite volatility, or
    /// any error of the derivative construction.
    pub fn new<M: FdmMesher + ?Sized>(
        mesher: &M,
        axis: usize,
        r_curve: Arc<dyn YieldCurve>,
        q_curve: Arc<dyn YieldCurve>,
        volatility: f64,
    ) -> FdmResult<Self> {
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(FdmError::configuration(format!(
                "volatility must be finite and non-negative, got {}",
                volatility
            )));
        }
        let dx = TripleBandLinearOp::first_derivative(axis, mesher)?;
        let dxx = TripleBandLinearOp::second_derivative(axis, mesher)?;
        let layout = mesher.layout().clone();
        debug!(axis, size = layout.size(), volatility, "black-scholes operator");
        let mut op = Self {
            axis,
            layout,
            map: dx.clone(),
            dx,
            dxx,
            r_curve,
            q_curve,
            volatility,
            rates: (0.0, 0.0),
        };
        op.set_time(0.0, 0.0)?;
        Ok(op)
    }

    /// Forward rates `(r, q)` of the current interval.
    pub fn rates(&self) -> (f64, f64) {
        self.rates
    }

    /// The assembled one-dimensional operator of the current interval.
    pub fn operator(&self) -> &TripleBandLinearOp {
        &self.map
    }

    fn check_direction(&self, direction: usize) -> FdmResult<()> {
        if direction >= self.layout.dim() {
            return Err(FdmError::index(format!(
                "direction {} of an operator with {} directions",
                direction,
                self.layout.dim()
            )));
        }
        Ok(())
    }
}

impl FdmLinearOpComposite for FdmBlackScholesOp {
    fn size(&self) -> usize {
        self.layout.size()
    }

    fn directions(&self) -> usize {
        self.layout.dim()
    }

    fn set_time(&mut self, t1: f64, t2: f64) -> FdmResult<()> {
        let r = self.r_curve.forward_rate(t1, t2)?;
        let q = self.q_curve.forward_rate(t1, t2)?;
        let half_var = 0.5 * self.volatility * self.volatility;
        self.map = TripleBandLinearOp::axpyb(
            RowCoefficients::Constant(r - q - half_var),
            &self.dx,
            &self.dxx.mult(RowCoefficients::Constant(half_var))?,
            RowCoefficients::Constant(-r),
        )?;
        self.rates = (r, q);
        trace!(t1, t2, r, q, "black-scholes coefficients");
        Ok(())
    }

    fn apply(&self, r: &[f64]) -> FdmResult<Vec<f64>> {
        self.map.apply(r)
    }

    fn apply_mixed(&self, r: &[f64]) -> FdmResult<Vec<f64>> {
        FdmError::check_len("vector", r.len(), self.size())?;
        Ok(vec![0.0; r.len()])
    }

    fn apply_direction(&self, direction: usize, r: &[f64]) -> FdmResult<Vec<f64>> {
        self.check_direction(direction)?;
        if direction == self.axis {
            self.map.apply(r)
        } else {
            self.apply_mixed(r)
        }
    }

    fn solve_direction(&self, direction: usize, r: &[f64], s: f64) -> FdmResult<Vec<f64>> {
        self.check_direction(direction)?;
        if direction == self.axis {
            self.map.solve_scaled(r, s, 1.0)
        } else {
            FdmError::check_len("right-hand side", r.len(), self.size())?;
            Ok(r.to_vec())
        }
    }

    fn preconditioner(&self, r: &[f64], s: f64) -> FdmResult<Vec<f64>> {
        self.solve_direction(self.axis, r, s)
    }

    fn to_matrix_decomposition(&self) -> FdmResult<Vec<SparseMatrix>> {
        let n = self.size();
        (0..self.directions())
            .map(|d| {
                if d == self.axis {
                    self.map.to_matrix()
                } else {
                    SparseMatrix::from_triplets(n, n, std::iter::empty())
                }
            })
            .collect()
    }
}
