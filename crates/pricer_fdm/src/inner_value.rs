//! Intrinsic values of a contract on the grid.

use crate::error::{FdmError, FdmResult};
use crate::integral::QuadratureRule;
use crate::meshers::{mirrored_spacings, FdmMesher};
use std::fmt;
use std::sync::Arc;

/// Intrinsic value per grid point, used for terminal conditions and early
/// exercise.
pub trait InnerValueCalculator: Send + Sync {
    /// Number of grid points covered.
    fn size(&self) -> usize;

    /// Payoff at the grid point `index` at time `t`.
    fn inner_value(&self, index: usize, t: f64) -> FdmResult<f64>;

    /// Payoff averaged over the cell around `index`.
    ///
    /// Used for terminal conditions so that payoff discontinuities between
    /// two nodes are seen by both.
    fn avg_inner_value(&self, index: usize, t: f64) -> FdmResult<f64>;

    /// `avg_inner_value` at every grid point.
    fn avg_inner_values(&self, t: f64) -> FdmResult<Vec<f64>> {
        (0..self.size()).map(|i| self.avg_inner_value(i, t)).collect()
    }
}

/// Number of Simpson intervals per cell.
const CELL_INTERVALS: usize = 100;

/// Payoff of the spot `S = exp(x)` where `x` is the log-spot along one axis.
///
/// Cell averages are taken over `[x - h⁻/2, x + h⁺/2]`, mirroring the
/// missing spacing at the edges of the axis.
///
/// # Example
///
/// ```
/// use pricer_fdm::inner_value::{InnerValueCalculator, LogInnerValueCalculator};
/// use pricer_fdm::meshers::{Fdm1dMesher, FdmMesherComposite};
///
/// let strike: f64 = 100.0;
/// let mesher = FdmMesherComposite::new(vec![
///     Fdm1dMesher::uniform(strike.ln() - 1.0, strike.ln() + 1.0, 21).unwrap(),
/// ])
/// .unwrap();
/// let call = LogInnerValueCalculator::new(&mesher, 0, move |s| (s - strike).max(0.0)).unwrap();
///
/// // the node at index 10 sits on the strike up to rounding
/// assert!(call.inner_value(10, 0.0).unwrap().abs() < 1e-10);
/// assert!(call.avg_inner_value(10, 0.0).unwrap() > 0.0);
/// ```
#[derive(Clone)]
pub struct LogInnerValueCalculator {
    payoff: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
    log_spots: Vec<f64>,
    cells: Vec<(f64, f64)>,
}

impl fmt::Debug for LogInnerValueCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogInnerValueCalculator")
            .field("size", &self.log_spots.len())
            .finish_non_exhaustive()
    }
}

impl LogInnerValueCalculator {
    /// Payoff `payoff(exp(x))` with `x` read from `axis` of `mesher`.
    pub fn new<M, F>(mesher: &M, axis: usize, payoff: F) -> FdmResult<Self>
    where
        M: FdmMesher + ?Sized,
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        let layout = mesher.layout();
        layout.check_axis(axis)?;
        let log_spots = mesher.locations(axis)?;
        let cells = layout
            .iter()
            .map(|point| {
                let (hm, hp) = mirrored_spacings(mesher, &point.coordinates, axis)?;
                let x = log_spots[point.index];
                Ok((x - 0.5 * hm, x + 0.5 * hp))
            })
            .collect::<FdmResult<Vec<_>>>()?;
        Ok(Self {
            payoff: Arc::new(payoff),
            log_spots,
            cells,
        })
    }

    fn check_index(&self, index: usize) -> FdmResult<()> {
        if index >= self.log_spots.len() {
            return Err(FdmError::index(format!(
                "grid index {} out of range for {} points",
                index,
                self.log_spots.len()
            )));
        }
        Ok(())
    }
}

impl InnerValueCalculator for LogInnerValueCalculator {
    fn size(&self) -> usize {
        self.log_spots.len()
    }

    fn inner_value(&self, index: usize, _t: f64) -> FdmResult<f64> {
        self.check_index(index)?;
        Ok((self.payoff)(self.log_spots[index].exp()))
    }

    fn avg_inner_value(&self, index: usize, _t: f64) -> FdmResult<f64> {
        self.check_index(index)?;
        let (a, b) = self.cells[index];
        let h = (b - a) / CELL_INTERVALS as f64;
        let xs: Vec<f64> = (0..=CELL_INTERVALS).map(|k| a + h * k as f64).collect();
        let fs: Vec<f64> = xs.iter().map(|x| (self.payoff)(x.exp())).collect();
        Ok(QuadratureRule::Simpson.integrate_1d(&xs, &fs)? / (b - a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshers::{Fdm1dMesher, FdmMesherComposite};
    use approx::assert_relative_eq;

    fn mesher() -> FdmMesherComposite {
        FdmMesherComposite::new(vec![Fdm1dMesher::uniform(-1.0, 1.0, 5).unwrap()]).unwrap()
    }

    #[test]
    fn test_inner_value_uses_spot() {
        let calc = LogInnerValueCalculator::new(&mesher(), 0, |s| s).unwrap();
        assert_relative_eq!(calc.inner_value(0, 0.0).unwrap(), (-1.0f64).exp());
        assert_relative_eq!(calc.inner_value(2, 0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_cell_average_of_exponential() {
        // payoff S = e^x averaged over [x - h/2, x + h/2]
        let calc = LogInnerValueCalculator::new(&mesher(), 0, |s| s).unwrap();
        let h: f64 = 0.5;
        let expected = ((0.5 * h).exp() - (-0.5 * h).exp()) / h;
        assert_relative_eq!(calc.avg_inner_value(2, 0.0).unwrap(), expected, epsilon = 1e-10);
        // the edge cell mirrors the inner spacing
        let edge = (-1.0f64).exp() * expected;
        assert_relative_eq!(calc.avg_inner_value(0, 0.0).unwrap(), edge, epsilon = 1e-10);
    }

    #[test]
    fn test_cell_average_of_digital_step() {
        // strike at the node: about half the cell is in the money
        let calc = LogInnerValueCalculator::new(&mesher(), 0, |s| if s >= 1.0 { 1.0 } else { 0.0 })
            .unwrap();
        assert_relative_eq!(calc.avg_inner_value(2, 0.0).unwrap(), 0.5, epsilon = 1e-2);
        assert_relative_eq!(calc.avg_inner_value(4, 0.0).unwrap(), 1.0, epsilon = 1e-12);
        let all = calc.avg_inner_values(0.0).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0], 0.0);
    }

    #[test]
    fn test_index_out_of_range() {
        let calc = LogInnerValueCalculator::new(&mesher(), 0, |s| s).unwrap();
        assert!(matches!(calc.inner_value(5, 0.0), Err(FdmError::Index(_))));
        assert!(LogInnerValueCalculator::new(&mesher(), 1, |s| s).is_err());
    }
}
