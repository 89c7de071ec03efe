//! Uniformly spaced grids.

use super::{Fdm1dMesher, FdmMesher};
use crate::error::{FdmError, FdmResult};
use crate::layout::FdmLinearOpLayout;
use std::sync::Arc;

pub(crate) fn check_bounds(lower: f64, upper: f64, size: usize) -> FdmResult<()> {
    if size < 2 {
        return Err(FdmError::configuration(format!(
            "an axis needs at least 2 points, got {}",
            size
        )));
    }
    if !lower.is_finite() || !upper.is_finite() {
        return Err(FdmError::configuration(format!(
            "axis bounds must be finite: [{}, {}]",
            lower, upper
        )));
    }
    if upper <= lower {
        return Err(FdmError::configuration(format!(
            "upper bound {} must exceed lower bound {}",
            upper, lower
        )));
    }
    Ok(())
}

impl Fdm1dMesher {
    /// Uniform grid of `size` points on `[lower, upper]`.
    ///
    /// `location(i) = lower + i·dx` with `dx = (upper - lower)/(size - 1)`;
    /// the last point is exactly `upper`.
    ///
    /// # Example
    ///
    /// ```
    /// use pricer_fdm::meshers::Fdm1dMesher;
    ///
    /// let mesher = Fdm1dMesher::uniform(0.0, 1.0, 5).unwrap();
    /// assert_eq!(mesher.locations(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
    /// assert_eq!(mesher.dplus(2).unwrap(), Some(0.25));
    /// ```
    pub fn uniform(lower: f64, upper: f64, size: usize) -> FdmResult<Self> {
        check_bounds(lower, upper, size)?;
        let dx = (upper - lower) / (size - 1) as f64;
        let mut locations: Vec<f64> = (0..size).map(|i| lower + i as f64 * dx).collect();
        locations[size - 1] = upper;
        Ok(Self::from_steps(locations, &vec![dx; size - 1]))
    }
}

/// Uniform grid on every axis of a layout.
///
/// Coordinates are computed on demand from the per-axis lower bound and step,
/// nothing is stored per point.
#[derive(Clone, Debug)]
pub struct UniformGridMesher {
    layout: Arc<FdmLinearOpLayout>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    dx: Vec<f64>,
}

impl UniformGridMesher {
    /// Create a mesher spanning `bounds[i] = (lower, upper)` on axis `i`.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Configuration` if the number of bounds differs from
    /// the layout dimension, or an axis has fewer than two points or an empty
    /// interval.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use pricer_fdm::layout::FdmLinearOpLayout;
    /// use pricer_fdm::meshers::{FdmMesher, UniformGridMesher};
    ///
    /// let layout = Arc::new(FdmLinearOpLayout::new(vec![5, 3]).unwrap());
    /// let mesher = UniformGridMesher::new(layout, &[(0.0, 1.0), (-1.0, 1.0)]).unwrap();
    /// assert_eq!(mesher.location(&[2, 0], 0).unwrap(), 0.5);
    /// assert_eq!(mesher.dplus(&[2, 0], 1).unwrap(), Some(1.0));
    /// ```
    pub fn new(layout: Arc<FdmLinearOpLayout>, bounds: &[(f64, f64)]) -> FdmResult<Self> {
        if bounds.len() != layout.dim() {
            return Err(FdmError::configuration(format!(
                "{} axis bounds given for a {}-dimensional layout",
                bounds.len(),
                layout.dim()
            )));
        }
        let mut lower = Vec::with_capacity(bounds.len());
        let mut upper = Vec::with_capacity(bounds.len());
        let mut dx = Vec::with_capacity(bounds.len());
        for (&(lo, hi), &n) in bounds.iter().zip(layout.dims()) {
            check_bounds(lo, hi, n)?;
            lower.push(lo);
            upper.push(hi);
            dx.push((hi - lo) / (n - 1) as f64);
        }
        Ok(Self {
            layout,
            lower,
            upper,
            dx,
        })
    }

    /// Step size of an axis.
    pub fn dx(&self, axis: usize) -> FdmResult<f64> {
        self.layout.check_axis(axis)?;
        Ok(self.dx[axis])
    }

    fn coordinate(&self, coordinates: &[usize], axis: usize) -> FdmResult<usize> {
        self.layout.check_axis(axis)?;
        let c = coordinates.get(axis).copied().ok_or_else(|| {
            FdmError::index(format!("point {:?} has no axis {}", coordinates, axis))
        })?;
        let dim = self.layout.dims()[axis];
        if c >= dim {
            return Err(FdmError::index(format!(
                "coordinate {} on axis {} (dim {})",
                c, axis, dim
            )));
        }
        Ok(c)
    }
}

impl FdmMesher for UniformGridMesher {
    fn layout(&self) -> &Arc<FdmLinearOpLayout> {
        &self.layout
    }

    fn dminus(&self, coordinates: &[usize], axis: usize) -> FdmResult<Option<f64>> {
        let c = self.coordinate(coordinates, axis)?;
        Ok((c > 0).then_some(self.dx[axis]))
    }

    fn dplus(&self, coordinates: &[usize], axis: usize) -> FdmResult<Option<f64>> {
        let c = self.coordinate(coordinates, axis)?;
        Ok((c + 1 < self.layout.dims()[axis]).then_some(self.dx[axis]))
    }

    fn location(&self, coordinates: &[usize], axis: usize) -> FdmResult<f64> {
        let c = self.coordinate(coordinates, axis)?;
        if c + 1 == self.layout.dims()[axis] {
            return Ok(self.upper[axis]);
        }
        Ok(self.lower[axis] + c as f64 * self.dx[axis])
    }

    fn axis_locations(&self, axis: usize) -> FdmResult<Vec<f64>> {
        self.layout.check_axis(axis)?;
        let n = self.layout.dims()[axis];
        Ok((0..n)
            .map(|c| {
                if c + 1 == n {
                    self.upper[axis]
                } else {
                    self.lower[axis] + c as f64 * self.dx[axis]
                }
            })
            .collect())
    }
}
