//! Tridiagonal operator along one axis of a layout.
//!
//! Along its axis the operator is tridiagonal on every grid line, across the
//! other axes it is block diagonal. Row `i` reads
//!
//! ```text
//! (L u)[i] = lower[i]·u[i0[i]] + diag[i]·u[i] + upper[i]·u[i2[i]]
//! ```
//!
//! where `i0`/`i2` are the previous/next point on the same line. At the first
//! point of a line `lower` is zero, at the last point `upper` is zero, so no
//! row ever couples two lines.

use super::{FdmLinearOp, SparseMatrix, LINE_MIN_LEN, ROW_MIN_LEN};
use crate::error::{FdmError, FdmResult};
use crate::layout::FdmLinearOpLayout;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::trace;

/// Pivot magnitude, relative to its row, below which a line solve fails.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Per-row coefficients of the operator algebra: one value broadcast to every
/// row, or one value per row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RowCoefficients<'a> {
    /// Same coefficient on every row.
    Constant(f64),
    /// Row `i` uses element `i`.
    PerRow(&'a [f64]),
}

impl RowCoefficients<'_> {
    #[inline]
    pub(crate) fn at(&self, i: usize) -> f64 {
        match self {
            RowCoefficients::Constant(c) => *c,
            RowCoefficients::PerRow(v) => v[i],
        }
    }

    pub(crate) fn check(&self, what: &str, size: usize) -> FdmResult<()> {
        match self {
            RowCoefficients::Constant(_) => Ok(()),
            RowCoefficients::PerRow(v) => FdmError::check_len(what, v.len(), size),
        }
    }
}

impl From<f64> for RowCoefficients<'_> {
    fn from(value: f64) -> Self {
        RowCoefficients::Constant(value)
    }
}

impl<'a> From<&'a [f64]> for RowCoefficients<'a> {
    fn from(values: &'a [f64]) -> Self {
        RowCoefficients::PerRow(values)
    }
}

impl<'a> From<&'a Vec<f64>> for RowCoefficients<'a> {
    fn from(values: &'a Vec<f64>) -> Self {
        RowCoefficients::PerRow(values.as_slice())
    }
}

/// Tridiagonal-per-line operator along `axis`.
#[derive(Clone, Debug, PartialEq)]
pub struct TripleBandLinearOp {
    axis: usize,
    layout: Arc<FdmLinearOpLayout>,
    i0: Vec<usize>,
    i2: Vec<usize>,
    lower: Vec<f64>,
    diag: Vec<f64>,
    upper: Vec<f64>,
}

impl TripleBandLinearOp {
    /// Build from explicit bands.
    ///
    /// Entries of `lower` at the first point and of `upper` at the last point
    /// of each line are discarded.
    ///
    /// # Errors
    ///
    /// `FdmError::Index` for an axis outside the layout and
    /// `FdmError::Configuration` for bands of the wrong length.
    pub fn from_bands(
        axis: usize,
        layout: Arc<FdmLinearOpLayout>,
        mut lower: Vec<f64>,
        diag: Vec<f64>,
        mut upper: Vec<f64>,
    ) -> FdmResult<Self> {
        layout.check_axis(axis)?;
        let n = layout.size();
        FdmError::check_len("lower band", lower.len(), n)?;
        FdmError::check_len("diagonal", diag.len(), n)?;
        FdmError::check_len("upper band", upper.len(), n)?;

        let dim = layout.dims()[axis];
        let mut i0 = Vec::with_capacity(n);
        let mut i2 = Vec::with_capacity(n);
        for i in 0..n {
            let c = layout.coordinate(i, axis);
            if c == 0 {
                lower[i] = 0.0;
            }
            if c + 1 == dim {
                upper[i] = 0.0;
            }
            i0.push(layout.line_neighbor(i, axis, -1));
            i2.push(layout.line_neighbor(i, axis, 1));
        }
        Ok(Self {
            axis,
            layout,
            i0,
            i2,
            lower,
            diag,
            upper,
        })
    }

    /// Identity operator along `axis`.
    pub fn identity(axis: usize, layout: Arc<FdmLinearOpLayout>) -> FdmResult<Self> {
        let n = layout.size();
        Self::from_bands(axis, layout, vec![0.0; n], vec![1.0; n], vec![0.0; n])
    }

    /// Zero operator along `axis`.
    pub fn zeros(axis: usize, layout: Arc<FdmLinearOpLayout>) -> FdmResult<Self> {
        let n = layout.size();
        Self::from_bands(axis, layout, vec![0.0; n], vec![0.0; n], vec![0.0; n])
    }

    /// Axis the operator differentiates along.
    #[inline]
    pub fn axis(&self) -> usize {
        self.axis
    }

    /// Index space of the operator.
    #[inline]
    pub fn layout(&self) -> &Arc<FdmLinearOpLayout> {
        &self.layout
    }

    /// Coefficients of `u[i0[i]]`.
    #[inline]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Coefficients of `u[i]`.
    #[inline]
    pub fn diag(&self) -> &[f64] {
        &self.diag
    }

    /// Coefficients of `u[i2[i]]`.
    #[inline]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// `a ⊙ x + y + b·I`, row by row.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use pricer_fdm::layout::FdmLinearOpLayout;
    /// use pricer_fdm::operators::{RowCoefficients, TripleBandLinearOp};
    ///
    /// let layout = Arc::new(FdmLinearOpLayout::new(vec![4]).unwrap());
    /// let id = TripleBandLinearOp::identity(0, layout.clone()).unwrap();
    /// let zero = TripleBandLinearOp::zeros(0, layout).unwrap();
    ///
    /// let op = TripleBandLinearOp::axpyb(
    ///     RowCoefficients::Constant(2.0),
    ///     &id,
    ///     &zero,
    ///     RowCoefficients::Constant(-0.5),
    /// )
    /// .unwrap();
    /// assert_eq!(op.diag(), &[1.5; 4]);
    /// ```
    pub fn axpyb(
        a: RowCoefficients<'_>,
        x: &TripleBandLinearOp,
        y: &TripleBandLinearOp,
        b: RowCoefficients<'_>,
    ) -> FdmResult<Self> {
        y.check_compatible(x)?;
        let n = y.layout.size();
        a.check("axpyb coefficient a", n)?;
        b.check("axpyb coefficient b", n)?;

        let mut out = y.clone();
        for i in 0..n {
            let ai = a.at(i);
            out.lower[i] += ai * x.lower[i];
            out.diag[i] += ai * x.diag[i] + b.at(i);
            out.upper[i] += ai * x.upper[i];
        }
        Ok(out)
    }

    /// Operator sum.
    pub fn add(&self, other: &TripleBandLinearOp) -> FdmResult<Self> {
        Self::axpyb(RowCoefficients::Constant(1.0), other, self, RowCoefficients::Constant(0.0))
    }

    /// Scale row `i` by `coefficients[i]`.
    pub fn mult(&self, coefficients: RowCoefficients<'_>) -> FdmResult<Self> {
        let n = self.layout.size();
        coefficients.check("row coefficients", n)?;
        let mut out = self.clone();
        for i in 0..n {
            let c = coefficients.at(i);
            out.lower[i] *= c;
            out.diag[i] *= c;
            out.upper[i] *= c;
        }
        Ok(out)
    }

    /// Solve `(I - θ·dt·L)·x = rhs`.
    pub fn solve_splitting(&self, rhs: &[f64], dt: f64, theta: f64) -> FdmResult<Vec<f64>> {
        self.solve_scaled(rhs, -theta * dt, 1.0)
    }

    /// Solve `(a·L + b·I)·x = rhs` with one Thomas sweep per grid line.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::NumericalSolve` if a pivot vanishes relative to its
    /// row or the sweep produces a non-finite value.
    pub fn solve_scaled(&self, rhs: &[f64], a: f64, b: f64) -> FdmResult<Vec<f64>> {
        FdmError::check_len("right-hand side", rhs.len(), self.layout.size())?;
        let starts = self.layout.line_starts(self.axis)?;
        let stride = self.layout.spacing()[self.axis];
        let dim = self.layout.dims()[self.axis];
        trace!(axis = self.axis, lines = starts.len(), dim, "tridiagonal solve");

        let lines: Vec<Vec<f64>> = starts
            .par_iter()
            .with_min_len(LINE_MIN_LEN)
            .map(|&start| self.solve_line(rhs, start, stride, dim, a, b))
            .collect::<FdmResult<Vec<_>>>()?;

        let mut x = vec![0.0; rhs.len()];
        for (&start, line) in starts.iter().zip(&lines) {
            for (k, &v) in line.iter().enumerate() {
                x[start + k * stride] = v;
            }
        }
        Ok(x)
    }

    fn solve_line(
        &self,
        rhs: &[f64],
        start: usize,
        stride: usize,
        dim: usize,
        a: f64,
        b: f64,
    ) -> FdmResult<Vec<f64>> {
        let mut x = vec![0.0; dim];
        let mut gamma = vec![0.0; dim];

        let j = start;
        let mut bet = a * self.diag[j] + b;
        check_pivot(bet, bet.abs() + (a * self.upper[j]).abs(), j)?;
        x[0] = rhs[j] / bet;

        for k in 1..dim {
            let prev = start + (k - 1) * stride;
            let j = start + k * stride;
            let sub = a * self.lower[j];
            let dia = a * self.diag[j] + b;
            let sup = a * self.upper[j];
            gamma[k] = a * self.upper[prev] / bet;
            bet = dia - sub * gamma[k];
            check_pivot(bet, sub.abs() + dia.abs() + sup.abs(), j)?;
            x[k] = (rhs[j] - sub * x[k - 1]) / bet;
        }
        for k in (0..dim.saturating_sub(1)).rev() {
            x[k] -= gamma[k + 1] * x[k + 1];
        }
        Ok(x)
    }

    fn check_compatible(&self, other: &TripleBandLinearOp) -> FdmResult<()> {
        if self.axis != other.axis {
            return Err(FdmError::configuration(format!(
                "operators along axes {} and {} cannot be combined",
                self.axis, other.axis
            )));
        }
        if self.layout != other.layout {
            return Err(FdmError::configuration(
                "operators are defined on different layouts",
            ));
        }
        Ok(())
    }
}

fn check_pivot(pivot: f64, row_scale: f64, row: usize) -> FdmResult<()> {
    if !pivot.is_finite() || pivot.abs() <= PIVOT_TOLERANCE * row_scale {
        return Err(FdmError::numerical_solve(format!(
            "vanishing pivot {:e} in tridiagonal row {}",
            pivot, row
        )));
    }
    Ok(())
}

impl FdmLinearOp for TripleBandLinearOp {
    fn size(&self) -> usize {
        self.layout.size()
    }

    fn apply(&self, r: &[f64]) -> FdmResult<Vec<f64>> {
        FdmError::check_len("vector", r.len(), self.layout.size())?;
        Ok((0..r.len())
            .into_par_iter()
            .with_min_len(ROW_MIN_LEN)
            .map(|i| {
                self.lower[i] * r[self.i0[i]] + self.diag[i] * r[i] + self.upper[i] * r[self.i2[i]]
            })
            .collect())
    }

    fn to_matrix(&self) -> FdmResult<SparseMatrix> {
        let n = self.layout.size();
        SparseMatrix::from_triplets(
            n,
            n,
            (0..n).flat_map(|i| {
                [
                    (i, self.i0[i], self.lower[i]),
                    (i, i, self.diag[i]),
                    (i, self.i2[i], self.upper[i]),
                ]
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn layout(dims: Vec<usize>) -> Arc<FdmLinearOpLayout> {
        Arc::new(FdmLinearOpLayout::new(dims).unwrap())
    }

    /// Diagonally dominant operator along `axis` with distinct row values.
    fn sample_op(axis: usize, layout: Arc<FdmLinearOpLayout>) -> TripleBandLinearOp {
        let n = layout.size();
        let lower = (0..n).map(|i| 0.3 + 0.01 * i as f64).collect();
        let diag = (0..n).map(|i| -2.0 - 0.02 * i as f64).collect();
        let upper = (0..n).map(|i| 0.7 - 0.005 * i as f64).collect();
        TripleBandLinearOp::from_bands(axis, layout, lower, diag, upper).unwrap()
    }

    #[test]
    fn test_boundary_bands_are_zero() {
        let layout = layout(vec![4, 3]);
        let op = sample_op(1, layout.clone());
        for i in 0..layout.size() {
            let c = layout.coordinates(i).unwrap()[1];
            if c == 0 {
                assert_eq!(op.lower()[i], 0.0);
            }
            if c == 2 {
                assert_eq!(op.upper()[i], 0.0);
            }
        }
    }

    #[test]
    fn test_apply_matches_matrix() {
        let layout = layout(vec![5, 4]);
        for axis in 0..2 {
            let op = sample_op(axis, layout.clone());
            let u: Vec<f64> = (0..layout.size()).map(|i| (i as f64 * 0.37).sin()).collect();
            let direct = op.apply(&u).unwrap();
            let via_matrix = op.to_matrix().unwrap().mul_vec(&u).unwrap();
            for (a, b) in direct.iter().zip(&via_matrix) {
                assert_relative_eq!(a, b, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_solve_splitting_inverts_system() {
        let layout = layout(vec![6, 5]);
        let (dt, theta) = (0.1, 0.5);
        for axis in 0..2 {
            let op = sample_op(axis, layout.clone());
            let u: Vec<f64> = (0..layout.size()).map(|i| 1.0 + (i as f64).cos()).collect();
            let lu = op.apply(&u).unwrap();
            let rhs: Vec<f64> = u.iter().zip(&lu).map(|(u, l)| u - theta * dt * l).collect();
            let x = op.solve_splitting(&rhs, dt, theta).unwrap();
            for (a, b) in x.iter().zip(&u) {
                assert_relative_eq!(a, b, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_solve_scaled_inverts_operator() {
        let layout = layout(vec![7, 3]);
        let op = sample_op(0, layout.clone());
        let u: Vec<f64> = (0..layout.size()).map(|i| i as f64 - 5.0).collect();
        let lu = op.apply(&u).unwrap();
        let x = op.solve_scaled(&lu, 1.0, 0.0).unwrap();
        for (a, b) in x.iter().zip(&u) {
            assert_relative_eq!(a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_solve_singular_operator() {
        let layout = layout(vec![4]);
        let zero = TripleBandLinearOp::zeros(0, layout).unwrap();
        let result = zero.solve_scaled(&[1.0; 4], 1.0, 0.0);
        assert!(matches!(result, Err(FdmError::NumericalSolve(_))));
    }

    #[test]
    fn test_axpyb_per_row() {
        let layout = layout(vec![3]);
        let x = sample_op(0, layout.clone());
        let y = TripleBandLinearOp::identity(0, layout).unwrap();
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![0.5, 0.0, -0.5];
        let op = TripleBandLinearOp::axpyb((&a).into(), &x, &y, (&b).into()).unwrap();
        for i in 0..3 {
            assert_relative_eq!(op.diag()[i], a[i] * x.diag()[i] + 1.0 + b[i]);
            assert_relative_eq!(op.upper()[i], a[i] * x.upper()[i]);
        }
        assert!(TripleBandLinearOp::axpyb(RowCoefficients::PerRow(&[1.0]), &x, &y, 0.0.into())
            .is_err());
    }

    #[test]
    fn test_add_and_mult() {
        let layout = layout(vec![4, 2]);
        let x = sample_op(0, layout.clone());
        let sum = x.add(&x).unwrap();
        let doubled = x.mult(RowCoefficients::Constant(2.0)).unwrap();
        assert_eq!(sum, doubled);

        let other_axis = sample_op(1, layout);
        assert!(matches!(x.add(&other_axis), Err(FdmError::Configuration(_))));
    }

    #[test]
    fn test_single_point_axis() {
        let layout = layout(vec![1, 3]);
        let op = TripleBandLinearOp::identity(0, layout).unwrap();
        let x = op.solve_scaled(&[2.0, 4.0, 6.0], 2.0, 0.0).unwrap();
        assert_eq!(x, vec![1.0, 2.0, 3.0]);
    }
}
