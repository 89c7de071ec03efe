//! Finite-difference derivative stencils on non-uniform grids.
//!
//! With `hm = x_i - x_{i-1}` and `hp = x_{i+1} - x_i` the interior weights
//! `(w_lower, w_diag, w_upper)` are
//!
//! | operator | weights |
//! |---|---|
//! | `∂x`   | `(-hp/(hm(hm+hp)), (hp-hm)/(hm hp), hm/(hp(hm+hp)))` |
//! | `∂xx`  | `(2/(hm(hm+hp)), -2/(hm hp), 2/(hp(hm+hp)))` |
//!
//! Both are exact for quadratics. At the edges `∂x` is one-sided and `∂xx`
//! is zero, i.e. the solution is extrapolated linearly. `∂x∂y` is the tensor
//! product of the two first-derivative stencils.

use super::nine_point::slot;
use super::{NinePointLinearOp, TripleBandLinearOp};
use crate::error::{FdmError, FdmResult};
use crate::meshers::FdmMesher;
use tracing::debug;

fn first_derivative_weights(hm: Option<f64>, hp: Option<f64>, axis: usize) -> FdmResult<[f64; 3]> {
    match (hm, hp) {
        (Some(hm), Some(hp)) => Ok([
            -hp / (hm * (hm + hp)),
            (hp - hm) / (hm * hp),
            hm / (hp * (hm + hp)),
        ]),
        (None, Some(hp)) => Ok([0.0, -1.0 / hp, 1.0 / hp]),
        (Some(hm), None) => Ok([-1.0 / hm, 1.0 / hm, 0.0]),
        (None, None) => Err(single_point(axis)),
    }
}

fn second_derivative_weights(hm: Option<f64>, hp: Option<f64>, axis: usize) -> FdmResult<[f64; 3]> {
    match (hm, hp) {
        (Some(hm), Some(hp)) => Ok([
            2.0 / (hm * (hm + hp)),
            -2.0 / (hm * hp),
            2.0 / (hp * (hm + hp)),
        ]),
        (None, None) => Err(single_point(axis)),
        _ => Ok([0.0; 3]),
    }
}

fn single_point(axis: usize) -> FdmError {
    FdmError::configuration(format!(
        "axis {} has a single point; derivatives need at least two",
        axis
    ))
}

fn banded<M, F>(axis: usize, mesher: &M, weights: F) -> FdmResult<TripleBandLinearOp>
where
    M: FdmMesher + ?Sized,
    F: Fn(Option<f64>, Option<f64>, usize) -> FdmResult<[f64; 3]>,
{
    let layout = mesher.layout().clone();
    layout.check_axis(axis)?;
    let n = layout.size();
    let mut lower = Vec::with_capacity(n);
    let mut diag = Vec::with_capacity(n);
    let mut upper = Vec::with_capacity(n);
    for point in layout.iter() {
        let hm = mesher.dminus(&point.coordinates, axis)?;
        let hp = mesher.dplus(&point.coordinates, axis)?;
        let [l, d, u] = weights(hm, hp, axis)?;
        lower.push(l);
        diag.push(d);
        upper.push(u);
    }
    TripleBandLinearOp::from_bands(axis, layout, lower, diag, upper)
}

impl TripleBandLinearOp {
    /// First-derivative operator `∂/∂x_axis`.
    ///
    /// # Example
    ///
    /// ```
    /// use pricer_fdm::meshers::{Fdm1dMesher, FdmMesherComposite};
    /// use pricer_fdm::operators::{FdmLinearOp, TripleBandLinearOp};
    ///
    /// let mesher = FdmMesherComposite::new(vec![
    ///     Fdm1dMesher::from_locations(vec![0.0, 0.1, 0.3, 0.4, 1.0]).unwrap(),
    /// ])
    /// .unwrap();
    /// let dx = TripleBandLinearOp::first_derivative(0, &mesher).unwrap();
    ///
    /// // exact for quadratics in the interior
    /// let x = [0.0, 0.1, 0.3, 0.4, 1.0];
    /// let u: Vec<f64> = x.iter().map(|x| x * x).collect();
    /// let du = dx.apply(&u).unwrap();
    /// assert!((du[2] - 0.6).abs() < 1e-12);
    /// ```
    pub fn first_derivative<M: FdmMesher + ?Sized>(axis: usize, mesher: &M) -> FdmResult<Self> {
        debug!(axis, size = mesher.layout().size(), "first derivative operator");
        banded(axis, mesher, first_derivative_weights)
    }

    /// Second-derivative operator `∂²/∂x_axis²`; edge rows are zero.
    pub fn second_derivative<M: FdmMesher + ?Sized>(axis: usize, mesher: &M) -> FdmResult<Self> {
        debug!(axis, size = mesher.layout().size(), "second derivative operator");
        banded(axis, mesher, second_derivative_weights)
    }
}

impl NinePointLinearOp {
    /// Mixed second-derivative operator `∂²/∂x_axis1 ∂x_axis2`.
    ///
    /// The operator is symmetric in its axes up to rounding:
    /// `mixed_derivative(a, b)` and `mixed_derivative(b, a)` produce the same
    /// matrix.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` if `axis1 == axis2` or an axis has a single
    /// point.
    pub fn mixed_derivative<M: FdmMesher + ?Sized>(
        axis1: usize,
        axis2: usize,
        mesher: &M,
    ) -> FdmResult<Self> {
        let layout = mesher.layout().clone();
        layout.check_axis(axis1)?;
        layout.check_axis(axis2)?;
        if axis1 == axis2 {
            return Err(FdmError::configuration(format!(
                "mixed derivative needs two distinct axes, got {} twice",
                axis1
            )));
        }
        debug!(axis1, axis2, size = layout.size(), "mixed derivative operator");

        let mut weights = Vec::with_capacity(layout.size());
        for point in layout.iter() {
            let c = &point.coordinates;
            let (m1, p1) = (mesher.dminus(c, axis1)?, mesher.dplus(c, axis1)?);
            let (m2, p2) = (mesher.dminus(c, axis2)?, mesher.dplus(c, axis2)?);
            let w1 = first_derivative_weights(m1, p1, axis1)?;
            let w2 = first_derivative_weights(m2, p2, axis2)?;
            let mut row = [0.0; 9];
            for (o1, a) in (-1..=1isize).zip(w1) {
                for (o2, b) in (-1..=1isize).zip(w2) {
                    row[slot(o1, o2)] = a * b;
                }
            }
            weights.push(row);
        }
        NinePointLinearOp::from_weights(axis1, axis2, layout, weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshers::{Concentration, Fdm1dMesher, FdmMesherComposite};
    use crate::operators::FdmLinearOp;
    use approx::assert_relative_eq;

    fn mesher_2d() -> FdmMesherComposite {
        FdmMesherComposite::new(vec![
            Fdm1dMesher::concentrating(-1.0, 2.0, 17, Some(Concentration::new(0.4, 0.2))).unwrap(),
            Fdm1dMesher::from_locations(vec![0.0, 0.2, 0.5, 0.6, 0.9, 1.4, 1.5]).unwrap(),
        ])
        .unwrap()
    }

    fn sample(mesher: &FdmMesherComposite, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
        let xs = mesher.locations(0).unwrap();
        let ys = mesher.locations(1).unwrap();
        xs.iter().zip(&ys).map(|(&x, &y)| f(x, y)).collect()
    }

    fn is_interior(mesher: &FdmMesherComposite, coords: &[usize], axis: usize) -> bool {
        coords[axis] > 0 && coords[axis] + 1 < mesher.layout().dims()[axis]
    }

    #[test]
    fn test_first_derivative_exact_for_quadratic() {
        let mesher = mesher_2d();
        for axis in 0..2 {
            let op = TripleBandLinearOp::first_derivative(axis, &mesher).unwrap();
            let u = sample(&mesher, |x, y| 3.0 * x * x - 2.0 * x * y + y * y + 1.0);
            let du = op.apply(&u).unwrap();
            for point in mesher.layout().iter() {
                if !is_interior(&mesher, &point.coordinates, axis) {
                    continue;
                }
                let x = mesher.location(&point.coordinates, 0).unwrap();
                let y = mesher.location(&point.coordinates, 1).unwrap();
                let expected = if axis == 0 { 6.0 * x - 2.0 * y } else { -2.0 * x + 2.0 * y };
                assert_relative_eq!(du[point.index], expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_first_derivative_one_sided_at_edges() {
        let mesher = FdmMesherComposite::new(vec![
            Fdm1dMesher::from_locations(vec![0.0, 0.5, 2.0]).unwrap(),
        ])
        .unwrap();
        let op = TripleBandLinearOp::first_derivative(0, &mesher).unwrap();
        // linear data: one-sided differences are exact
        let du = op.apply(&[1.0, 2.0, 5.0]).unwrap();
        assert_relative_eq!(du[0], 2.0);
        assert_relative_eq!(du[2], 2.0);
    }

    #[test]
    fn test_second_derivative_exact_for_quadratic() {
        let mesher = mesher_2d();
        for axis in 0..2 {
            let op = TripleBandLinearOp::second_derivative(axis, &mesher).unwrap();
            let u = sample(&mesher, |x, y| 1.5 * x * x + x * y - 0.5 * y * y);
            let d2u = op.apply(&u).unwrap();
            let expected = if axis == 0 { 3.0 } else { -1.0 };
            for point in mesher.layout().iter() {
                if is_interior(&mesher, &point.coordinates, axis) {
                    assert_relative_eq!(d2u[point.index], expected, epsilon = 1e-8);
                } else {
                    assert_eq!(d2u[point.index], 0.0);
                }
            }
        }
    }

    #[test]
    fn test_mixed_derivative_of_bilinear() {
        let mesher = mesher_2d();
        let op = NinePointLinearOp::mixed_derivative(0, 1, &mesher).unwrap();
        let u = sample(&mesher, |x, y| 2.5 * x * y + x - y);
        // tensor product of exact linear stencils, exact everywhere
        for v in op.apply(&u).unwrap() {
            assert_relative_eq!(v, 2.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_mixed_derivative_symmetric_in_axes() {
        let mesher = mesher_2d();
        let a = NinePointLinearOp::mixed_derivative(0, 1, &mesher).unwrap().to_matrix().unwrap();
        let b = NinePointLinearOp::mixed_derivative(1, 0, &mesher).unwrap().to_matrix().unwrap();
        let n = mesher.layout().size();
        for r in 0..n {
            for c in 0..n {
                assert_relative_eq!(a.get(r, c).unwrap(), b.get(r, c).unwrap(), epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_mixed_derivative_same_axis() {
        let mesher = mesher_2d();
        assert!(matches!(
            NinePointLinearOp::mixed_derivative(1, 1, &mesher),
            Err(FdmError::Configuration(_))
        ));
    }

    #[test]
    fn test_axis_out_of_range() {
        let mesher = FdmMesherComposite::new(vec![
            Fdm1dMesher::uniform(0.0, 1.0, 4).unwrap(),
            Fdm1dMesher::uniform(0.0, 1.0, 2).unwrap(),
        ])
        .unwrap();
        assert!(matches!(
            TripleBandLinearOp::first_derivative(3, &mesher),
            Err(FdmError::Index(_))
        ));
    }
}
