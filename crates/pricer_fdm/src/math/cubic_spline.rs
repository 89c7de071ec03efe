//! Natural cubic spline through a solution line.

use crate::error::InterpolationError;
use num_traits::Float;

/// Polynomial coefficients for a cubic spline segment.
///
/// Represents a cubic polynomial: `y = a + b*(x-xi) + c*(x-xi)² + d*(x-xi)³`
#[derive(Debug, Clone, Copy)]
struct SplineCoeffs<T: Float> {
    a: T,
    b: T,
    c: T,
    d: T,
}

/// Natural cubic spline interpolator with C² continuity.
///
/// The second derivative vanishes at both ends, matching the
/// zero-curvature rows of the second-derivative operator. Abscissae must be
/// strictly increasing; grids produced by the meshers always are.
///
/// # Type Parameters
///
/// * `T` - Floating-point type (e.g., `f64`, `f32`)
///
/// # Example
///
/// ```
/// use pricer_fdm::math::CubicSplineInterpolator;
///
/// let xs = [0.0, 1.0, 2.0, 3.0];
/// let ys = [0.0, 1.0, 8.0, 27.0];
///
/// let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
/// assert_eq!(spline.interpolate(2.0).unwrap(), 8.0);
/// assert!(spline.interpolate(3.5).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CubicSplineInterpolator<T: Float> {
    xs: Vec<T>,
    coeffs: Vec<SplineCoeffs<T>>,
}

impl<T: Float> CubicSplineInterpolator<T> {
    /// Construct a natural cubic spline from x and y data points.
    ///
    /// # Returns
    ///
    /// * `Err(InterpolationError::InvalidInput)` - Mismatched lengths or non-finite data
    /// * `Err(InterpolationError::InsufficientData)` - Fewer than 3 points
    /// * `Err(InterpolationError::NonMonotonicData)` - Abscissae not strictly increasing
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "xs and ys must have same length: got {} and {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 3 {
            return Err(InterpolationError::InsufficientData {
                got: xs.len(),
                need: 3,
            });
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return Err(InterpolationError::InvalidInput(
                "spline data must be finite".to_string(),
            ));
        }
        if let Some(i) = xs.windows(2).position(|w| w[1] <= w[0]) {
            return Err(InterpolationError::NonMonotonicData { index: i + 1 });
        }

        Ok(Self {
            xs: xs.to_vec(),
            coeffs: Self::compute_coefficients(xs, ys),
        })
    }

    /// Solve for the knot second derivatives `M` (Thomas algorithm on the
    /// interior equations, `M[0] = M[n-1] = 0`), then form the segment
    /// polynomials.
    fn compute_coefficients(xs: &[T], ys: &[T]) -> Vec<SplineCoeffs<T>> {
        let n = xs.len();
        let two = T::one() + T::one();
        let six = two * (two + T::one());

        let h: Vec<T> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<T> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

        // interior row i (1..n-1):
        // h[i-1]·M[i-1] + 2(h[i-1]+h[i])·M[i] + h[i]·M[i+1] = 6(slope[i] - slope[i-1])
        let mut c_prime = vec![T::zero(); n];
        let mut d_prime = vec![T::zero(); n];
        for i in 1..n - 1 {
            let sub = h[i - 1];
            let denom = two * (h[i - 1] + h[i]) - sub * c_prime[i - 1];
            c_prime[i] = h[i] / denom;
            d_prime[i] = (six * (slope[i] - slope[i - 1]) - sub * d_prime[i - 1]) / denom;
        }
        let mut m = vec![T::zero(); n];
        for i in (1..n - 1).rev() {
            m[i] = d_prime[i] - c_prime[i] * m[i + 1];
        }

        (0..n - 1)
            .map(|i| SplineCoeffs {
                a: ys[i],
                b: slope[i] - h[i] * (two * m[i] + m[i + 1]) / six,
                c: m[i] / two,
                d: (m[i + 1] - m[i]) / (six * h[i]),
            })
            .collect()
    }

    /// Find the segment index `i` with `xs[i] <= x < xs[i+1]`, clamped to
    /// `[0, n-2]`.
    #[inline]
    fn find_segment(&self, x: T) -> usize {
        let pos = self.xs.partition_point(|&xi| xi <= x);
        pos.clamp(1, self.xs.len() - 1) - 1
    }

    fn locate(&self, x: T) -> Result<(SplineCoeffs<T>, T), InterpolationError> {
        let (x_min, x_max) = self.domain();
        if !(x >= x_min && x <= x_max) {
            return Err(InterpolationError::OutOfBounds {
                x: x.to_f64().unwrap_or(f64::NAN),
                min: x_min.to_f64().unwrap_or(f64::NAN),
                max: x_max.to_f64().unwrap_or(f64::NAN),
            });
        }
        let i = self.find_segment(x);
        Ok((self.coeffs[i], x - self.xs[i]))
    }

    /// Spline value at `x`.
    pub fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        let (s, dx) = self.locate(x)?;
        Ok(s.a + dx * (s.b + dx * (s.c + dx * s.d)))
    }

    /// First derivative of the spline at `x`.
    pub fn derivative(&self, x: T) -> Result<T, InterpolationError> {
        let (s, dx) = self.locate(x)?;
        let two = T::one() + T::one();
        let three = two + T::one();
        Ok(s.b + dx * (two * s.c + three * s.d * dx))
    }

    /// Second derivative of the spline at `x`.
    pub fn second_derivative(&self, x: T) -> Result<T, InterpolationError> {
        let (s, dx) = self.locate(x)?;
        let two = T::one() + T::one();
        let six = two * (two + T::one());
        Ok(two * s.c + six * s.d * dx)
    }

    /// Valid interpolation range `(x_min, x_max)`.
    #[inline]
    pub fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Returns a reference to the x-coordinates.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ========================================
    // Construction
    // ========================================

    #[test]
    fn test_new_insufficient_data() {
        let result = CubicSplineInterpolator::new(&[0.0, 1.0], &[0.0, 1.0]);
        assert!(matches!(
            result,
            Err(InterpolationError::InsufficientData { got: 2, need: 3 })
        ));
    }

    #[test]
    fn test_new_rejects_unsorted_and_mismatched() {
        assert!(matches!(
            CubicSplineInterpolator::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]),
            Err(InterpolationError::NonMonotonicData { index: 2 })
        ));
        assert!(matches!(
            CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0]),
            Err(InterpolationError::InvalidInput(_))
        ));
    }

    // ========================================
    // Evaluation
    // ========================================

    #[test]
    fn test_interpolate_at_knots() {
        let xs = [0.0, 0.5, 1.5, 2.0, 3.5];
        let ys = [1.0, -1.0, 0.25, 4.0, 2.0];
        let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            assert_relative_eq!(spline.interpolate(x).unwrap(), y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_reproduces_linear_data() {
        let xs = [0.0, 0.3, 1.0, 1.2, 2.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x - 1.0).collect();
        let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
        assert_relative_eq!(spline.interpolate(0.77).unwrap(), 0.54, epsilon = 1e-12);
        assert_relative_eq!(spline.derivative(1.5).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(spline.second_derivative(1.5).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_bounds() {
        let spline = CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        assert!(matches!(
            spline.interpolate(-0.1),
            Err(InterpolationError::OutOfBounds { .. })
        ));
        assert!(spline.derivative(f64::NAN).is_err());
        assert!(spline.interpolate(2.0).is_ok());
    }

    #[test]
    fn test_fine_grid_derivatives_converge() {
        let xs: Vec<f64> = (0..201).map(|i| -2.0 + 4.0 * i as f64 / 200.0).collect();
        let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
        let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
        let x = 0.3137;
        assert_relative_eq!(spline.interpolate(x).unwrap(), x.sin(), epsilon = 1e-8);
        assert_relative_eq!(spline.derivative(x).unwrap(), x.cos(), epsilon = 1e-5);
        assert_relative_eq!(spline.second_derivative(x).unwrap(), -x.sin(), epsilon = 1e-3);
    }

    #[test]
    fn test_c2_continuity_at_interior_knots() {
        let xs = [0.0, 1.0, 1.5, 3.0, 4.0];
        let ys = [0.0, 2.0, 1.0, 3.0, 0.5];
        let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
        let eps = 1e-7;
        for &x in &xs[1..4] {
            let left = spline.second_derivative(x - eps).unwrap();
            let right = spline.second_derivative(x + eps).unwrap();
            assert_relative_eq!(left, right, epsilon = 1e-4);
        }
        assert_relative_eq!(spline.second_derivative(0.0).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(spline.second_derivative(4.0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_with_f32() {
        let spline =
            CubicSplineInterpolator::new(&[0.0f32, 1.0, 2.0], &[0.0f32, 1.0, 0.0]).unwrap();
        assert!((spline.interpolate(1.0f32).unwrap() - 1.0).abs() < 1e-6);
    }
}
