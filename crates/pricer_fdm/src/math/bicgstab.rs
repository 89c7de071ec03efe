//! Preconditioned BiCGStab for the non-symmetric implicit systems.

use crate::error::{FdmError, FdmResult};
use tracing::{trace, warn};

/// Configuration of the BiCGStab iteration.
///
/// # Example
///
/// ```
/// use pricer_fdm::math::BiCGStabConfig;
///
/// let config = BiCGStabConfig::default();
/// assert_eq!(config.tolerance, 1e-8);
///
/// assert!(BiCGStabConfig::new(0.0, 10).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BiCGStabConfig {
    /// Relative residual `|b - Ax| / |b|` at which the iteration stops.
    pub tolerance: f64,

    /// Maximum number of iterations before giving up.
    pub max_iterations: usize,
}

impl Default for BiCGStabConfig {
    /// Default values:
    /// - `tolerance`: 1e-8
    /// - `max_iterations`: 100
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
        }
    }
}

impl BiCGStabConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` if `tolerance` is not positive and finite or
    /// `max_iterations` is zero.
    pub fn new(tolerance: f64, max_iterations: usize) -> FdmResult<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(FdmError::configuration(format!(
                "BiCGStab tolerance must be positive, got {}",
                tolerance
            )));
        }
        if max_iterations == 0 {
            return Err(FdmError::configuration("BiCGStab needs at least one iteration"));
        }
        Ok(Self {
            tolerance,
            max_iterations,
        })
    }
}

/// Outcome of a converged solve.
#[derive(Debug, Clone, PartialEq)]
pub struct BiCGStabResult {
    /// Solution vector.
    pub x: Vec<f64>,
    /// Iterations used.
    pub iterations: usize,
    /// Final relative residual.
    pub error: f64,
}

/// BiCGStab solver for `A·x = b` with right preconditioning.
///
/// Both the matrix and the preconditioner are supplied as closures so that
/// operators never have to be assembled.
///
/// # Example
///
/// ```
/// use pricer_fdm::math::{BiCGStab, BiCGStabConfig};
///
/// // [[4, 1], [2, 3]] x = [1, 2]
/// let a = |x: &[f64]| Ok(vec![4.0 * x[0] + x[1], 2.0 * x[0] + 3.0 * x[1]]);
/// let identity = |x: &[f64]| Ok(x.to_vec());
///
/// let result = BiCGStab::new(BiCGStabConfig::default())
///     .solve(a, identity, &[1.0, 2.0], None)
///     .unwrap();
/// assert!((result.x[0] - 0.1).abs() < 1e-8);
/// assert!((result.x[1] - 0.6).abs() < 1e-8);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BiCGStab {
    config: BiCGStabConfig,
}

impl BiCGStab {
    /// Create a solver.
    pub fn new(config: BiCGStabConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &BiCGStabConfig {
        &self.config
    }

    /// Solve `A·x = b`, starting from `x0` (zero when `None`).
    ///
    /// `preconditioner` applies an approximate inverse of `A`.
    ///
    /// # Errors
    ///
    /// `FdmError::NumericalSolve` if the relative residual has not dropped
    /// below the tolerance after `max_iterations` iterations or the iteration
    /// breaks down, plus any error raised by the closures.
    pub fn solve<A, M>(
        &self,
        a: A,
        preconditioner: M,
        b: &[f64],
        x0: Option<&[f64]>,
    ) -> FdmResult<BiCGStabResult>
    where
        A: Fn(&[f64]) -> FdmResult<Vec<f64>>,
        M: Fn(&[f64]) -> FdmResult<Vec<f64>>,
    {
        let n = b.len();
        let bnorm = norm2(b);
        if bnorm == 0.0 {
            return Ok(BiCGStabResult {
                x: b.to_vec(),
                iterations: 0,
                error: 0.0,
            });
        }
        let tol = self.config.tolerance;

        let mut x = match x0 {
            Some(x0) => {
                FdmError::check_len("initial guess", x0.len(), n)?;
                x0.to_vec()
            }
            None => vec![0.0; n],
        };
        let ax = a(&x)?;
        FdmError::check_len("operator image", ax.len(), n)?;
        let mut r: Vec<f64> = b.iter().zip(&ax).map(|(b, ax)| b - ax).collect();
        let r_tld = r.clone();

        let mut p = vec![0.0; n];
        let mut v = vec![0.0; n];
        let (mut rho_tld, mut alpha, mut omega) = (1.0, 1.0, 1.0);
        let mut error = norm2(&r) / bnorm;
        let mut iterations = 0;

        while iterations < self.config.max_iterations && error >= tol {
            let rho = dot(&r_tld, &r);
            if rho == 0.0 || omega == 0.0 {
                warn!(iterations, rho, omega, error, "BiCGStab breakdown");
                break;
            }
            if iterations == 0 {
                p.copy_from_slice(&r);
            } else {
                let beta = (rho / rho_tld) * (alpha / omega);
                for i in 0..n {
                    p[i] = r[i] + beta * (p[i] - omega * v[i]);
                }
            }

            let p_tld = preconditioner(&p)?;
            v = a(&p_tld)?;
            let denom = dot(&r_tld, &v);
            if denom == 0.0 {
                warn!(iterations, error, "BiCGStab breakdown");
                break;
            }
            alpha = rho / denom;
            let s: Vec<f64> = r.iter().zip(&v).map(|(r, v)| r - alpha * v).collect();
            iterations += 1;

            let snorm = norm2(&s);
            if snorm < tol * bnorm {
                axpy(alpha, &p_tld, &mut x);
                error = snorm / bnorm;
                break;
            }

            let s_tld = preconditioner(&s)?;
            let t = a(&s_tld)?;
            let tt = dot(&t, &t);
            omega = if tt == 0.0 { 0.0 } else { dot(&t, &s) / tt };
            axpy(alpha, &p_tld, &mut x);
            axpy(omega, &s_tld, &mut x);
            for i in 0..n {
                r[i] = s[i] - omega * t[i];
            }
            error = norm2(&r) / bnorm;
            rho_tld = rho;
        }

        if !(error < tol) {
            return Err(FdmError::numerical_solve(format!(
                "BiCGStab residual {:e} after {} iterations, tolerance {:e}",
                error, iterations, tol
            )));
        }
        trace!(iterations, error, "BiCGStab converged");
        Ok(BiCGStabResult {
            x,
            iterations,
            error,
        })
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(a, b)| a * b).sum()
}

#[inline]
fn norm2(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    y.iter_mut().zip(x).for_each(|(y, x)| *y += alpha * x);
}
