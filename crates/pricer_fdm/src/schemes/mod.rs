//! Time-stepping schemes for the backward rollback.
//!
//! Every scheme advances `a` from time `t` to `t - dt` for the operator
//! `L` of a [`FdmLinearOpComposite`], where the backward equation reads
//! `∂u/∂τ = L·u` in time-to-maturity. Before a step the operator is told the
//! interval through `set_time(max(0, t - dt), t)`; boundary conditions are
//! invoked with `max(0, t - dt)`.
//!
//! | scheme | θ | μ |
//! |---|---|---|
//! | explicit Euler | – | – |
//! | implicit Euler | – | – |
//! | Crank-Nicolson | 0.5 | – |
//! | Douglas | 0.5 | – |
//! | Craig-Sneyd | 0.5 | 0.5 |
//! | modified Craig-Sneyd | 1/3 | 1/3 |
//! | Hundsdorfer | 1/2 + √3/6 | 0.5 |

mod craig_sneyd;
mod crank_nicolson;
mod douglas;
mod explicit_euler;
mod hundsdorfer;
mod implicit_euler;

pub use craig_sneyd::{CraigSneydScheme, ModifiedCraigSneydScheme};
pub use crank_nicolson::CrankNicolsonScheme;
pub use douglas::DouglasScheme;
pub use explicit_euler::ExplicitEulerScheme;
pub use hundsdorfer::HundsdorferScheme;
pub use implicit_euler::ImplicitEulerScheme;

use crate::boundary::BoundaryConditionSet;
use crate::error::{FdmError, FdmResult};
use crate::operators::FdmLinearOpComposite;

/// One backward time step.
pub trait FdmScheme: Send + Sync {
    /// Advance `a` from `t` to `t - dt` in place.
    fn step(
        &self,
        op: &mut dyn FdmLinearOpComposite,
        bc_set: &BoundaryConditionSet,
        a: &mut [f64],
        t: f64,
        dt: f64,
    ) -> FdmResult<()>;
}

/// Scheme family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FdmSchemeKind {
    /// Forward Euler in time-to-maturity.
    ExplicitEuler,
    /// Fully implicit Euler solved with BiCGStab.
    ImplicitEuler,
    /// θ-weighted explicit and implicit Euler.
    CrankNicolson,
    /// Douglas ADI.
    Douglas,
    /// Craig-Sneyd ADI.
    CraigSneyd,
    /// Modified Craig-Sneyd ADI.
    ModifiedCraigSneyd,
    /// Hundsdorfer-Verwer ADI.
    Hundsdorfer,
}

/// Scheme choice with its parameters.
///
/// # Example
///
/// ```
/// use pricer_fdm::schemes::{FdmSchemeDesc, FdmSchemeKind};
///
/// let desc = FdmSchemeDesc::modified_craig_sneyd();
/// assert_eq!(desc.kind, FdmSchemeKind::ModifiedCraigSneyd);
/// assert!((desc.theta - 1.0 / 3.0).abs() < 1e-15);
///
/// assert!(FdmSchemeDesc::new(FdmSchemeKind::Douglas, 1.5, 0.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FdmSchemeDesc {
    /// Scheme family.
    pub kind: FdmSchemeKind,
    /// Implicitness weight in `[0, 1]`.
    pub theta: f64,
    /// Weight of the correction step of the Craig-Sneyd and Hundsdorfer
    /// schemes.
    pub mu: f64,
}

impl Default for FdmSchemeDesc {
    /// Douglas with θ = 0.5.
    fn default() -> Self {
        Self::douglas()
    }
}

impl FdmSchemeDesc {
    /// Validated scheme description.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` if `theta` is outside `[0, 1]` or `mu` is
    /// not finite.
    pub fn new(kind: FdmSchemeKind, theta: f64, mu: f64) -> FdmResult<Self> {
        let desc = Self { kind, theta, mu };
        desc.validate()?;
        Ok(desc)
    }

    pub(crate) fn validate(&self) -> FdmResult<()> {
        check_theta(self.theta)?;
        check_mu(self.mu)
    }

    /// Douglas, θ = 0.5.
    pub fn douglas() -> Self {
        Self {
            kind: FdmSchemeKind::Douglas,
            theta: 0.5,
            mu: 0.0,
        }
    }

    /// Crank-Nicolson, θ = 0.5.
    pub fn crank_nicolson() -> Self {
        Self {
            kind: FdmSchemeKind::CrankNicolson,
            theta: 0.5,
            mu: 0.0,
        }
    }

    /// Implicit Euler.
    pub fn implicit_euler() -> Self {
        Self {
            kind: FdmSchemeKind::ImplicitEuler,
            theta: 1.0,
            mu: 0.0,
        }
    }

    /// Explicit Euler.
    pub fn explicit_euler() -> Self {
        Self {
            kind: FdmSchemeKind::ExplicitEuler,
            theta: 0.0,
            mu: 0.0,
        }
    }

    /// Craig-Sneyd, θ = μ = 0.5.
    pub fn craig_sneyd() -> Self {
        Self {
            kind: FdmSchemeKind::CraigSneyd,
            theta: 0.5,
            mu: 0.5,
        }
    }

    /// Modified Craig-Sneyd, θ = μ = 1/3.
    pub fn modified_craig_sneyd() -> Self {
        Self {
            kind: FdmSchemeKind::ModifiedCraigSneyd,
            theta: 1.0 / 3.0,
            mu: 1.0 / 3.0,
        }
    }

    /// Hundsdorfer-Verwer, θ = 1/2 + √3/6, μ = 0.5.
    pub fn hundsdorfer() -> Self {
        Self {
            kind: FdmSchemeKind::Hundsdorfer,
            theta: 0.5 + 3f64.sqrt() / 6.0,
            mu: 0.5,
        }
    }

    /// Stepper for this description.
    pub fn scheme(&self) -> FdmResult<Box<dyn FdmScheme>> {
        self.validate()?;
        let (theta, mu) = (self.theta, self.mu);
        Ok(match self.kind {
            FdmSchemeKind::ExplicitEuler => Box::new(ExplicitEulerScheme::new()),
            FdmSchemeKind::ImplicitEuler => Box::new(ImplicitEulerScheme::new()),
            FdmSchemeKind::CrankNicolson => Box::new(CrankNicolsonScheme::new(theta)?),
            FdmSchemeKind::Douglas => Box::new(DouglasScheme::new(theta)?),
            FdmSchemeKind::CraigSneyd => Box::new(CraigSneydScheme::new(theta, mu)?),
            FdmSchemeKind::ModifiedCraigSneyd => {
                Box::new(ModifiedCraigSneydScheme::new(theta, mu)?)
            }
            FdmSchemeKind::Hundsdorfer => Box::new(HundsdorferScheme::new(theta, mu)?),
        })
    }
}

/// Tell the operator about the step and return the time of the new level.
pub(crate) fn begin_step(op: &mut dyn FdmLinearOpComposite, t: f64, dt: f64) -> FdmResult<f64> {
    let t_new = (t - dt).max(0.0);
    op.set_time(t_new, t)?;
    Ok(t_new)
}

/// `a + s·b`.
#[inline]
pub(crate) fn axpy(a: &[f64], s: f64, b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(a, b)| a + s * b).collect()
}

/// `a - b`.
#[inline]
pub(crate) fn difference(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(a, b)| a - b).collect()
}

/// For every direction `i`: `y ← (I - θ·dt·L_i)⁻¹ (y - θ·dt·L_i·base)`.
///
/// Boundary conditions adjust each right-hand side and are enforced on the
/// result of each line solve, at time `t_new`.
pub(crate) fn directional_sweep(
    op: &dyn FdmLinearOpComposite,
    bc_set: &BoundaryConditionSet,
    mut y: Vec<f64>,
    base: &[f64],
    theta: f64,
    dt: f64,
    t_new: f64,
) -> FdmResult<Vec<f64>> {
    let s = -theta * dt;
    for direction in 0..op.directions() {
        let mut rhs = axpy(&y, s, &op.apply_direction(direction, base)?);
        bc_set.apply_before_solving(&mut rhs, t_new)?;
        y = op.solve_direction(direction, &rhs, s)?;
        bc_set.apply_after_solving(&mut y, t_new)?;
    }
    Ok(y)
}

pub(crate) fn check_theta(theta: f64) -> FdmResult<()> {
    if !(0.0..=1.0).contains(&theta) {
        return Err(FdmError::configuration(format!(
            "scheme theta must lie in [0, 1], got {}",
            theta
        )));
    }
    Ok(())
}

pub(crate) fn check_mu(mu: f64) -> FdmResult<()> {
    if !mu.is_finite() {
        return Err(FdmError::configuration(format!("scheme mu must be finite, got {}", mu)));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::meshers::{Fdm1dMesher, FdmMesher, FdmMesherComposite};
    use crate::operators::{FdmOperatorSet, RowCoefficients, TripleBandLinearOp};

    /// Heat equation `u_τ = u_xx` on `[0, π]` with 41 points.
    pub(crate) fn heat_operator() -> (FdmMesherComposite, FdmOperatorSet) {
        let mesher = FdmMesherComposite::new(vec![
            Fdm1dMesher::uniform(0.0, std::f64::consts::PI, 41).unwrap(),
        ])
        .unwrap();
        let dxx = TripleBandLinearOp::second_derivative(0, &mesher).unwrap();
        let op = FdmOperatorSet::new(vec![dxx], vec![]).unwrap();
        (mesher, op)
    }

    /// Reaction `u_τ = c·u` on one line.
    pub(crate) fn reaction_operator(size: usize, c: f64) -> FdmOperatorSet {
        let mesher = FdmMesherComposite::new(vec![Fdm1dMesher::uniform(0.0, 1.0, size).unwrap()])
            .unwrap();
        let layout = mesher.layout().clone();
        let op = TripleBandLinearOp::identity(0, layout)
            .unwrap()
            .mult(RowCoefficients::Constant(c))
            .unwrap();
        FdmOperatorSet::new(vec![op], vec![]).unwrap()
    }
}
