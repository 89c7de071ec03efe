use super::{axpy, begin_step, check_mu, check_theta, difference, directional_sweep, FdmScheme};
use crate::boundary::BoundaryConditionSet;
use crate::error::FdmResult;
use crate::operators::FdmLinearOpComposite;

/// Douglas predictor shared by both Craig-Sneyd variants: returns
/// `(y0, y)` with `y0 = a + dt·L·a` and `y` after the first sweep.
fn predictor(
    op: &dyn FdmLinearOpComposite,
    bc_set: &BoundaryConditionSet,
    a: &[f64],
    theta: f64,
    dt: f64,
    t_new: f64,
) -> FdmResult<(Vec<f64>, Vec<f64>)> {
    let mut y0 = axpy(a, dt, &op.apply(a)?);
    bc_set.apply_after_applying(&mut y0, t_new)?;
    let y = directional_sweep(op, bc_set, y0.clone(), a, theta, dt, t_new)?;
    Ok((y0, y))
}

/// Craig-Sneyd ADI scheme.
///
/// Douglas predictor `y`, then a corrector
/// `ỹ = y0 + μ·dt·L_mixed·(y - a)` swept once more against `a`. Second
/// order in time for θ = 1/2 with mixed derivatives.
#[derive(Clone, Copy, Debug)]
pub struct CraigSneydScheme {
    theta: f64,
    mu: f64,
}

impl CraigSneydScheme {
    /// `theta` in `[0, 1]`, finite `mu`.
    pub fn new(theta: f64, mu: f64) -> FdmResult<Self> {
        check_theta(theta)?;
        check_mu(mu)?;
        Ok(Self { theta, mu })
    }
}

impl FdmScheme for CraigSneydScheme {
    fn step(
        &self,
        op: &mut dyn FdmLinearOpComposite,
        bc_set: &BoundaryConditionSet,
        a: &mut [f64],
        t: f64,
        dt: f64,
    ) -> FdmResult<()> {
        let t_new = begin_step(op, t, dt)?;
        let op: &dyn FdmLinearOpComposite = op;
        let (y0, y) = predictor(op, bc_set, a, self.theta, dt, t_new)?;

        let mut yt = axpy(&y0, self.mu * dt, &op.apply_mixed(&difference(&y, a))?);
        bc_set.apply_after_applying(&mut yt, t_new)?;

        let yt = directional_sweep(op, bc_set, yt, a, self.theta, dt, t_new)?;
        a.copy_from_slice(&yt);
        Ok(())
    }
}

/// Modified Craig-Sneyd ADI scheme (in 't Hout and Foulon).
///
/// As [`CraigSneydScheme`] with the corrector extended to
/// `ỹ = y0 + μ·dt·L_mixed·(y - a) + (1/2 - μ)·dt·L·(y - a)`.
#[derive(Clone, Copy, Debug)]
pub struct ModifiedCraigSneydScheme {
    theta: f64,
    mu: f64,
}

impl ModifiedCraigSneydScheme {
    /// `theta` in `[0, 1]`, finite `mu`.
    pub fn new(theta: f64, mu: f64) -> FdmResult<Self> {
        check_theta(theta)?;
        check_mu(mu)?;
        Ok(Self { theta, mu })
    }
}

impl FdmScheme for ModifiedCraigSneydScheme {
    fn step(
        &self,
        op: &mut dyn FdmLinearOpComposite,
        bc_set: &BoundaryConditionSet,
        a: &mut [f64],
        t: f64,
        dt: f64,
    ) -> FdmResult<()> {
        let t_new = begin_step(op, t, dt)?;
        let op: &dyn FdmLinearOpComposite = op;
        let (y0, y) = predictor(op, bc_set, a, self.theta, dt, t_new)?;

        let delta = difference(&y, a);
        let yt = axpy(&y0, self.mu * dt, &op.apply_mixed(&delta)?);
        let mut yt = axpy(&yt, (0.5 - self.mu) * dt, &op.apply(&delta)?);
        bc_set.apply_after_applying(&mut yt, t_new)?;

        let yt = directional_sweep(op, bc_set, yt, a, self.theta, dt, t_new)?;
        a.copy_from_slice(&yt);
        Ok(())
    }
}
