use super::explicit_euler::explicit_step;
use super::implicit_euler::{implicit_step, RELATIVE_TOLERANCE};
use super::{check_theta, FdmScheme};
use crate::boundary::BoundaryConditionSet;
use crate::error::FdmResult;
use crate::operators::FdmLinearOpComposite;

/// θ-method: an explicit step weighted `1 - θ` followed by an implicit step
/// weighted `θ`. θ = 0.5 is the classical Crank-Nicolson scheme.
#[derive(Clone, Copy, Debug)]
pub struct CrankNicolsonScheme {
    theta: f64,
}

impl CrankNicolsonScheme {
    /// θ-method stepper; `theta` must lie in `[0, 1]`.
    pub fn new(theta: f64) -> FdmResult<Self> {
        check_theta(theta)?;
        Ok(Self { theta })
    }

    /// Implicitness weight.
    pub fn theta(&self) -> f64 {
        self.theta
    }
}

impl FdmScheme for CrankNicolsonScheme {
    fn step(
        &self,
        op: &mut dyn FdmLinearOpComposite,
        bc_set: &BoundaryConditionSet,
        a: &mut [f64],
        t: f64,
        dt: f64,
    ) -> FdmResult<()> {
        if self.theta != 1.0 {
            explicit_step(op, bc_set, a, t, dt, 1.0 - self.theta)?;
        }
        if self.theta != 0.0 {
            implicit_step(op, bc_set, a, t, dt, self.theta, RELATIVE_TOLERANCE)?;
        }
        Ok(())
    }
}
