use super::{axpy, begin_step, check_theta, directional_sweep, FdmScheme};
use crate::boundary::BoundaryConditionSet;
use crate::error::FdmResult;
use crate::operators::FdmLinearOpComposite;

/// Douglas ADI scheme.
///
/// ```text
/// y  = a + dt·L·a
/// y ← (I - θ·dt·L_i)⁻¹ (y - θ·dt·L_i·a)     for every direction i
/// ```
///
/// The mixed part only enters explicitly.
#[derive(Clone, Copy, Debug)]
pub struct DouglasScheme {
    theta: f64,
}

impl DouglasScheme {
    /// Douglas stepper; `theta` must lie in `[0, 1]`.
    pub fn new(theta: f64) -> FdmResult<Self> {
        check_theta(theta)?;
        Ok(Self { theta })
    }
}

impl FdmScheme for DouglasScheme {
    fn step(
        &self,
        op: &mut dyn FdmLinearOpComposite,
        bc_set: &BoundaryConditionSet,
        a: &mut [f64],
        t: f64,
        dt: f64,
    ) -> FdmResult<()> {
        let t_new = begin_step(op, t, dt)?;
        let mut y = axpy(a, dt, &op.apply(a)?);
        bc_set.apply_after_applying(&mut y, t_new)?;

        let y = directional_sweep(op, bc_set, y, a, self.theta, dt, t_new)?;
        a.copy_from_slice(&y);
        Ok(())
    }
}
