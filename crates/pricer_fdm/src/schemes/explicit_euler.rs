use super::{axpy, begin_step, FdmScheme};
use crate::boundary::BoundaryConditionSet;
use crate::error::FdmResult;
use crate::operators::FdmLinearOpComposite;

/// `a ← a + dt·L·a`.
///
/// Conditionally stable; for diffusion `dt` must stay below about `h²/(2σ²)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExplicitEulerScheme;

impl ExplicitEulerScheme {
    /// Explicit Euler stepper.
    pub fn new() -> Self {
        Self
    }
}

/// Explicit part `a ← a + θ·dt·L·a`, boundary conditions enforced after.
pub(crate) fn explicit_step(
    op: &mut dyn FdmLinearOpComposite,
    bc_set: &BoundaryConditionSet,
    a: &mut [f64],
    t: f64,
    dt: f64,
    theta: f64,
) -> FdmResult<()> {
    let t_new = begin_step(op, t, dt)?;
    let next = axpy(a, theta * dt, &op.apply(a)?);
    a.copy_from_slice(&next);
    bc_set.apply_after_applying(a, t_new)
}

impl FdmScheme for ExplicitEulerScheme {
    fn step(
        &self,
        op: &mut dyn FdmLinearOpComposite,
        bc_set: &BoundaryConditionSet,
        a: &mut [f64],
        t: f64,
        dt: f64,
    ) -> FdmResult<()> {
        explicit_step(op, bc_set, a, t, dt, 1.0)
    }
}
