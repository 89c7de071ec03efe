use super::{begin_step, FdmScheme};
use crate::boundary::BoundaryConditionSet;
use crate::error::FdmResult;
use crate::math::{BiCGStab, BiCGStabConfig};
use crate::operators::FdmLinearOpComposite;
use tracing::trace;

/// Relative residual at which the implicit system counts as solved.
pub(crate) const RELATIVE_TOLERANCE: f64 = 1e-8;

/// Solve `(I - dt·L)·x = a`.
///
/// The full operator is not split, so the system is solved with BiCGStab,
/// preconditioned by the direction-0 line solve. The iteration limit is
/// `max(10, n)` for `n` grid points.
#[derive(Clone, Copy, Debug)]
pub struct ImplicitEulerScheme {
    tolerance: f64,
}

impl Default for ImplicitEulerScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl ImplicitEulerScheme {
    /// Implicit Euler stepper with relative tolerance `1e-8`.
    pub fn new() -> Self {
        Self {
            tolerance: RELATIVE_TOLERANCE,
        }
    }
}

/// Implicit part: solve `(I - θ·dt·L)·x = a`, boundary conditions enforced
/// around the solve.
pub(crate) fn implicit_step(
    op: &mut dyn FdmLinearOpComposite,
    bc_set: &BoundaryConditionSet,
    a: &mut [f64],
    t: f64,
    dt: f64,
    theta: f64,
    tolerance: f64,
) -> FdmResult<()> {
    let t_new = begin_step(op, t, dt)?;
    let mut rhs = a.to_vec();
    bc_set.apply_before_solving(&mut rhs, t_new)?;

    let op: &dyn FdmLinearOpComposite = op;
    let s = -theta * dt;
    let system = |x: &[f64]| -> FdmResult<Vec<f64>> {
        let lx = op.apply(x)?;
        Ok(x.iter().zip(&lx).map(|(x, l)| x + s * l).collect())
    };
    let preconditioner = |r: &[f64]| op.preconditioner(r, s);

    let config = BiCGStabConfig::new(tolerance, rhs.len().max(10))?;
    let result = BiCGStab::new(config).solve(system, preconditioner, &rhs, Some(a))?;
    trace!(iterations = result.iterations, error = result.error, "implicit step");

    a.copy_from_slice(&result.x);
    bc_set.apply_after_solving(a, t_new)
}

impl FdmScheme for ImplicitEulerScheme {
    fn step(
        &self,
        op: &mut dyn FdmLinearOpComposite,
        bc_set: &BoundaryConditionSet,
        a: &mut [f64],
        t: f64,
        dt: f64,
    ) -> FdmResult<()> {
        implicit_step(op, bc_set, a, t, dt, 1.0, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundarySide, DirichletBoundary};
    use crate::error::FdmError;
    use crate::meshers::FdmMesher;
    use crate::schemes::test_support::{heat_operator, reaction_operator};

    #[test]
    fn test_single_step_is_backward_euler() {
        let mut op = reaction_operator(5, -1.0);
        let mut a = vec![1.1, 2.2, 3.3, 4.4, 5.5];
        let expected: Vec<f64> = a.iter().map(|v| v / 1.5).collect();
        ImplicitEulerScheme::new()
            .step(&mut op, &BoundaryConditionSet::new(), &mut a, 0.5, 0.5)
            .unwrap();
        for (v, e) in a.iter().zip(&expected) {
            assert!((v - e).abs() < 1e-10);
        }
    }

    #[test]
    fn test_heat_equation_with_large_steps() {
        let (mesher, mut op) = heat_operator();
        let bcs = BoundaryConditionSet::new()
            .with(DirichletBoundary::constant(&mesher, 0, BoundarySide::Lower, 0.0).unwrap())
            .with(DirichletBoundary::constant(&mesher, 0, BoundarySide::Upper, 0.0).unwrap());
        let x = mesher.locations(0).unwrap();
        let mut a: Vec<f64> = x.iter().map(|x| x.sin()).collect();

        // dt far beyond the explicit stability limit
        let (dt, steps) = (0.05, 10);
        let mut t = 0.5;
        for _ in 0..steps {
            ImplicitEulerScheme::new().step(&mut op, &bcs, &mut a, t, dt).unwrap();
            t -= dt;
        }
        // backward Euler damping factor of the first mode
        let decay = (1.0 + dt).powi(-(steps as i32));
        for (v, x) in a.iter().zip(&x) {
            assert!((v - x.sin() * decay).abs() < 5e-3);
        }
    }

    #[test]
    fn test_singular_system_fails() {
        // I - dt·c·I vanishes for c = 1/dt
        let mut op = reaction_operator(3, 2.0);
        let mut a = vec![1.0, 1.0, 1.0];
        let bc_set = BoundaryConditionSet::new();
        let result = ImplicitEulerScheme::new().step(&mut op, &bc_set, &mut a, 0.5, 0.5);
        assert!(matches!(result, Err(FdmError::NumericalSolve(_))));
    }
}
