use super::{axpy, begin_step, check_mu, check_theta, difference, directional_sweep, FdmScheme};
use crate::boundary::BoundaryConditionSet;
use crate::error::FdmResult;
use crate::operators::FdmLinearOpComposite;

/// Hundsdorfer-Verwer ADI scheme.
///
/// ```text
/// y0 = a + dt·L·a
/// y  = sweep of y0 against a
/// ỹ  = y0 + μ·dt·L·(y - a)
/// ỹ ← (I - θ·dt·L_i)⁻¹ (ỹ - θ·dt·L_i·y)     for every direction i
/// ```
#[derive(Clone, Copy, Debug)]
pub struct HundsdorferScheme {
    theta: f64,
    mu: f64,
}

impl HundsdorferScheme {
    /// `theta` in `[0, 1]`, finite `mu`.
    pub fn new(theta: f64, mu: f64) -> FdmResult<Self> {
        check_theta(theta)?;
        check_mu(mu)?;
        Ok(Self { theta, mu })
    }
}

impl FdmScheme for HundsdorferScheme {
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

        let mut y0 = axpy(a, dt, &op.apply(a)?);
        bc_set.apply_after_applying(&mut y0, t_new)?;
        let y = directional_sweep(op, bc_set, y0.clone(), a, self.theta, dt, t_new)?;

        let mut yt = axpy(&y0, self.mu * dt, &op.apply(&difference(&y, a))?);
        bc_set.apply_after_applying(&mut yt, t_new)?;
        let yt = directional_sweep(op, bc_set, yt, &y, self.theta, dt, t_new)?;
        a.copy_from_slice(&yt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemes::test_support::reaction_operator;

    #[test]
    fn test_reaction_step() {
        let (dt, c) = (0.2, -1.0);
        let (theta, mu) = (0.5 + 3f64.sqrt() / 6.0, 0.5);
        let mut op = reaction_operator(3, c);
        let mut a = vec![2.0; 3];
        HundsdorferScheme::new(theta, mu)
            .unwrap()
            .step(&mut op, &BoundaryConditionSet::new(), &mut a, 1.0, dt)
            .unwrap();

        let d = 1.0 - theta * dt * c;
        let y0 = 2.0 * (1.0 + c * dt);
        let y = (y0 - theta * dt * c * 2.0) / d;
        let yt = y0 + mu * dt * c * (y - 2.0);
        let expected = (yt - theta * dt * c * y) / d;
        for v in &a {
            assert!((v - expected).abs() < 1e-14);
        }
        // second order: close to exp(c·dt)
        assert!((expected / 2.0 - (c * dt).exp()).abs() < 5e-3);
    }
}
