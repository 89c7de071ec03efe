//! Convenience solver for one-dimensional problems.

use super::backward::FdmBackwardSolver;
use super::config::FdmSolverConfig;
use crate::boundary::BoundaryConditionSet;
use crate::error::{FdmError, FdmResult};
use crate::inner_value::InnerValueCalculator;
use crate::math::CubicSplineInterpolator;
use crate::meshers::FdmMesher;
use crate::operators::FdmLinearOpComposite;
use crate::step_conditions::{SnapshotCondition, StepConditionComposite};
use tracing::debug;

/// Terminal condition, rollback to today and spline read-out on a 1D grid.
///
/// The terminal values are the cell-averaged inner values at maturity. A
/// snapshot one time step before today is recorded for theta.
pub struct Fdm1dimSolver<O: FdmLinearOpComposite> {
    config: FdmSolverConfig,
    locations: Vec<f64>,
    initial_values: Vec<f64>,
    snapshot: usize,
    solver: FdmBackwardSolver<O>,
}

impl<O: FdmLinearOpComposite> Fdm1dimSolver<O> {
    /// Prepare a run.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` if the mesher is not one-dimensional or
    /// the operator, calculator and mesher sizes differ.
    pub fn new<M: FdmMesher + ?Sized>(
        config: FdmSolverConfig,
        mesher: &M,
        op: O,
        bc_set: BoundaryConditionSet,
        conditions: StepConditionComposite,
        calculator: &dyn InnerValueCalculator,
    ) -> FdmResult<Self> {
        config.validate()?;
        let layout = mesher.layout();
        if layout.dim() != 1 {
            return Err(FdmError::configuration(format!(
                "one-dimensional solver on a {}-dimensional mesher",
                layout.dim()
            )));
        }
        FdmError::check_len("operator", op.size(), layout.size())?;
        FdmError::check_len("inner value calculator", calculator.size(), layout.size())?;

        let locations = mesher.axis_locations(0)?;
        let initial_values = calculator.avg_inner_values(config.maturity())?;

        let dt = config.maturity() / config.time_steps() as f64;
        let mut snapshot = 0;
        while conditions.snapshot(snapshot).is_some() {
            snapshot += 1;
        }
        let conditions = conditions.with_snapshot(SnapshotCondition::new(dt)?);

        debug!(points = locations.len(), ?config, "one-dimensional solver");
        Ok(Self {
            config,
            locations,
            initial_values,
            snapshot,
            solver: FdmBackwardSolver::new(op, bc_set, conditions, config.scheme())?,
        })
    }

    /// Roll back from maturity to today.
    pub fn solve(mut self) -> FdmResult<Fdm1dSolution> {
        let mut values = self.initial_values;
        self.solver.rollback(
            &mut values,
            self.config.maturity(),
            0.0,
            self.config.time_steps(),
            self.config.damping_steps(),
        )?;

        let theta_values = self
            .solver
            .step_conditions()
            .snapshot(self.snapshot)
            .and_then(|s| s.values())
            .ok_or_else(|| FdmError::numerical_solve("theta snapshot was not recorded"))?;
        let dt = self.config.maturity() / self.config.time_steps() as f64;

        Ok(Fdm1dSolution {
            spline: CubicSplineInterpolator::new(&self.locations, &values)?,
            theta_spline: CubicSplineInterpolator::new(&self.locations, theta_values)?,
            theta_dt: dt,
            locations: self.locations,
            values,
        })
    }
}

/// Solution of a one-dimensional run at today.
///
/// Prices and sensitivities are read from a natural cubic spline through
/// the grid values; `theta_at` differences against the snapshot taken one
/// time step later.
#[derive(Clone, Debug)]
pub struct Fdm1dSolution {
    locations: Vec<f64>,
    values: Vec<f64>,
    spline: CubicSplineInterpolator<f64>,
    theta_spline: CubicSplineInterpolator<f64>,
    theta_dt: f64,
}

impl Fdm1dSolution {
    /// Grid coordinates.
    pub fn locations(&self) -> &[f64] {
        &self.locations
    }

    /// Values at the grid coordinates.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `x`.
    pub fn interpolate_at(&self, x: f64) -> FdmResult<f64> {
        Ok(self.spline.interpolate(x)?)
    }

    /// `∂V/∂x` at `x`.
    pub fn derivative_x(&self, x: f64) -> FdmResult<f64> {
        Ok(self.spline.derivative(x)?)
    }

    /// `∂²V/∂x²` at `x`.
    pub fn derivative_xx(&self, x: f64) -> FdmResult<f64> {
        Ok(self.spline.second_derivative(x)?)
    }

    /// `∂V/∂t` at `x`, forward difference over the first time step.
    pub fn theta_at(&self, x: f64) -> FdmResult<f64> {
        let later = self.theta_spline.interpolate(x)?;
        Ok((later - self.spline.interpolate(x)?) / self.theta_dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inner_value::LogInnerValueCalculator;
    use crate::market::FlatCurve;
    use crate::meshers::{Fdm1dMesher, FdmMesherComposite};
    use crate::operators::FdmBlackScholesOp;
    use crate::schemes::FdmSchemeDesc;
    use std::sync::Arc;

    fn forward_setup(
        steps: usize,
    ) -> (FdmSolverConfig, FdmMesherComposite, FdmBlackScholesOp, LogInnerValueCalculator) {
        let mesher = FdmMesherComposite::new(vec![
            Fdm1dMesher::uniform(100f64.ln() - 1.5, 100f64.ln() + 1.5, 101).unwrap(),
        ])
        .unwrap();
        let op = FdmBlackScholesOp::new(
            &mesher,
            0,
            Arc::new(FlatCurve::new(0.05)),
            Arc::new(FlatCurve::new(0.0)),
            0.2,
        )
        .unwrap();
        let forward = LogInnerValueCalculator::new(&mesher, 0, |s| s - 100.0).unwrap();
        let config = FdmSolverConfig::builder()
            .maturity(1.0)
            .time_steps(steps)
            .scheme(FdmSchemeDesc::crank_nicolson())
            .build()
            .unwrap();
        (config, mesher, op, forward)
    }

    #[test]
    fn test_forward_contract_value_and_theta() {
        // V = S - K·e^{-rT}: linear in S so boundaries are exact
        let (config, mesher, op, forward) = forward_setup(50);
        let solution = Fdm1dimSolver::new(
            config,
            &mesher,
            op,
            BoundaryConditionSet::new(),
            StepConditionComposite::new(),
            &forward,
        )
        .unwrap()
        .solve()
        .unwrap();

        let x = 100f64.ln();
        let expected = 100.0 - 100.0 * (-0.05f64).exp();
        assert!((solution.interpolate_at(x).unwrap() - expected).abs() < 5e-2);
        // ∂V/∂x = S
        assert!((solution.derivative_x(x).unwrap() - 100.0).abs() < 0.5);
        // θ = -r·K·e^{-rT}
        let theta = -0.05 * 100.0 * (-0.05f64).exp();
        assert!((solution.theta_at(x).unwrap() - theta).abs() < 5e-2);
        assert_eq!(solution.values().len(), 101);
    }

    #[test]
    fn test_rejects_multi_dimensional_mesher() {
        let (config, _, op, forward) = forward_setup(10);
        let mesher_2d = FdmMesherComposite::new(vec![
            Fdm1dMesher::uniform(0.0, 1.0, 101).unwrap(),
            Fdm1dMesher::uniform(0.0, 1.0, 3).unwrap(),
        ])
        .unwrap();
        let result = Fdm1dimSolver::new(
            config,
            &mesher_2d,
            op,
            BoundaryConditionSet::new(),
            StepConditionComposite::new(),
            &forward,
        );
        assert!(matches!(result, Err(FdmError::Configuration(_))));
    }

    #[test]
    fn test_out_of_domain_query() {
        let (config, mesher, op, forward) = forward_setup(10);
        let solution = Fdm1dimSolver::new(
            config,
            &mesher,
            op,
            BoundaryConditionSet::new(),
            StepConditionComposite::new(),
            &forward,
        )
        .unwrap()
        .solve()
        .unwrap();
        assert!(matches!(
            solution.interpolate_at(10.0),
            Err(FdmError::Interpolation(_))
        ));
    }
}
