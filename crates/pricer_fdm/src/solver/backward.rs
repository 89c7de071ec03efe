//! Backward rollback of a solution vector.

use crate::boundary::BoundaryConditionSet;
use crate::error::{FdmError, FdmResult};
use crate::operators::FdmLinearOpComposite;
use crate::schemes::{FdmScheme, FdmSchemeDesc, ImplicitEulerScheme};
use crate::step_conditions::{same_time, StepCondition, StepConditionComposite};
use crate::time_grid::TimeGrid;
use tracing::{debug, trace};

/// Lifecycle of a [`FdmBackwardSolver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolverState {
    /// Constructed, no rollback yet.
    Initialized,
    /// A rollback is in progress.
    Rolling,
    /// The last rollback finished.
    Done,
    /// A rollback failed; the solver refuses further work.
    Failed,
}

/// Rolls a solution vector back in time with a configured scheme.
///
/// `rollback(values, from, to, steps, damping_steps)` splits `[to, from]`
/// into `steps` equal intervals. The first `damping_steps` are taken with
/// implicit Euler, the rest with the configured scheme. Step conditions are
/// applied after every interval; an interval containing a stopping time is
/// split there so the conditions see that time exactly.
///
/// # Example
///
/// ```
/// use pricer_fdm::boundary::BoundaryConditionSet;
/// use pricer_fdm::meshers::{Fdm1dMesher, FdmMesher, FdmMesherComposite};
/// use pricer_fdm::operators::{FdmOperatorSet, RowCoefficients, TripleBandLinearOp};
/// use pricer_fdm::schemes::FdmSchemeDesc;
/// use pricer_fdm::solver::{FdmBackwardSolver, SolverState};
/// use pricer_fdm::step_conditions::StepConditionComposite;
///
/// // u_τ = -u: pure discounting at rate 1
/// let mesher = FdmMesherComposite::new(vec![Fdm1dMesher::uniform(0.0, 1.0, 3).unwrap()])
///     .unwrap();
/// let op = TripleBandLinearOp::identity(0, mesher.layout().clone())
///     .and_then(|id| id.mult(RowCoefficients::Constant(-1.0)))
///     .and_then(|l| FdmOperatorSet::new(vec![l], vec![]))
///     .unwrap();
///
/// let mut solver = FdmBackwardSolver::new(
///     op,
///     BoundaryConditionSet::new(),
///     StepConditionComposite::new(),
///     FdmSchemeDesc::crank_nicolson(),
/// )
/// .unwrap();
/// let mut values = vec![1.0; 3];
/// solver.rollback(&mut values, 1.0, 0.0, 100, 0).unwrap();
///
/// assert_eq!(solver.state(), SolverState::Done);
/// assert!((values[0] - (-1.0f64).exp()).abs() < 1e-4);
/// ```
pub struct FdmBackwardSolver<O: FdmLinearOpComposite> {
    op: O,
    bc_set: BoundaryConditionSet,
    conditions: StepConditionComposite,
    scheme_desc: FdmSchemeDesc,
    scheme: Box<dyn FdmScheme>,
    state: SolverState,
}

impl<O: FdmLinearOpComposite> std::fmt::Debug for FdmBackwardSolver<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdmBackwardSolver")
            .field("size", &self.op.size())
            .field("scheme", &self.scheme_desc)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<O: FdmLinearOpComposite> FdmBackwardSolver<O> {
    /// Create a solver owning its operator and conditions.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` for invalid scheme parameters.
    pub fn new(
        op: O,
        bc_set: BoundaryConditionSet,
        conditions: StepConditionComposite,
        scheme_desc: FdmSchemeDesc,
    ) -> FdmResult<Self> {
        let scheme = scheme_desc.scheme()?;
        Ok(Self {
            op,
            bc_set,
            conditions,
            scheme_desc,
            scheme,
            state: SolverState::Initialized,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// The operator.
    pub fn operator(&self) -> &O {
        &self.op
    }

    /// The scheme description.
    pub fn scheme_desc(&self) -> FdmSchemeDesc {
        self.scheme_desc
    }

    /// The step conditions, with any snapshots recorded so far.
    pub fn step_conditions(&self) -> &StepConditionComposite {
        &self.conditions
    }

    /// Roll `values` from time `from` back to `to` in place.
    ///
    /// # Errors
    ///
    /// - `FdmError::Configuration` for `steps == 0`, `damping_steps > steps`,
    ///   `from <= to`, `to < 0`, non-finite times, a vector of the wrong
    ///   length, or a solver that failed before
    /// - `FdmError::NumericalSolve` from a singular or non-converging
    ///   implicit step
    ///
    /// Any error leaves the solver in [`SolverState::Failed`].
    pub fn rollback(
        &mut self,
        values: &mut [f64],
        from: f64,
        to: f64,
        steps: usize,
        damping_steps: usize,
    ) -> FdmResult<()> {
        if self.state == SolverState::Failed {
            return Err(FdmError::configuration("rollback on a failed solver"));
        }
        self.state = SolverState::Rolling;
        match self.run(values, from, to, steps, damping_steps) {
            Ok(()) => {
                self.state = SolverState::Done;
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "rollback failed");
                self.state = SolverState::Failed;
                Err(e)
            }
        }
    }

    fn run(
        &mut self,
        values: &mut [f64],
        from: f64,
        to: f64,
        steps: usize,
        damping_steps: usize,
    ) -> FdmResult<()> {
        validate_rollback(from, to, steps, damping_steps)?;
        FdmError::check_len("solution vector", values.len(), self.op.size())?;

        let stopping_times = self.conditions.stopping_times();
        if stopping_times.iter().any(|&s| same_time(s, from)) {
            self.conditions.apply_to(values, from)?;
        }

        let dt = (from - to) / steps as f64;
        let damping_to = if damping_steps == steps {
            to
        } else {
            from - dt * damping_steps as f64
        };
        debug!(
            from,
            to,
            steps,
            damping_steps,
            scheme = ?self.scheme_desc.kind,
            stopping_times = stopping_times.len(),
            "rollback"
        );

        let mut segment = Segment {
            op: &mut self.op,
            bc_set: &self.bc_set,
            conditions: &mut self.conditions,
            stopping_times: &stopping_times,
        };
        if damping_steps > 0 {
            debug!(from, to = damping_to, steps = damping_steps, "damping");
            segment.roll(&ImplicitEulerScheme::new(), values, from, damping_to, damping_steps)?;
        }
        if steps > damping_steps {
            segment.roll(self.scheme.as_ref(), values, damping_to, to, steps - damping_steps)?;
        }
        Ok(())
    }
}

fn validate_rollback(from: f64, to: f64, steps: usize, damping_steps: usize) -> FdmResult<()> {
    if steps == 0 {
        return Err(FdmError::configuration("rollback needs at least one time step"));
    }
    if damping_steps > steps {
        return Err(FdmError::configuration(format!(
            "damping steps ({}) exceed time steps ({})",
            damping_steps, steps
        )));
    }
    if !(from.is_finite() && to.is_finite()) {
        return Err(FdmError::configuration(format!(
            "rollback times must be finite, got [{}, {}]",
            to, from
        )));
    }
    if to < 0.0 || from <= to {
        return Err(FdmError::configuration(format!(
            "rollback needs 0 <= to < from, got to = {}, from = {}",
            to, from
        )));
    }
    Ok(())
}

/// Borrowed pieces of the solver used while stepping.
struct Segment<'a> {
    op: &'a mut dyn FdmLinearOpComposite,
    bc_set: &'a BoundaryConditionSet,
    conditions: &'a mut StepConditionComposite,
    stopping_times: &'a [f64],
}

impl Segment<'_> {
    /// `steps` equal intervals from `from` down to `to`, split at the
    /// stopping times inside.
    fn roll(
        &mut self,
        scheme: &dyn FdmScheme,
        values: &mut [f64],
        from: f64,
        to: f64,
        steps: usize,
    ) -> FdmResult<()> {
        let grid = TimeGrid::uniform(to, from, steps)?.with_mandatory_times(self.stopping_times)?;
        for (t, target) in grid.backward_intervals() {
            self.step(scheme, values, t, target)?;
        }
        Ok(())
    }

    /// Step from `t` to `target`, then apply the step conditions at `target`.
    fn step(
        &mut self,
        scheme: &dyn FdmScheme,
        values: &mut [f64],
        t: f64,
        target: f64,
    ) -> FdmResult<()> {
        let dt = t - target;
        trace!(t, dt, "time step");
        scheme.step(&mut *self.op, self.bc_set, values, t, dt)?;
        self.conditions.apply_to(values, target)
    }
}
