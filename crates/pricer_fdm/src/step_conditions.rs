//! Conditions applied to the solution between time steps.
//!
//! The backward solver calls [`StepCondition::apply_to`] after every step
//! with the time the values now live at, and splits steps so that every
//! stopping time is hit exactly.

use crate::error::{FdmError, FdmResult};
use crate::inner_value::InnerValueCalculator;
use std::fmt;
use std::sync::Arc;

/// Two times closer than this are the same stopping time.
pub(crate) const TIME_TOLERANCE: f64 = 1e-10;

#[inline]
pub(crate) fn same_time(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Modification of the solution at a time level.
pub trait StepCondition: Send + Sync {
    /// Update `values` living at time `t`.
    fn apply_to(&mut self, values: &mut [f64], t: f64) -> FdmResult<()>;

    /// Times that the backward solver must step onto exactly.
    fn stopping_times(&self) -> Vec<f64> {
        Vec::new()
    }
}

fn apply_exercise(
    calculator: &dyn InnerValueCalculator,
    values: &mut [f64],
    t: f64,
) -> FdmResult<()> {
    FdmError::check_len("solution vector", values.len(), calculator.size())?;
    for (i, v) in values.iter_mut().enumerate() {
        let intrinsic = calculator.inner_value(i, t)?;
        if intrinsic > *v {
            *v = intrinsic;
        }
    }
    Ok(())
}

/// Continuous early exercise: `u ← max(u, intrinsic)` after every step.
#[derive(Clone)]
pub struct AmericanStepCondition {
    calculator: Arc<dyn InnerValueCalculator>,
}

impl fmt::Debug for AmericanStepCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmericanStepCondition")
            .field("size", &self.calculator.size())
            .finish()
    }
}

impl AmericanStepCondition {
    /// Exercise into the payoff given by `calculator`.
    pub fn new(calculator: Arc<dyn InnerValueCalculator>) -> Self {
        Self { calculator }
    }
}

impl StepCondition for AmericanStepCondition {
    fn apply_to(&mut self, values: &mut [f64], t: f64) -> FdmResult<()> {
        apply_exercise(self.calculator.as_ref(), values, t)
    }
}

/// Early exercise on a discrete set of dates.
#[derive(Clone)]
pub struct BermudanStepCondition {
    exercise_times: Vec<f64>,
    calculator: Arc<dyn InnerValueCalculator>,
}

impl fmt::Debug for BermudanStepCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BermudanStepCondition")
            .field("exercise_times", &self.exercise_times)
            .finish_non_exhaustive()
    }
}

impl BermudanStepCondition {
    /// Exercise at `exercise_times` (year fractions, any order).
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` for an empty list or a negative or
    /// non-finite time.
    pub fn new(
        mut exercise_times: Vec<f64>,
        calculator: Arc<dyn InnerValueCalculator>,
    ) -> FdmResult<Self> {
        if exercise_times.is_empty() {
            return Err(FdmError::configuration("Bermudan exercise needs at least one date"));
        }
        if let Some(t) = exercise_times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(FdmError::configuration(format!(
                "exercise time must be finite and non-negative, got {}",
                t
            )));
        }
        exercise_times.sort_by(f64::total_cmp);
        exercise_times.dedup_by(|a, b| same_time(*a, *b));
        Ok(Self {
            exercise_times,
            calculator,
        })
    }

    /// Sorted exercise times.
    pub fn exercise_times(&self) -> &[f64] {
        &self.exercise_times
    }
}

impl StepCondition for BermudanStepCondition {
    fn apply_to(&mut self, values: &mut [f64], t: f64) -> FdmResult<()> {
        if self.exercise_times.iter().any(|&e| same_time(e, t)) {
            apply_exercise(self.calculator.as_ref(), values, t)?;
        }
        Ok(())
    }

    fn stopping_times(&self) -> Vec<f64> {
        self.exercise_times.clone()
    }
}

/// Records a copy of the solution at one time.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotCondition {
    time: f64,
    values: Option<Vec<f64>>,
}

impl SnapshotCondition {
    /// Snapshot taken when the rollback reaches `time`.
    pub fn new(time: f64) -> FdmResult<Self> {
        if !time.is_finite() || time < 0.0 {
            return Err(FdmError::configuration(format!(
                "snapshot time must be finite and non-negative, got {}",
                time
            )));
        }
        Ok(Self { time, values: None })
    }

    /// Time of the snapshot.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Recorded values, `None` until the time was reached.
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }
}

impl StepCondition for SnapshotCondition {
    fn apply_to(&mut self, values: &mut [f64], t: f64) -> FdmResult<()> {
        if same_time(self.time, t) {
            self.values = Some(values.to_vec());
        }
        Ok(())
    }

    fn stopping_times(&self) -> Vec<f64> {
        vec![self.time]
    }
}

/// Several conditions applied in insertion order, snapshots last.
///
/// # Example
///
/// ```
/// use pricer_fdm::step_conditions::{SnapshotCondition, StepCondition, StepConditionComposite};
///
/// let mut conditions = StepConditionComposite::new()
///     .with_snapshot(SnapshotCondition::new(0.5).unwrap())
///     .with_snapshot(SnapshotCondition::new(0.25).unwrap());
/// assert_eq!(conditions.stopping_times(), vec![0.25, 0.5]);
///
/// let mut values = vec![1.0, 2.0];
/// conditions.apply_to(&mut values, 0.5).unwrap();
/// assert_eq!(conditions.snapshot(0).and_then(|s| s.values()), Some(&[1.0, 2.0][..]));
/// assert_eq!(conditions.snapshot(1).and_then(|s| s.values()), None);
/// ```
#[derive(Default)]
pub struct StepConditionComposite {
    conditions: Vec<Box<dyn StepCondition>>,
    snapshots: Vec<SnapshotCondition>,
}

impl fmt::Debug for StepConditionComposite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepConditionComposite")
            .field("conditions", &self.conditions.len())
            .field("snapshots", &self.snapshots)
            .finish()
    }
}

impl StepConditionComposite {
    /// No conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition.
    pub fn with<C: StepCondition + 'static>(mut self, condition: C) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    /// Add a snapshot, readable afterwards through [`Self::snapshot`].
    pub fn with_snapshot(mut self, snapshot: SnapshotCondition) -> Self {
        self.snapshots.push(snapshot);
        self
    }

    /// The `i`-th snapshot in insertion order.
    pub fn snapshot(&self, i: usize) -> Option<&SnapshotCondition> {
        self.snapshots.get(i)
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.snapshots.is_empty()
    }
}

impl StepCondition for StepConditionComposite {
    fn apply_to(&mut self, values: &mut [f64], t: f64) -> FdmResult<()> {
        for condition in &mut self.conditions {
            condition.apply_to(values, t)?;
        }
        for snapshot in &mut self.snapshots {
            snapshot.apply_to(values, t)?;
        }
        Ok(())
    }

    /// Union of all stopping times, sorted, with near-duplicates merged.
    fn stopping_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = self
            .conditions
            .iter()
            .flat_map(|c| c.stopping_times())
            .chain(self.snapshots.iter().map(|s| s.time))
            .collect();
        times.sort_by(f64::total_cmp);
        times.dedup_by(|a, b| same_time(*a, *b));
        times
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inner_value::LogInnerValueCalculator;
    use crate::meshers::{Fdm1dMesher, FdmMesherComposite};

    fn put_calculator() -> Arc<dyn InnerValueCalculator> {
        let mesher = FdmMesherComposite::new(vec![
            Fdm1dMesher::from_locations(vec![-1.0, 0.0, 1.0]).unwrap(),
        ])
        .unwrap();
        Arc::new(LogInnerValueCalculator::new(&mesher, 0, |s| (1.0 - s).max(0.0)).unwrap())
    }

    #[test]
    fn test_american_takes_maximum() {
        let mut american = AmericanStepCondition::new(put_calculator());
        let mut values = vec![0.1, 0.2, 0.0];
        american.apply_to(&mut values, 0.3).unwrap();
        assert!((values[0] - (1.0 - (-1.0f64).exp())).abs() < 1e-15);
        assert_eq!(values[1], 0.2);
        assert_eq!(values[2], 0.0);
        assert!(american.stopping_times().is_empty());
    }

    #[test]
    fn test_bermudan_only_on_exercise_dates() {
        let mut bermudan =
            BermudanStepCondition::new(vec![0.5, 0.25, 0.5], put_calculator()).unwrap();
        assert_eq!(bermudan.stopping_times(), vec![0.25, 0.5]);

        let mut values = vec![0.0; 3];
        bermudan.apply_to(&mut values, 0.3).unwrap();
        assert_eq!(values[0], 0.0);
        bermudan.apply_to(&mut values, 0.25).unwrap();
        assert!(values[0] > 0.6);
    }

    #[test]
    fn test_bermudan_rejects_bad_dates() {
        assert!(BermudanStepCondition::new(vec![], put_calculator()).is_err());
        assert!(BermudanStepCondition::new(vec![-0.1], put_calculator()).is_err());
        assert!(BermudanStepCondition::new(vec![f64::NAN], put_calculator()).is_err());
    }

    #[test]
    fn test_snapshot_records_at_its_time_only() {
        let mut snapshot = SnapshotCondition::new(0.1).unwrap();
        let mut values = vec![3.0];
        snapshot.apply_to(&mut values, 0.2).unwrap();
        assert!(snapshot.values().is_none());
        snapshot.apply_to(&mut values, 0.1 + 1e-13).unwrap();
        assert_eq!(snapshot.values(), Some(&[3.0][..]));
    }

    #[test]
    fn test_composite_merges_stopping_times() {
        let composite = StepConditionComposite::new()
            .with(BermudanStepCondition::new(vec![0.75, 0.25], put_calculator()).unwrap())
            .with(AmericanStepCondition::new(put_calculator()))
            .with_snapshot(SnapshotCondition::new(0.25).unwrap());
        assert_eq!(composite.stopping_times(), vec![0.25, 0.75]);
        assert!(!composite.is_empty());
    }

    #[test]
    fn test_snapshot_sees_exercised_values() {
        let mut composite = StepConditionComposite::new()
            .with(AmericanStepCondition::new(put_calculator()))
            .with_snapshot(SnapshotCondition::new(0.0).unwrap());
        let mut values = vec![0.0; 3];
        composite.apply_to(&mut values, 0.0).unwrap();
        let recorded = composite.snapshot(0).and_then(|s| s.values()).unwrap();
        assert!(recorded[0] > 0.6);
    }
}
