//! Time discretisation of a rollback.

use crate::error::{FdmError, FdmResult};
use crate::step_conditions::same_time;

/// Strictly increasing time points covering `[start, end]`.
///
/// # Example
///
/// ```
/// use pricer_fdm::time_grid::TimeGrid;
///
/// let grid = TimeGrid::uniform(0.0, 1.0, 4).unwrap();
/// assert_eq!(grid.times(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
///
/// let grid = grid.with_mandatory_times(&[0.6]).unwrap();
/// assert_eq!(grid.steps(), 5);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    /// Grid through the given points.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` for fewer than two points, non-finite
    /// points, or points that are not strictly increasing.
    pub fn new(times: Vec<f64>) -> FdmResult<Self> {
        if times.len() < 2 {
            return Err(FdmError::configuration(format!(
                "time grid needs at least two points, got {}",
                times.len()
            )));
        }
        if times.iter().any(|t| !t.is_finite()) {
            return Err(FdmError::configuration("time grid points must be finite"));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(FdmError::configuration(format!(
                "time grid not strictly increasing at point {}",
                i + 1
            )));
        }
        Ok(Self { times })
    }

    /// `steps` equal intervals from `start` to `end`; the last point is
    /// exactly `end`.
    pub fn uniform(start: f64, end: f64, steps: usize) -> FdmResult<Self> {
        if steps == 0 {
            return Err(FdmError::configuration("time grid needs at least one step"));
        }
        if !(start.is_finite() && end.is_finite() && end > start) {
            return Err(FdmError::configuration(format!(
                "invalid time interval [{}, {}]",
                start, end
            )));
        }
        let dt = (end - start) / steps as f64;
        let mut times: Vec<f64> = (0..steps).map(|i| start + dt * i as f64).collect();
        times.push(end);
        Self::new(times)
    }

    /// Insert additional points; points outside the open interval or
    /// coinciding with an existing point are ignored.
    pub fn with_mandatory_times(&self, mandatory: &[f64]) -> FdmResult<Self> {
        let (start, end) = (self.start(), self.end());
        let inside = |t: f64| t > start && t < end && !same_time(t, start) && !same_time(t, end);
        let mut times = self.times.clone();
        times.extend(mandatory.iter().copied().filter(|t| inside(*t)));
        times.sort_by(f64::total_cmp);
        times.dedup_by(|a, b| same_time(*a, *b));
        Self::new(times)
    }

    /// All points.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// First point.
    pub fn start(&self) -> f64 {
        self.times[0]
    }

    /// Last point.
    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Number of intervals.
    pub fn steps(&self) -> usize {
        self.times.len() - 1
    }

    /// Intervals `(t_{i+1}, t_i)` from the end of the grid to its start.
    pub fn backward_intervals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.windows(2).rev().map(|w| (w[1], w[0]))
    }
}
