//! Boundary conditions on the faces of the grid.
//!
//! A condition is bound to one side of one axis and is enforced by
//! overwriting the face values after every explicit operator application and
//! after every implicit solve. Implicit solves see the face rows of the
//! discretised operator itself; [`BoundaryCondition::apply_before_solving`]
//! is available for conditions that need to adjust the right-hand side. The
//! time passed to each hook is the time of the level being computed.

use crate::error::{FdmError, FdmResult};
use crate::meshers::FdmMesher;
use std::fmt;
use std::sync::Arc;

/// Face of an axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundarySide {
    /// Points with coordinate `0`.
    Lower,
    /// Points with coordinate `dim - 1`.
    Upper,
}

/// Hooks a scheme calls around each operator application and solve.
pub trait BoundaryCondition: Send + Sync {
    /// Enforce the condition on the result of an explicit application.
    fn apply_after_applying(&self, values: &mut [f64], t: f64) -> FdmResult<()>;

    /// Adjust the right-hand side of an implicit solve.
    fn apply_before_solving(&self, rhs: &mut [f64], t: f64) -> FdmResult<()> {
        let _ = (rhs, t);
        Ok(())
    }

    /// Enforce the condition on the result of an implicit solve.
    fn apply_after_solving(&self, values: &mut [f64], t: f64) -> FdmResult<()>;
}

/// Points of one face, each with the flat index of its inward neighbour and
/// the distance to it.
#[derive(Clone, Debug)]
struct Face {
    indices: Vec<usize>,
    inner: Vec<usize>,
    spacing: Vec<f64>,
    size: usize,
}

impl Face {
    fn new<M: FdmMesher + ?Sized>(mesher: &M, axis: usize, side: BoundarySide) -> FdmResult<Self> {
        let layout = mesher.layout();
        layout.check_axis(axis)?;
        let dim = layout.dims()[axis];
        if dim < 2 {
            return Err(FdmError::configuration(format!(
                "boundary on axis {} needs at least two points",
                axis
            )));
        }
        let (edge, step) = match side {
            BoundarySide::Lower => (0, 1),
            BoundarySide::Upper => (dim - 1, -1),
        };
        let mut face = Face {
            indices: Vec::new(),
            inner: Vec::new(),
            spacing: Vec::new(),
            size: layout.size(),
        };
        for point in layout.iter().filter(|p| p.coordinates[axis] == edge) {
            let h = match side {
                BoundarySide::Lower => mesher.dplus(&point.coordinates, axis)?,
                BoundarySide::Upper => mesher.dminus(&point.coordinates, axis)?,
            };
            face.indices.push(point.index);
            face.inner.push(layout.line_neighbor(point.index, axis, step));
            face.spacing.push(h.unwrap_or(0.0));
        }
        Ok(face)
    }

    fn check(&self, values: &[f64]) -> FdmResult<()> {
        FdmError::check_len("solution vector", values.len(), self.size)
    }
}

/// Value prescribed on a Dirichlet face.
#[derive(Clone)]
pub enum BoundaryValue {
    /// Same value at every time and point.
    Constant(f64),
    /// `f(t, x)` with `x` the state-variable coordinates of the face point.
    Function(Arc<dyn Fn(f64, &[f64]) -> f64 + Send + Sync>),
}

impl fmt::Debug for BoundaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryValue::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            BoundaryValue::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Fixed values on one face: `u = g(t, x)`.
///
/// # Example
///
/// ```
/// use pricer_fdm::boundary::{BoundaryCondition, BoundarySide, DirichletBoundary};
/// use pricer_fdm::meshers::{Fdm1dMesher, FdmMesherComposite};
///
/// let mesher = FdmMesherComposite::new(vec![Fdm1dMesher::uniform(0.0, 1.0, 5).unwrap()])
///     .unwrap();
/// let bc = DirichletBoundary::constant(&mesher, 0, BoundarySide::Upper, 0.0).unwrap();
///
/// let mut values = vec![1.0; 5];
/// bc.apply_after_solving(&mut values, 0.5).unwrap();
/// assert_eq!(values, vec![1.0, 1.0, 1.0, 1.0, 0.0]);
/// ```
#[derive(Clone, Debug)]
pub struct DirichletBoundary {
    face: Face,
    locations: Vec<Vec<f64>>,
    value: BoundaryValue,
}

impl DirichletBoundary {
    /// Dirichlet condition with a general value.
    pub fn new<M: FdmMesher + ?Sized>(
        mesher: &M,
        axis: usize,
        side: BoundarySide,
        value: BoundaryValue,
    ) -> FdmResult<Self> {
        let face = Face::new(mesher, axis, side)?;
        let dim = mesher.layout().dim();
        let all = (0..dim)
            .map(|a| mesher.locations(a))
            .collect::<FdmResult<Vec<_>>>()?;
        let locations = face
            .indices
            .iter()
            .map(|&i| all.iter().map(|axis_values| axis_values[i]).collect())
            .collect();
        Ok(Self {
            face,
            locations,
            value,
        })
    }

    /// `u = value` on the face.
    pub fn constant<M: FdmMesher + ?Sized>(
        mesher: &M,
        axis: usize,
        side: BoundarySide,
        value: f64,
    ) -> FdmResult<Self> {
        Self::new(mesher, axis, side, BoundaryValue::Constant(value))
    }

    /// `u = f(t, x)` on the face.
    pub fn time_dependent<M, F>(
        mesher: &M,
        axis: usize,
        side: BoundarySide,
        f: F,
    ) -> FdmResult<Self>
    where
        M: FdmMesher + ?Sized,
        F: Fn(f64, &[f64]) -> f64 + Send + Sync + 'static,
    {
        Self::new(mesher, axis, side, BoundaryValue::Function(Arc::new(f)))
    }

    fn enforce(&self, values: &mut [f64], t: f64) -> FdmResult<()> {
        self.face.check(values)?;
        for (&i, x) in self.face.indices.iter().zip(&self.locations) {
            values[i] = match &self.value {
                BoundaryValue::Constant(v) => *v,
                BoundaryValue::Function(f) => f(t, x),
            };
        }
        Ok(())
    }
}

impl BoundaryCondition for DirichletBoundary {
    fn apply_after_applying(&self, values: &mut [f64], t: f64) -> FdmResult<()> {
        self.enforce(values, t)
    }

    fn apply_after_solving(&self, values: &mut [f64], t: f64) -> FdmResult<()> {
        self.enforce(values, t)
    }
}

/// Prescribed derivative across one face: `∂u/∂x = slope`.
///
/// The face value is set from its inward neighbour with a one-sided
/// difference.
#[derive(Clone, Debug)]
pub struct NeumannBoundary {
    face: Face,
    side: BoundarySide,
    slope: f64,
}

impl NeumannBoundary {
    /// Neumann condition with derivative `slope` along `axis`.
    pub fn new<M: FdmMesher + ?Sized>(
        mesher: &M,
        axis: usize,
        side: BoundarySide,
        slope: f64,
    ) -> FdmResult<Self> {
        if !slope.is_finite() {
            return Err(FdmError::configuration(format!(
                "Neumann slope must be finite, got {}",
                slope
            )));
        }
        Ok(Self {
            face: Face::new(mesher, axis, side)?,
            side,
            slope,
        })
    }

    fn enforce(&self, values: &mut [f64]) -> FdmResult<()> {
        self.face.check(values)?;
        let sign = match self.side {
            BoundarySide::Lower => -1.0,
            BoundarySide::Upper => 1.0,
        };
        let face = &self.face;
        for ((&i, &j), &h) in face.indices.iter().zip(&face.inner).zip(&face.spacing) {
            values[i] = values[j] + sign * self.slope * h;
        }
        Ok(())
    }
}

impl BoundaryCondition for NeumannBoundary {
    fn apply_after_applying(&self, values: &mut [f64], _t: f64) -> FdmResult<()> {
        self.enforce(values)
    }

    fn apply_after_solving(&self, values: &mut [f64], _t: f64) -> FdmResult<()> {
        self.enforce(values)
    }
}

/// Ordered collection of boundary conditions; empty by default.
#[derive(Clone, Default)]
pub struct BoundaryConditionSet {
    conditions: Vec<Arc<dyn BoundaryCondition>>,
}

impl fmt::Debug for BoundaryConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryConditionSet")
            .field("len", &self.conditions.len())
            .finish()
    }
}

impl BoundaryConditionSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition; later conditions win where faces overlap.
    pub fn with<B: BoundaryCondition + 'static>(mut self, condition: B) -> Self {
        self.push(condition);
        self
    }

    /// Add a condition in place.
    pub fn push<B: BoundaryCondition + 'static>(&mut self, condition: B) {
        self.conditions.push(Arc::new(condition));
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// True if no condition is set.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Run `apply_after_applying` of every condition.
    pub fn apply_after_applying(&self, values: &mut [f64], t: f64) -> FdmResult<()> {
        self.conditions
            .iter()
            .try_for_each(|bc| bc.apply_after_applying(values, t))
    }

    /// Run `apply_before_solving` of every condition.
    pub fn apply_before_solving(&self, rhs: &mut [f64], t: f64) -> FdmResult<()> {
        self.conditions
            .iter()
            .try_for_each(|bc| bc.apply_before_solving(rhs, t))
    }

    /// Run `apply_after_solving` of every condition.
    pub fn apply_after_solving(&self, values: &mut [f64], t: f64) -> FdmResult<()> {
        self.conditions
            .iter()
            .try_for_each(|bc| bc.apply_after_solving(values, t))
    }
}
