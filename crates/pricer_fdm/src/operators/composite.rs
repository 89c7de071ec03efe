//! Direction-split operators consumed by the time-stepping schemes.

use super::{FdmLinearOp, NinePointLinearOp, SparseMatrix, TripleBandLinearOp};
use crate::error::{FdmError, FdmResult};
use tracing::debug;

/// PDE operator split by direction: `L = L_0 + ... + L_{d-1} + L_mixed`.
///
/// Every `L_i` must be solvable line by line (`solve_direction`); the mixed
/// part is only ever applied explicitly. `set_time` is called by the schemes
/// before each step with the interval `[t1, t2]` being stepped over, so
/// time-dependent coefficients are evaluated for that interval.
pub trait FdmLinearOpComposite: Send + Sync {
    /// Number of grid points.
    fn size(&self) -> usize;

    /// Number of split directions.
    fn directions(&self) -> usize;

    /// Update time-dependent coefficients for the step over `[t1, t2]`.
    fn set_time(&mut self, t1: f64, t2: f64) -> FdmResult<()>;

    /// Full operator `L·r`.
    fn apply(&self, r: &[f64]) -> FdmResult<Vec<f64>>;

    /// Mixed-derivative part `L_mixed·r`.
    fn apply_mixed(&self, r: &[f64]) -> FdmResult<Vec<f64>>;

    /// Single direction `L_dir·r`.
    fn apply_direction(&self, direction: usize, r: &[f64]) -> FdmResult<Vec<f64>>;

    /// Solve `(I + s·L_dir)·x = r`.
    fn solve_direction(&self, direction: usize, r: &[f64], s: f64) -> FdmResult<Vec<f64>>;

    /// Approximate inverse of `I + s·L` used to precondition iterative
    /// solves; the direction-0 solve by default.
    fn preconditioner(&self, r: &[f64], s: f64) -> FdmResult<Vec<f64>> {
        self.solve_direction(0, r, s)
    }

    /// One matrix per direction, followed by the mixed part if present.
    fn to_matrix_decomposition(&self) -> FdmResult<Vec<SparseMatrix>>;

    /// Explicit sparse form of the full operator.
    fn to_matrix(&self) -> FdmResult<SparseMatrix> {
        let n = self.size();
        let zero = SparseMatrix::from_triplets(n, n, std::iter::empty())?;
        self.to_matrix_decomposition()?
            .iter()
            .try_fold(zero, |acc, m| acc.add(m))
    }
}

/// Time-independent split operator assembled from its pieces.
///
/// Direction `i` is `axis_ops[i]`; the mixed part is the sum of
/// `mixed_ops`.
///
/// # Example
///
/// ```
/// use pricer_fdm::meshers::{Fdm1dMesher, FdmMesherComposite};
/// use pricer_fdm::operators::{
///     FdmLinearOpComposite, FdmOperatorSet, NinePointLinearOp, RowCoefficients,
///     TripleBandLinearOp,
/// };
///
/// let mesher = FdmMesherComposite::new(vec![
///     Fdm1dMesher::uniform(0.0, 1.0, 11).unwrap(),
///     Fdm1dMesher::uniform(0.0, 1.0, 11).unwrap(),
/// ])
/// .unwrap();
/// let diffusion = |axis| {
///     TripleBandLinearOp::second_derivative(axis, &mesher)
///         .and_then(|op| op.mult(RowCoefficients::Constant(0.5)))
/// };
/// let mixed = NinePointLinearOp::mixed_derivative(0, 1, &mesher)
///     .and_then(|op| op.mult(RowCoefficients::Constant(0.3)))
///     .unwrap();
///
/// let op = FdmOperatorSet::new(vec![diffusion(0).unwrap(), diffusion(1).unwrap()], vec![mixed])
///     .unwrap();
/// assert_eq!(op.directions(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct FdmOperatorSet {
    size: usize,
    axis_ops: Vec<TripleBandLinearOp>,
    mixed_ops: Vec<NinePointLinearOp>,
}

impl FdmOperatorSet {
    /// Combine directional and mixed operators.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` if there is no directional operator or the
    /// operators are not all defined on the same layout.
    pub fn new(
        axis_ops: Vec<TripleBandLinearOp>,
        mixed_ops: Vec<NinePointLinearOp>,
    ) -> FdmResult<Self> {
        let first = axis_ops
            .first()
            .ok_or_else(|| FdmError::configuration("operator set needs at least one direction"))?;
        let layout = first.layout().clone();
        let same_layout = axis_ops.iter().all(|op| op.layout() == &layout)
            && mixed_ops.iter().all(|op| op.layout() == &layout);
        if !same_layout {
            return Err(FdmError::configuration(
                "operator set pieces are defined on different layouts",
            ));
        }
        debug!(
            directions = axis_ops.len(),
            mixed = mixed_ops.len(),
            size = layout.size(),
            "operator set"
        );
        Ok(Self {
            size: layout.size(),
            axis_ops,
            mixed_ops,
        })
    }

    /// Directional operator of `direction`.
    pub fn direction(&self, direction: usize) -> FdmResult<&TripleBandLinearOp> {
        self.axis_ops.get(direction).ok_or_else(|| {
            FdmError::index(format!(
                "direction {} of an operator with {} directions",
                direction,
                self.axis_ops.len()
            ))
        })
    }
}

pub(crate) fn add_assign(acc: &mut [f64], other: &[f64]) {
    acc.iter_mut().zip(other).for_each(|(a, b)| *a += b);
}

impl FdmLinearOpComposite for FdmOperatorSet {
    fn size(&self) -> usize {
        self.size
    }

    fn directions(&self) -> usize {
        self.axis_ops.len()
    }

    fn set_time(&mut self, _t1: f64, _t2: f64) -> FdmResult<()> {
        Ok(())
    }

    fn apply(&self, r: &[f64]) -> FdmResult<Vec<f64>> {
        let mut out = self.apply_mixed(r)?;
        for op in &self.axis_ops {
            add_assign(&mut out, &op.apply(r)?);
        }
        Ok(out)
    }

    fn apply_mixed(&self, r: &[f64]) -> FdmResult<Vec<f64>> {
        FdmError::check_len("vector", r.len(), self.size)?;
        let mut out = vec![0.0; self.size];
        for op in &self.mixed_ops {
            add_assign(&mut out, &op.apply(r)?);
        }
        Ok(out)
    }

    fn apply_direction(&self, direction: usize, r: &[f64]) -> FdmResult<Vec<f64>> {
        self.direction(direction)?.apply(r)
    }

    fn solve_direction(&self, direction: usize, r: &[f64], s: f64) -> FdmResult<Vec<f64>> {
        self.direction(direction)?.solve_scaled(r, s, 1.0)
    }

    fn to_matrix_decomposition(&self) -> FdmResult<Vec<SparseMatrix>> {
        let mut matrices = self
            .axis_ops
            .iter()
            .map(FdmLinearOp::to_matrix)
            .collect::<FdmResult<Vec<_>>>()?;
        if let Some((first, rest)) = self.mixed_ops.split_first() {
            let mixed = rest
                .iter()
                .try_fold(first.to_matrix()?, |acc, op| acc.add(&op.to_matrix()?))?;
            matrices.push(mixed);
        }
        Ok(matrices)
    }
}
