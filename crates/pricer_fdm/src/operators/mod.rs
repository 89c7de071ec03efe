//! Finite-difference operators and their algebra.
//!
//! ## Building blocks
//!
//! - [`TripleBandLinearOp`]: tridiagonal along one axis; first and second
//!   derivatives are constructors of it
//! - [`NinePointLinearOp`]: 3x3 stencil coupling two axes; the mixed
//!   derivative is a constructor of it
//! - [`SparseMatrix`]: explicit CSR form returned by every `to_matrix()`
//!
//! ## Split operators
//!
//! The time-stepping schemes see the PDE operator through
//! [`FdmLinearOpComposite`], which splits `L = Σ L_i + L_mixed` by direction.
//! [`FdmOperatorSet`] is a static split built from caller-assembled pieces;
//! [`FdmBlackScholesOp`] assembles the log-spot Black-Scholes generator.
//!
//! ## Example
//!
//! ```
//! use pricer_fdm::meshers::{Fdm1dMesher, FdmMesherComposite};
//! use pricer_fdm::operators::{FdmLinearOp, RowCoefficients, TripleBandLinearOp};
//!
//! let mesher = FdmMesherComposite::new(vec![Fdm1dMesher::uniform(-1.0, 1.0, 21).unwrap()])
//!     .unwrap();
//! let dx = TripleBandLinearOp::first_derivative(0, &mesher).unwrap();
//! let dxx = TripleBandLinearOp::second_derivative(0, &mesher).unwrap();
//!
//! // 0.5·∂xx + 0.1·∂x - 0.05
//! let op = TripleBandLinearOp::axpyb(
//!     RowCoefficients::Constant(0.1),
//!     &dx,
//!     &dxx.mult(RowCoefficients::Constant(0.5)).unwrap(),
//!     RowCoefficients::Constant(-0.05),
//! )
//! .unwrap();
//! assert_eq!(op.size(), 21);
//! ```

mod black_scholes;
mod composite;
mod derivatives;
mod nine_point;
mod sparse;
mod triple_band;

pub use black_scholes::FdmBlackScholesOp;
pub use composite::{FdmLinearOpComposite, FdmOperatorSet};
pub use nine_point::NinePointLinearOp;
pub use sparse::SparseMatrix;
pub use triple_band::{RowCoefficients, TripleBandLinearOp};

use crate::error::FdmResult;

/// Minimum rows per rayon task in matrix-vector products.
pub(crate) const ROW_MIN_LEN: usize = 4096;

/// Minimum grid lines per rayon task in line solves.
pub(crate) const LINE_MIN_LEN: usize = 16;

/// Linear operator on a solution vector.
pub trait FdmLinearOp: Send + Sync {
    /// Number of rows (= grid points).
    fn size(&self) -> usize;

    /// `L·r`.
    fn apply(&self, r: &[f64]) -> FdmResult<Vec<f64>>;

    /// Explicit sparse form of the operator.
    fn to_matrix(&self) -> FdmResult<SparseMatrix>;
}
