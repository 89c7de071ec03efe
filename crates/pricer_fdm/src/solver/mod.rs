//! Backward solvers.
//!
//! - [`FdmBackwardSolver`]: rolls any split operator back in time with
//!   damping, stopping times and step conditions
//! - [`Fdm1dimSolver`]: one-dimensional run from payoff to spline read-out
//! - [`FdmSolverConfig`]: validated time discretisation and scheme choice

mod backward;
mod config;
mod one_dim;

pub use backward::{FdmBackwardSolver, SolverState};
pub use config::{FdmSolverConfig, FdmSolverConfigBuilder, MAX_TIME_STEPS};
pub use one_dim::{Fdm1dSolution, Fdm1dimSolver};
