//! # pricer_fdm: Finite-Difference PDE Engine
//!
//! Discretisation and backward time stepping of pricing PDEs on structured
//! grids of arbitrary dimension.
//!
//! ## Building blocks
//!
//! - Index space: [`layout::FdmLinearOpLayout`] maps flat indices to grid
//!   coordinates with a per-axis [`layout::BoundaryPolicy`]
//! - Grids: [`meshers::Fdm1dMesher`] (uniform, concentrating) combined into
//!   [`meshers::FdmMesherComposite`]
//! - Operators: [`operators::TripleBandLinearOp`] for one axis and
//!   [`operators::NinePointLinearOp`] for mixed derivatives, assembled into
//!   split operators ([`operators::FdmLinearOpComposite`])
//! - Quadrature: [`integral::FdmMesherIntegral`]
//! - Time stepping: [`schemes`] (explicit/implicit Euler, Crank-Nicolson and
//!   the Douglas, Craig-Sneyd and Hundsdorfer ADI family) driven by
//!   [`solver::FdmBackwardSolver`]
//! - Contract features: [`boundary`] conditions, [`step_conditions`] for
//!   early exercise and snapshots, [`inner_value`] payoffs
//!
//! ## Usage Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use pricer_fdm::boundary::BoundaryConditionSet;
//! use pricer_fdm::inner_value::LogInnerValueCalculator;
//! use pricer_fdm::market::FlatCurve;
//! use pricer_fdm::meshers::{Concentration, Fdm1dMesher, FdmMesherComposite};
//! use pricer_fdm::operators::FdmBlackScholesOp;
//! use pricer_fdm::schemes::FdmSchemeDesc;
//! use pricer_fdm::solver::{Fdm1dimSolver, FdmSolverConfig};
//! use pricer_fdm::step_conditions::StepConditionComposite;
//!
//! let (spot, strike): (f64, f64) = (100.0, 100.0);
//! let mesher = FdmMesherComposite::new(vec![Fdm1dMesher::concentrating(
//!     strike.ln() - 1.5,
//!     strike.ln() + 1.5,
//!     201,
//!     Some(Concentration::new(strike.ln(), 0.1)),
//! )
//! .unwrap()])
//! .unwrap();
//!
//! let op = FdmBlackScholesOp::new(
//!     &mesher,
//!     0,
//!     Arc::new(FlatCurve::new(0.05)),
//!     Arc::new(FlatCurve::new(0.0)),
//!     0.2,
//! )
//! .unwrap();
//! let call = LogInnerValueCalculator::new(&mesher, 0, move |s| (s - strike).max(0.0)).unwrap();
//!
//! let config = FdmSolverConfig::builder()
//!     .maturity(1.0)
//!     .time_steps(100)
//!     .damping_steps(2)
//!     .scheme(FdmSchemeDesc::crank_nicolson())
//!     .build()
//!     .unwrap();
//!
//! let solution = Fdm1dimSolver::new(
//!     config,
//!     &mesher,
//!     op,
//!     BoundaryConditionSet::new(),
//!     StepConditionComposite::new(),
//!     &call,
//! )
//! .unwrap()
//! .solve()
//! .unwrap();
//!
//! // Black-Scholes: 10.4506
//! let price = solution.interpolate_at(spot.ln()).unwrap();
//! assert!((price - 10.4506).abs() < 2e-2);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for configuration types

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod boundary;
mod error;
pub mod inner_value;
pub mod integral;
pub mod layout;
pub mod market;
pub mod math;
pub mod meshers;
pub mod operators;
pub mod schemes;
pub mod solver;
pub mod step_conditions;
pub mod time_grid;

pub use error::{FdmError, FdmResult, InterpolationError};
