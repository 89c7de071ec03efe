//! Numerical support for the engine.
//!
//! - [`BiCGStab`]: iterative solver for the implicit Euler system
//! - [`CubicSplineInterpolator`]: natural cubic spline used to read prices and
//!   sensitivities off a solution line

mod bicgstab;
mod cubic_spline;

pub use bicgstab::{BiCGStab, BiCGStabConfig, BiCGStabResult};
pub use cubic_spline::CubicSplineInterpolator;
