//! Grid coordinate generators.
//!
//! A mesher assigns a state-variable coordinate to every point of a
//! [`FdmLinearOpLayout`] and exposes the local backward/forward spacings the
//! derivative operators are built from.
//!
//! ## Available Meshers
//!
//! - [`Fdm1dMesher`]: one axis, built uniform ([`Fdm1dMesher::uniform`]),
//!   concentrated around a point ([`Fdm1dMesher::concentrating`]) or from
//!   explicit coordinates ([`Fdm1dMesher::from_locations`])
//! - [`FdmMesherComposite`]: cross product of 1D meshers
//! - [`UniformGridMesher`]: uniform spacing on every axis of a layout
//!
//! All n-dimensional meshers implement [`FdmMesher`].
//!
//! ## Example
//!
//! ```
//! use pricer_fdm::meshers::{Concentration, Fdm1dMesher, FdmMesher, FdmMesherComposite};
//!
//! let spot = Fdm1dMesher::concentrating(0.0, 200.0, 51, Some(Concentration::new(100.0, 0.1)))
//!     .unwrap();
//! let rate = Fdm1dMesher::uniform(-0.05, 0.15, 11).unwrap();
//! let mesher = FdmMesherComposite::new(vec![spot, rate]).unwrap();
//!
//! assert_eq!(mesher.layout().size(), 51 * 11);
//! assert_eq!(mesher.location(&[0, 10], 1).unwrap(), 0.15);
//! ```

mod composite;
mod concentrating;
mod fdm1d;
mod uniform;

pub use composite::FdmMesherComposite;
pub use concentrating::Concentration;
pub use fdm1d::Fdm1dMesher;
pub use uniform::UniformGridMesher;

use crate::error::FdmResult;
use crate::layout::FdmLinearOpLayout;
use std::sync::Arc;

/// Coordinates and spacings of a structured grid.
///
/// Spacings are `None` where the point has no neighbour on that side
/// (`dminus` at the first point of an axis, `dplus` at the last).
pub trait FdmMesher: Send + Sync {
    /// Index space of the grid.
    fn layout(&self) -> &Arc<FdmLinearOpLayout>;

    /// Distance to the previous point along `axis`.
    fn dminus(&self, coordinates: &[usize], axis: usize) -> FdmResult<Option<f64>>;

    /// Distance to the next point along `axis`.
    fn dplus(&self, coordinates: &[usize], axis: usize) -> FdmResult<Option<f64>>;

    /// State-variable value of the point along `axis`.
    fn location(&self, coordinates: &[usize], axis: usize) -> FdmResult<f64>;

    /// The distinct coordinates of `axis`, in increasing order.
    fn axis_locations(&self, axis: usize) -> FdmResult<Vec<f64>>;

    /// `location(point, axis)` for every point in flat-index order.
    fn locations(&self, axis: usize) -> FdmResult<Vec<f64>> {
        let axis_values = self.axis_locations(axis)?;
        let layout = self.layout();
        Ok((0..layout.size())
            .map(|i| axis_values[layout.coordinate(i, axis)])
            .collect())
    }
}

/// Backward and forward spacing of a point, mirrored at the edges.
///
/// At the first (last) point of an axis the missing backward (forward)
/// spacing is replaced by the one that exists.
pub(crate) fn mirrored_spacings<M: FdmMesher + ?Sized>(
    mesher: &M,
    coordinates: &[usize],
    axis: usize,
) -> FdmResult<(f64, f64)> {
    let hm = mesher.dminus(coordinates, axis)?;
    let hp = mesher.dplus(coordinates, axis)?;
    match (hm, hp) {
        (Some(hm), Some(hp)) => Ok((hm, hp)),
        (None, Some(hp)) => Ok((hp, hp)),
        (Some(hm), None) => Ok((hm, hm)),
        (None, None) => Err(crate::error::FdmError::configuration(format!(
            "axis {} has a single point; derivatives need at least two",
            axis
        ))),
    }
}
