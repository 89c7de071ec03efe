use super::{Fdm1dMesher, FdmMesher};
use crate::error::{FdmError, FdmResult};
use crate::layout::FdmLinearOpLayout;
use std::sync::Arc;

/// Cross product of one [`Fdm1dMesher`] per axis.
#[derive(Clone, Debug)]
pub struct FdmMesherComposite {
    layout: Arc<FdmLinearOpLayout>,
    meshers: Vec<Fdm1dMesher>,
}

impl FdmMesherComposite {
    /// Combine 1D meshers; the layout dimensions are their sizes.
    pub fn new(meshers: Vec<Fdm1dMesher>) -> FdmResult<Self> {
        let dims = meshers.iter().map(Fdm1dMesher::size).collect();
        let layout = Arc::new(FdmLinearOpLayout::new(dims)?);
        Ok(Self { layout, meshers })
    }

    /// Combine 1D meshers over an existing layout, e.g. one with non-default
    /// boundary policies.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Configuration` if the mesher count or any mesher
    /// size disagrees with the layout.
    pub fn with_layout(
        layout: Arc<FdmLinearOpLayout>,
        meshers: Vec<Fdm1dMesher>,
    ) -> FdmResult<Self> {
        if meshers.len() != layout.dim() {
            return Err(FdmError::configuration(format!(
                "{} meshers given for a {}-dimensional layout",
                meshers.len(),
                layout.dim()
            )));
        }
        for (axis, (mesher, &dim)) in meshers.iter().zip(layout.dims()).enumerate() {
            if mesher.size() != dim {
                return Err(FdmError::configuration(format!(
                    "mesher on axis {} has {} points, layout expects {}",
                    axis,
                    mesher.size(),
                    dim
                )));
            }
        }
        Ok(Self { layout, meshers })
    }

    /// The 1D mesher of an axis.
    pub fn mesher(&self, axis: usize) -> FdmResult<&Fdm1dMesher> {
        self.meshers.get(axis).ok_or_else(|| {
            FdmError::index(format!(
                "axis {} of a {}-dimensional mesher",
                axis,
                self.meshers.len()
            ))
        })
    }

    fn lookup(&self, coordinates: &[usize], axis: usize) -> FdmResult<(&Fdm1dMesher, usize)> {
        let mesher = self.mesher(axis)?;
        let c = coordinates.get(axis).copied().ok_or_else(|| {
            FdmError::index(format!("point {:?} has no axis {}", coordinates, axis))
        })?;
        Ok((mesher, c))
    }
}

impl FdmMesher for FdmMesherComposite {
    fn layout(&self) -> &Arc<FdmLinearOpLayout> {
        &self.layout
    }

    fn dminus(&self, coordinates: &[usize], axis: usize) -> FdmResult<Option<f64>> {
        let (mesher, c) = self.lookup(coordinates, axis)?;
        mesher.dminus(c)
    }

    fn dplus(&self, coordinates: &[usize], axis: usize) -> FdmResult<Option<f64>> {
        let (mesher, c) = self.lookup(coordinates, axis)?;
        mesher.dplus(c)
    }

    fn location(&self, coordinates: &[usize], axis: usize) -> FdmResult<f64> {
        let (mesher, c) = self.lookup(coordinates, axis)?;
        mesher.location(c)
    }

    fn axis_locations(&self, axis: usize) -> FdmResult<Vec<f64>> {
        Ok(self.mesher(axis)?.locations().to_vec())
    }
}
