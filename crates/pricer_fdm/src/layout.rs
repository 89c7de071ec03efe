//! N-dimensional structured index space.
//!
//! [`FdmLinearOpLayout`] maps between flat indices in `[0, size)` and
//! per-axis coordinates. Axis 0 varies fastest: the stride of axis `i` is the
//! product of the sizes of all axes before it.
//!
//! Neighbour lookup is pure stride arithmetic. What happens when a step leaves
//! the grid is decided by the [`BoundaryPolicy`] configured for that axis.
//!
//! # Example
//!
//! ```
//! use pricer_fdm::layout::FdmLinearOpLayout;
//!
//! let layout = FdmLinearOpLayout::new(vec![3, 4]).unwrap();
//! assert_eq!(layout.size(), 12);
//!
//! let index = layout.index(&[2, 1]).unwrap();
//! assert_eq!(index, 5);
//! assert_eq!(layout.coordinates(index).unwrap(), vec![2, 1]);
//!
//! // Clamp (default): stepping past the edge stays on the edge
//! assert_eq!(layout.neighbor(index, 0, 1).unwrap(), index);
//! ```

use crate::error::{FdmError, FdmResult};

/// Behaviour of a neighbour lookup that steps outside an axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundaryPolicy {
    /// Stay on the first/last point of the axis.
    #[default]
    Clamp,
    /// Mirror about the edge point (`-1 -> 1`, `n -> n-2`).
    Reflect,
    /// Periodic axis (`-1 -> n-1`, `n -> 0`).
    Wrap,
    /// Leaving the axis is an [`FdmError::Index`].
    Strict,
}

impl BoundaryPolicy {
    /// Resolve a possibly out-of-range coordinate on an axis of size `dim`.
    fn resolve(self, target: isize, dim: usize) -> Option<usize> {
        let n = dim as isize;
        if (0..n).contains(&target) {
            return Some(target as usize);
        }
        match self {
            BoundaryPolicy::Clamp => Some(target.clamp(0, n - 1) as usize),
            BoundaryPolicy::Wrap => Some(target.rem_euclid(n) as usize),
            BoundaryPolicy::Reflect => {
                if n == 1 {
                    return Some(0);
                }
                let period = 2 * (n - 1);
                let folded = target.rem_euclid(period);
                let mirrored = if folded > n - 1 {
                    period - folded
                } else {
                    folded
                };
                Some(mirrored as usize)
            }
            BoundaryPolicy::Strict => None,
        }
    }
}

/// A grid point visited by [`LayoutIter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridPoint {
    /// Flat index of the point.
    pub index: usize,
    /// Per-axis coordinates of the point.
    pub coordinates: Vec<usize>,
}

/// Structured index space with per-axis sizes and neighbour policies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FdmLinearOpLayout {
    dims: Vec<usize>,
    spacing: Vec<usize>,
    size: usize,
    policies: Vec<BoundaryPolicy>,
}

impl FdmLinearOpLayout {
    /// Create a layout from per-axis sizes, using [`BoundaryPolicy::Clamp`]
    /// on every axis.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Configuration` if `dims` is empty, any axis has size
    /// zero, or the total size overflows `usize`.
    pub fn new(dims: Vec<usize>) -> FdmResult<Self> {
        if dims.is_empty() {
            return Err(FdmError::configuration("layout needs at least one axis"));
        }
        let mut spacing = Vec::with_capacity(dims.len());
        let mut size: usize = 1;
        for (axis, &dim) in dims.iter().enumerate() {
            if dim == 0 {
                return Err(FdmError::configuration(format!(
                    "axis {} has size zero",
                    axis
                )));
            }
            spacing.push(size);
            size = size.checked_mul(dim).ok_or_else(|| {
                FdmError::configuration(format!("layout size overflows: {:?}", dims))
            })?;
        }
        let policies = vec![BoundaryPolicy::default(); dims.len()];
        Ok(Self {
            dims,
            spacing,
            size,
            policies,
        })
    }

    /// Replace the neighbour policy of every axis.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Configuration` if the number of policies differs
    /// from the number of axes.
    pub fn with_policies(mut self, policies: Vec<BoundaryPolicy>) -> FdmResult<Self> {
        if policies.len() != self.dims.len() {
            return Err(FdmError::configuration(format!(
                "{} boundary policies given for {} axes",
                policies.len(),
                self.dims.len()
            )));
        }
        self.policies = policies;
        Ok(self)
    }

    /// Replace the neighbour policy of a single axis.
    pub fn with_policy(mut self, axis: usize, policy: BoundaryPolicy) -> FdmResult<Self> {
        self.check_axis(axis)?;
        self.policies[axis] = policy;
        Ok(self)
    }

    /// Total number of grid points.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of axes.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dims.len()
    }

    /// Per-axis sizes.
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Per-axis strides in the flat index.
    #[inline]
    pub fn spacing(&self) -> &[usize] {
        &self.spacing
    }

    /// Neighbour policy of an axis.
    pub fn policy(&self, axis: usize) -> FdmResult<BoundaryPolicy> {
        self.check_axis(axis)?;
        Ok(self.policies[axis])
    }

    /// Flat index of a coordinate tuple.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Index` if the tuple has the wrong arity or any
    /// coordinate is outside its axis.
    pub fn index(&self, coordinates: &[usize]) -> FdmResult<usize> {
        if coordinates.len() != self.dims.len() {
            return Err(FdmError::index(format!(
                "{} coordinates given for {} axes",
                coordinates.len(),
                self.dims.len()
            )));
        }
        let mut index = 0;
        for (axis, (&c, &dim)) in coordinates.iter().zip(&self.dims).enumerate() {
            if c >= dim {
                return Err(FdmError::index(format!(
                    "coordinate {} on axis {} (dim {})",
                    c, axis, dim
                )));
            }
            index += c * self.spacing[axis];
        }
        Ok(index)
    }

    /// Coordinate tuple of a flat index.
    pub fn coordinates(&self, index: usize) -> FdmResult<Vec<usize>> {
        self.check_index(index)?;
        Ok(self
            .dims
            .iter()
            .zip(&self.spacing)
            .map(|(&dim, &stride)| (index / stride) % dim)
            .collect())
    }

    /// Coordinate of an in-range flat index along one axis.
    #[inline]
    pub(crate) fn coordinate(&self, index: usize, axis: usize) -> usize {
        (index / self.spacing[axis]) % self.dims[axis]
    }

    /// Index reached by moving `offset` steps along `axis` from `index`.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Index` if `index` or `axis` is out of range, or if
    /// the axis policy is [`BoundaryPolicy::Strict`] and the step leaves the
    /// grid.
    pub fn neighbor(&self, index: usize, axis: usize, offset: isize) -> FdmResult<usize> {
        self.check_index(index)?;
        self.check_axis(axis)?;
        let c = self.coordinate(index, axis);
        let target = c as isize + offset;
        let resolved = self.policies[axis]
            .resolve(target, self.dims[axis])
            .ok_or_else(|| {
                FdmError::index(format!(
                    "step {} from coordinate {} leaves axis {} (dim {})",
                    offset, c, axis, self.dims[axis]
                ))
            })?;
        Ok(index - c * self.spacing[axis] + resolved * self.spacing[axis])
    }

    /// In-line neighbour used by operator construction: always clamps, so a
    /// stencil never couples two different grid lines.
    #[inline]
    pub(crate) fn line_neighbor(&self, index: usize, axis: usize, offset: isize) -> usize {
        let c = self.coordinate(index, axis);
        let resolved = BoundaryPolicy::Clamp
            .resolve(c as isize + offset, self.dims[axis])
            .unwrap_or(c);
        index - c * self.spacing[axis] + resolved * self.spacing[axis]
    }

    /// Restartable lazy traversal of all points in flat-index order.
    pub fn iter(&self) -> LayoutIter<'_> {
        LayoutIter {
            layout: self,
            next: 0,
            coordinates: vec![0; self.dims.len()],
        }
    }

    /// Flat indices of the first point of every grid line along `axis`.
    pub fn line_starts(&self, axis: usize) -> FdmResult<Vec<usize>> {
        self.check_axis(axis)?;
        Ok((0..self.size)
            .filter(|&i| self.coordinate(i, axis) == 0)
            .collect())
    }

    pub(crate) fn check_axis(&self, axis: usize) -> FdmResult<()> {
        if axis >= self.dims.len() {
            return Err(FdmError::index(format!(
                "axis {} of a {}-dimensional layout",
                axis,
                self.dims.len()
            )));
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> FdmResult<()> {
        if index >= self.size {
            return Err(FdmError::index(format!(
                "flat index {} (size {})",
                index, self.size
            )));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FdmLinearOpLayout {
    type Item = GridPoint;
    type IntoIter = LayoutIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over `(index, coordinates)` pairs of a layout.
///
/// Cloning the iterator forks the traversal; calling
/// [`FdmLinearOpLayout::iter`] again restarts it.
#[derive(Clone, Debug)]
pub struct LayoutIter<'a> {
    layout: &'a FdmLinearOpLayout,
    next: usize,
    coordinates: Vec<usize>,
}

impl Iterator for LayoutIter<'_> {
    type Item = GridPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.layout.size {
            return None;
        }
        let point = GridPoint {
            index: self.next,
            coordinates: self.coordinates.clone(),
        };
        self.next += 1;
        // odometer increment, axis 0 fastest
        for (c, &dim) in self.coordinates.iter_mut().zip(&self.layout.dims) {
            *c += 1;
            if *c < dim {
                break;
            }
            *c = 0;
        }
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.layout.size - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LayoutIter<'_> {}
