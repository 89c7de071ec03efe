//! One-dimensional grid with precomputed spacings.

use crate::error::{FdmError, FdmResult};

/// Strictly increasing coordinates of a single axis.
///
/// Uniform and concentrating grids are constructors of this one type; they
/// differ only in how the coordinates are placed.
#[derive(Clone, Debug, PartialEq)]
pub struct Fdm1dMesher {
    locations: Vec<f64>,
    dplus: Vec<Option<f64>>,
    dminus: Vec<Option<f64>>,
}

impl Fdm1dMesher {
    /// Build a mesher from explicit coordinates.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Configuration` if fewer than two coordinates are
    /// given, or they are not finite and strictly increasing.
    ///
    /// # Example
    ///
    /// ```
    /// use pricer_fdm::meshers::Fdm1dMesher;
    ///
    /// let mesher = Fdm1dMesher::from_locations(vec![0.0, 0.5, 2.0]).unwrap();
    /// assert_eq!(mesher.dplus(0).unwrap(), Some(0.5));
    /// assert_eq!(mesher.dminus(2).unwrap(), Some(1.5));
    /// assert_eq!(mesher.dminus(0).unwrap(), None);
    ///
    /// assert!(Fdm1dMesher::from_locations(vec![0.0, 0.0, 1.0]).is_err());
    /// ```
    pub fn from_locations(locations: Vec<f64>) -> FdmResult<Self> {
        if locations.len() < 2 {
            return Err(FdmError::configuration(format!(
                "a 1D mesher needs at least 2 points, got {}",
                locations.len()
            )));
        }
        if let Some(i) = locations.iter().position(|x| !x.is_finite()) {
            return Err(FdmError::configuration(format!(
                "mesher location {} is not finite",
                i
            )));
        }
        if let Some(i) = locations.windows(2).position(|w| w[1] <= w[0]) {
            return Err(FdmError::configuration(format!(
                "mesher locations not strictly increasing at index {}",
                i + 1
            )));
        }
        let steps: Vec<f64> = locations.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(Self::from_steps(locations, &steps))
    }

    /// Assemble from coordinates and the `n-1` forward steps between them.
    pub(crate) fn from_steps(locations: Vec<f64>, steps: &[f64]) -> Self {
        let n = locations.len();
        let mut dplus = vec![None; n];
        let mut dminus = vec![None; n];
        for (i, &h) in steps.iter().enumerate() {
            dplus[i] = Some(h);
            dminus[i + 1] = Some(h);
        }
        Self {
            locations,
            dplus,
            dminus,
        }
    }

    /// Number of points.
    #[inline]
    pub fn size(&self) -> usize {
        self.locations.len()
    }

    /// All coordinates, increasing.
    #[inline]
    pub fn locations(&self) -> &[f64] {
        &self.locations
    }

    /// Coordinate of point `i`.
    pub fn location(&self, i: usize) -> FdmResult<f64> {
        self.locations
            .get(i)
            .copied()
            .ok_or_else(|| self.out_of_range(i))
    }

    /// Forward spacing of point `i`; `None` at the last point.
    pub fn dplus(&self, i: usize) -> FdmResult<Option<f64>> {
        self.dplus.get(i).copied().ok_or_else(|| self.out_of_range(i))
    }

    /// Backward spacing of point `i`; `None` at the first point.
    pub fn dminus(&self, i: usize) -> FdmResult<Option<f64>> {
        self.dminus.get(i).copied().ok_or_else(|| self.out_of_range(i))
    }

    /// First coordinate.
    #[inline]
    pub fn lower(&self) -> f64 {
        self.locations[0]
    }

    /// Last coordinate.
    #[inline]
    pub fn upper(&self) -> f64 {
        self.locations[self.locations.len() - 1]
    }

    fn out_of_range(&self, i: usize) -> FdmError {
        FdmError::index(format!(
            "point {} of a 1D mesher with {} points",
            i,
            self.locations.len()
        ))
    }
}
