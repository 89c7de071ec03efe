//! Grids concentrated around a point of interest.
//!
//! Points are placed by the change of variable
//!
//! ```text
//! x(u) = c + d·sinh(c1·(1-u) + c2·u),   u in [0, 1]
//! c1 = asinh((lower - c)/d),  c2 = asinh((upper - c)/d),  d = density·(upper - lower)
//! ```
//!
//! which is uniform in `u` and compresses the grid near `c`. Smaller densities
//! concentrate harder.

use super::uniform::check_bounds;
use super::Fdm1dMesher;
use crate::error::{FdmError, FdmResult};

/// Where and how strongly a 1D grid is concentrated.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Concentration {
    /// Concentration point `c`, inside the axis bounds.
    pub point: f64,
    /// Relative width of the dense region, must be positive.
    pub density: f64,
    /// Place `point` exactly on a grid node.
    pub require_point: bool,
}

impl Concentration {
    /// Concentrate around `point` with the given density.
    pub fn new(point: f64, density: f64) -> Self {
        Self {
            point,
            density,
            require_point: false,
        }
    }

    /// Same concentration, with `point` forced onto a node.
    pub fn with_required_point(mut self) -> Self {
        self.require_point = true;
        self
    }

    fn validate(&self, lower: f64, upper: f64) -> FdmResult<()> {
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(FdmError::configuration(format!(
                "concentration density must be positive, got {}",
                self.density
            )));
        }
        if !self.point.is_finite() || self.point < lower || self.point > upper {
            return Err(FdmError::configuration(format!(
                "concentration point {} outside [{}, {}]",
                self.point, lower, upper
            )));
        }
        Ok(())
    }
}

impl Fdm1dMesher {
    /// Grid of `size` points on `[lower, upper]`, optionally concentrated.
    ///
    /// Without a concentration this is [`Fdm1dMesher::uniform`]. Both
    /// endpoints are always exactly `lower` and `upper`.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Configuration` for fewer than two points, an empty
    /// or non-finite interval, a non-positive density, or a concentration
    /// point outside the bounds. A required point strictly inside the
    /// interval needs at least three points.
    ///
    /// # Example
    ///
    /// ```
    /// use pricer_fdm::meshers::{Concentration, Fdm1dMesher};
    ///
    /// let strike = 100.0;
    /// let c = Concentration::new(strike, 0.05).with_required_point();
    /// let mesher = Fdm1dMesher::concentrating(50.0, 200.0, 40, Some(c)).unwrap();
    ///
    /// assert_eq!(mesher.lower(), 50.0);
    /// assert_eq!(mesher.upper(), 200.0);
    /// assert!(mesher.locations().contains(&strike));
    /// ```
    pub fn concentrating(
        lower: f64,
        upper: f64,
        size: usize,
        concentration: Option<Concentration>,
    ) -> FdmResult<Self> {
        let Some(conc) = concentration else {
            return Self::uniform(lower, upper, size);
        };
        check_bounds(lower, upper, size)?;
        conc.validate(lower, upper)?;

        let c = conc.point;
        let d = conc.density * (upper - lower);
        let c1 = ((lower - c) / d).asinh();
        let c2 = ((upper - c) / d).asinh();
        let last = (size - 1) as f64;

        // Optional remap u -> z, piecewise linear through (0,0), (u0,z0), (1,1),
        // so that the node j0 = u0·(n-1) lands on z0 = x^{-1}(c).
        let interior = c > lower && c < upper;
        let remap = if conc.require_point && interior {
            if size < 3 {
                return Err(FdmError::configuration(format!(
                    "required point {} strictly inside the axis needs at least 3 points",
                    c
                )));
            }
            let z0 = -c1 / (c2 - c1);
            let j0 = (z0 * last).round().clamp(1.0, last - 1.0);
            Some((j0 as usize, j0 / last, z0))
        } else {
            None
        };

        let mut locations: Vec<f64> = (0..size)
            .map(|i| {
                let u = i as f64 / last;
                let z = match remap {
                    Some((_, u0, z0)) if u <= u0 => u * z0 / u0,
                    Some((_, u0, z0)) => z0 + (u - u0) * (1.0 - z0) / (1.0 - u0),
                    None => u,
                };
                c + d * (c1 * (1.0 - z) + c2 * z).sinh()
            })
            .collect();
        locations[0] = lower;
        locations[size - 1] = upper;
        if let Some((j0, _, _)) = remap {
            locations[j0] = c;
        }

        Self::from_locations(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_uniform() {
        let a = Fdm1dMesher::concentrating(0.0, 1.0, 11, None).unwrap();
        let b = Fdm1dMesher::uniform(0.0, 1.0, 11).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_spacing_smallest_near_point() {
        let c = 100.0;
        let mesher =
            Fdm1dMesher::concentrating(0.0, 400.0, 101, Some(Concentration::new(c, 0.05))).unwrap();
        let locs = mesher.locations();
        let steps: Vec<f64> = locs.windows(2).map(|w| w[1] - w[0]).collect();
        let nearest = locs
            .iter()
            .enumerate()
            .min_by(|a, b| (a.1 - c).abs().total_cmp(&(b.1 - c).abs()))
            .map(|(i, _)| i)
            .unwrap();
        let near = steps[nearest.min(steps.len() - 1)];
        assert!(near < steps[0], "near {} vs lower edge {}", near, steps[0]);
        assert!(near < steps[steps.len() - 1]);
    }

    #[test]
    fn test_smaller_density_concentrates_harder() {
        let min_step = |density: f64| {
            let m = Fdm1dMesher::concentrating(
                -1.0,
                1.0,
                51,
                Some(Concentration::new(0.0, density)),
            )
            .unwrap();
            m.locations()
                .windows(2)
                .map(|w| w[1] - w[0])
                .fold(f64::INFINITY, f64::min)
        };
        assert!(min_step(0.01) < min_step(0.1));
        assert!(min_step(0.1) < min_step(1.0));
    }

    #[test]
    fn test_required_point_on_node() {
        let c = 0.3137;
        let mesher = Fdm1dMesher::concentrating(
            -1.0,
            2.0,
            30,
            Some(Concentration::new(c, 0.1).with_required_point()),
        )
        .unwrap();
        assert!(mesher.locations().iter().any(|&x| x == c));
    }

    #[test]
    fn test_required_point_at_edge() {
        let mesher = Fdm1dMesher::concentrating(
            0.0,
            1.0,
            10,
            Some(Concentration::new(0.0, 0.2).with_required_point()),
        )
        .unwrap();
        assert_eq!(mesher.lower(), 0.0);
        assert!(mesher.dplus(0).unwrap().unwrap() < mesher.dminus(9).unwrap().unwrap());
    }

    #[test]
    fn test_invalid_concentration() {
        let bad_density = Some(Concentration::new(0.5, 0.0));
        assert!(matches!(
            Fdm1dMesher::concentrating(0.0, 1.0, 10, bad_density),
            Err(FdmError::Configuration(_))
        ));
        let outside = Some(Concentration::new(1.5, 0.1));
        assert!(Fdm1dMesher::concentrating(0.0, 1.0, 10, outside).is_err());
        let too_few = Some(Concentration::new(0.5, 0.1).with_required_point());
        assert!(Fdm1dMesher::concentrating(0.0, 1.0, 2, too_few).is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(256))]

            #[test]
            fn test_endpoints_exact_and_increasing(
                lower in -50.0f64..50.0,
                width in 0.1f64..100.0,
                frac in 0.0f64..=1.0,
                density in 0.01f64..2.0,
                size in 3usize..200,
                require in any::<bool>(),
            ) {
                let upper = lower + width;
                let point = lower + frac * width;
                let mut conc = Concentration::new(point, density);
                if require {
                    conc = conc.with_required_point();
                }
                let mesher = Fdm1dMesher::concentrating(lower, upper, size, Some(conc)).unwrap();
                prop_assert_eq!(mesher.size(), size);
                prop_assert_eq!(mesher.lower(), lower);
                prop_assert_eq!(mesher.upper(), upper);
                prop_assert!(mesher.locations().windows(2).all(|w| w[1] > w[0]));
                if require {
                    prop_assert!(mesher.locations().contains(&point));
                }
            }
        }
    }
}
