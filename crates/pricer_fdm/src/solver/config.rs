//! Finite-difference solver configuration.

use crate::error::{FdmError, FdmResult};
use crate::schemes::FdmSchemeDesc;

/// Maximum number of time steps allowed per rollback.
pub const MAX_TIME_STEPS: usize = 1_000_000;

/// Time discretisation and scheme of a finite-difference run.
///
/// Immutable; use [`FdmSolverConfigBuilder`] to construct instances.
/// `time_steps` counts every step of the rollback, the first
/// `damping_steps` of which use implicit Euler.
///
/// # Examples
///
/// ```rust
/// use pricer_fdm::schemes::FdmSchemeDesc;
/// use pricer_fdm::solver::FdmSolverConfig;
///
/// let config = FdmSolverConfig::builder()
///     .maturity(1.0)
///     .time_steps(100)
///     .damping_steps(2)
///     .scheme(FdmSchemeDesc::crank_nicolson())
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.time_steps(), 100);
/// assert_eq!(config.scheme(), FdmSchemeDesc::crank_nicolson());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FdmSolverConfig {
    /// Time to maturity in years.
    maturity: f64,
    /// Total number of time steps.
    time_steps: usize,
    /// Leading implicit Euler steps.
    damping_steps: usize,
    /// Scheme used after damping.
    scheme: FdmSchemeDesc,
}

impl FdmSolverConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> FdmSolverConfigBuilder {
        FdmSolverConfigBuilder::default()
    }

    /// Returns the time to maturity.
    #[inline]
    pub fn maturity(&self) -> f64 {
        self.maturity
    }

    /// Returns the total number of time steps.
    #[inline]
    pub fn time_steps(&self) -> usize {
        self.time_steps
    }

    /// Returns the number of damping steps.
    #[inline]
    pub fn damping_steps(&self) -> usize {
        self.damping_steps
    }

    /// Returns the scheme description.
    #[inline]
    pub fn scheme(&self) -> FdmSchemeDesc {
        self.scheme
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Configuration` if:
    /// - `maturity` is not positive and finite
    /// - `time_steps` is 0 or greater than 1,000,000
    /// - `damping_steps` exceeds `time_steps`
    /// - the scheme parameters are invalid
    pub fn validate(&self) -> FdmResult<()> {
        if !self.maturity.is_finite() || self.maturity <= 0.0 {
            return Err(FdmError::configuration(format!(
                "maturity must be positive, got {}",
                self.maturity
            )));
        }
        if self.time_steps == 0 || self.time_steps > MAX_TIME_STEPS {
            return Err(FdmError::configuration(format!(
                "time steps must lie in [1, {}], got {}",
                MAX_TIME_STEPS, self.time_steps
            )));
        }
        if self.damping_steps > self.time_steps {
            return Err(FdmError::configuration(format!(
                "damping steps ({}) exceed time steps ({})",
                self.damping_steps, self.time_steps
            )));
        }
        self.scheme.validate()
    }
}

/// Builder for [`FdmSolverConfig`].
///
/// `maturity` and `time_steps` are required; `damping_steps` defaults to 0
/// and the scheme to Douglas.
#[derive(Clone, Debug, Default)]
pub struct FdmSolverConfigBuilder {
    maturity: Option<f64>,
    time_steps: Option<usize>,
    damping_steps: usize,
    scheme: FdmSchemeDesc,
}

impl FdmSolverConfigBuilder {
    /// Sets the time to maturity in years.
    #[inline]
    pub fn maturity(mut self, maturity: f64) -> Self {
        self.maturity = Some(maturity);
        self
    }

    /// Sets the total number of time steps.
    #[inline]
    pub fn time_steps(mut self, time_steps: usize) -> Self {
        self.time_steps = Some(time_steps);
        self
    }

    /// Sets the number of leading implicit Euler steps.
    #[inline]
    pub fn damping_steps(mut self, damping_steps: usize) -> Self {
        self.damping_steps = damping_steps;
        self
    }

    /// Sets the scheme.
    #[inline]
    pub fn scheme(mut self, scheme: FdmSchemeDesc) -> Self {
        self.scheme = scheme;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Configuration` if a required field is missing or
    /// [`FdmSolverConfig::validate`] fails.
    pub fn build(self) -> FdmResult<FdmSolverConfig> {
        let maturity = self
            .maturity
            .ok_or_else(|| FdmError::configuration("maturity must be specified"))?;
        let time_steps = self
            .time_steps
            .ok_or_else(|| FdmError::configuration("time_steps must be specified"))?;

        let config = FdmSolverConfig {
            maturity,
            time_steps,
            damping_steps: self.damping_steps,
            scheme: self.scheme,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemes::FdmSchemeKind;

    #[test]
    fn test_config_builder_defaults() {
        let config = FdmSolverConfig::builder()
            .maturity(0.5)
            .time_steps(50)
            .build()
            .unwrap();

        assert_eq!(config.maturity(), 0.5);
        assert_eq!(config.damping_steps(), 0);
        assert_eq!(config.scheme().kind, FdmSchemeKind::Douglas);
    }

    #[test]
    fn test_config_invalid_steps() {
        let zero = FdmSolverConfig::builder().maturity(1.0).time_steps(0).build();
        assert!(matches!(zero, Err(FdmError::Configuration(_))));

        let too_many = FdmSolverConfig::builder()
            .maturity(1.0)
            .time_steps(MAX_TIME_STEPS + 1)
            .build();
        assert!(too_many.is_err());
    }

    #[test]
    fn test_config_damping_exceeds_steps() {
        let result = FdmSolverConfig::builder()
            .maturity(1.0)
            .time_steps(3)
            .damping_steps(4)
            .build();
        assert!(matches!(result, Err(FdmError::Configuration(_))));
    }

    #[test]
    fn test_config_invalid_maturity() {
        for maturity in [0.0, -1.0, f64::NAN] {
            let result = FdmSolverConfig::builder().maturity(maturity).time_steps(10).build();
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_config_missing_fields() {
        assert!(FdmSolverConfig::builder().time_steps(10).build().is_err());
        assert!(FdmSolverConfig::builder().maturity(1.0).build().is_err());
    }

    #[test]
    fn test_config_rejects_invalid_scheme() {
        let scheme = FdmSchemeDesc {
            theta: -1.0,
            ..FdmSchemeDesc::douglas()
        };
        let result = FdmSolverConfig::builder()
            .maturity(1.0)
            .time_steps(10)
            .scheme(scheme)
            .build();
        assert!(result.is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde_roundtrip() {
        let config = FdmSolverConfig::builder()
            .maturity(2.0)
            .time_steps(200)
            .damping_steps(5)
            .scheme(FdmSchemeDesc::crank_nicolson())
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: FdmSolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
