//! Configuration for the overlap relaxation engine.
//!
//! A [`RelaxationConfig`] is deserializable from scene files and buildable in
//! code through [`RelaxationConfigBuilder`]. Every entry point validates the
//! configuration before touching particle state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MAX_ITERATIONS: u32 = 100;
const DEFAULT_PRECISION: f64 = 0.33;
const DEFAULT_THOROUGHNESS: u32 = 100;
const DEFAULT_MAX_SEARCH_DISTANCE: f64 = 100.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("precision must be positive, got {0}")]
    NonPositivePrecision(f64),

    #[error("max_iterations must be at least 1")]
    ZeroIterations,

    #[error("thoroughness must be at least 1")]
    ZeroThoroughness,

    #[error("max_search_distance must be positive, got {0}")]
    NonPositiveSearchDistance(f64),
}

/// Strategy used to turn one overlapping particle pair into a correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelaxMethod {
    /// Fit a separating plane through the contact point cloud and push along
    /// its normal by the mean penetration depth.
    #[default]
    Distance,
    /// Sample the intersection volume and push along the line of centers by a
    /// step proportional to its cube root.
    Volume,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelaxationConfig {
    /// Pair estimation strategy.
    pub method: RelaxMethod,
    /// Hard cap on relaxation iterations.
    pub max_iterations: u32,
    /// Step scale for the volume method and the base of the convergence
    /// threshold, in frame units.
    pub precision: f64,
    /// Target sample count per pair for volume estimation. The actual grid is
    /// the nearest per-axis cube, never below 2 per axis.
    pub thoroughness: u32,
    /// Furthest a boundary surface may be from a particle center and still
    /// clip its motion, in frame units.
    pub max_search_distance: f64,
    /// Re-orient manifold-bound particles so their local z axis follows the
    /// surface normal after projection.
    pub align_to_normal: bool,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            method: RelaxMethod::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            precision: DEFAULT_PRECISION,
            thoroughness: DEFAULT_THOROUGHNESS,
            max_search_distance: DEFAULT_MAX_SEARCH_DISTANCE,
            align_to_normal: true,
        }
    }
}

impl RelaxationConfig {
    pub fn builder() -> RelaxationConfigBuilder {
        RelaxationConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.precision > 0.0) {
            return Err(ConfigError::NonPositivePrecision(self.precision));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.thoroughness == 0 {
            return Err(ConfigError::ZeroThoroughness);
        }
        if !(self.max_search_distance > 0.0) {
            return Err(ConfigError::NonPositiveSearchDistance(
                self.max_search_distance,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelaxationConfigBuilder {
    config: RelaxationConfig,
}

impl RelaxationConfigBuilder {
    pub fn method(mut self, method: RelaxMethod) -> Self {
        self.config.method = method;
        self
    }

    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    pub fn precision(mut self, precision: f64) -> Self {
        self.config.precision = precision;
        self
    }

    pub fn thoroughness(mut self, thoroughness: u32) -> Self {
        self.config.thoroughness = thoroughness;
        self
    }

    pub fn max_search_distance(mut self, max_search_distance: f64) -> Self {
        self.config.max_search_distance = max_search_distance;
        self
    }

    pub fn align_to_normal(mut self, align: bool) -> Self {
        self.config.align_to_normal = align;
        self
    }

    pub fn build(self) -> Result<RelaxationConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RelaxationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.method, RelaxMethod::Distance);
        assert_eq!(config.max_iterations, 100);
    }

    #[test]
    fn builder_rejects_invalid_parameters() {
        let err = RelaxationConfig::builder().precision(0.0).build();
        assert_eq!(err.unwrap_err(), ConfigError::NonPositivePrecision(0.0));

        let err = RelaxationConfig::builder().max_iterations(0).build();
        assert_eq!(err.unwrap_err(), ConfigError::ZeroIterations);

        let err = RelaxationConfig::builder().thoroughness(0).build();
        assert_eq!(err.unwrap_err(), ConfigError::ZeroThoroughness);

        let err = RelaxationConfig::builder().max_search_distance(-1.0).build();
        assert_eq!(
            err.unwrap_err(),
            ConfigError::NonPositiveSearchDistance(-1.0)
        );
    }

    #[test]
    fn builder_overrides_reach_the_config() {
        let config = RelaxationConfig::builder()
            .method(RelaxMethod::Volume)
            .max_iterations(10)
            .precision(0.5)
            .thoroughness(1000)
            .align_to_normal(false)
            .build()
            .unwrap();
        assert_eq!(config.method, RelaxMethod::Volume);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.thoroughness, 1000);
        assert!(!config.align_to_normal);
    }

    #[test]
    fn config_deserializes_with_partial_fields() {
        let config: RelaxationConfig = serde_json::from_str(
            r#"{ "method": "volume", "precision": 0.25 }"#,
        )
        .unwrap();
        assert_eq!(config.method, RelaxMethod::Volume);
        assert_eq!(config.precision, 0.25);
        assert_eq!(config.max_iterations, 100);
    }
}
