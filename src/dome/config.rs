use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parameters of a dome and its brick layout.
///
/// # Example
///
/// ```
/// use dome_bricks::dome::DomeConfig;
///
/// let config = DomeConfig::default()
///     .with_radius(3.0)
///     .with_vertical_brick_count(6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomeConfig {
    /// Outer radius of the dome.
    ///
    /// Default: `2.0`
    pub radius: f64,

    /// Wall thickness as a fraction of the radius, in `(0, 1)`.
    ///
    /// Default: `0.15`
    pub thickness_ratio: f64,

    /// Width of the kerf between neighbouring bricks.
    ///
    /// Default: `0.03`
    pub bricks_gap: f64,

    /// Number of brick rows from the equator to the pole, cap included.
    /// Must evenly divide 90.
    ///
    /// Default: `5`
    pub vertical_brick_count: usize,

    /// Number of bricks around each ring. Must evenly divide 360.
    ///
    /// Default: `6`
    pub radial_brick_count: usize,

    /// Tessellation resolution (segments around, rings pole to pole).
    ///
    /// Default: `32`
    pub precision: usize,
}

impl Default for DomeConfig {
    fn default() -> Self {
        Self {
            radius: 2.0,
            thickness_ratio: 0.15,
            bricks_gap: 0.03,
            vertical_brick_count: 5,
            radial_brick_count: 6,
            precision: 32,
        }
    }
}

impl DomeConfig {
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    #[must_use]
    pub fn with_thickness_ratio(mut self, ratio: f64) -> Self {
        self.thickness_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_bricks_gap(mut self, gap: f64) -> Self {
        self.bricks_gap = gap;
        self
    }

    #[must_use]
    pub fn with_vertical_brick_count(mut self, count: usize) -> Self {
        self.vertical_brick_count = count;
        self
    }

    #[must_use]
    pub fn with_radial_brick_count(mut self, count: usize) -> Self {
        self.radial_brick_count = count;
        self
    }

    #[must_use]
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Wall thickness of the dome shell.
    #[must_use]
    pub fn wall_thickness(&self) -> f64 {
        self.radius * self.thickness_ratio
    }

    /// Checks every range and divisibility rule.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::OutOfRange {
                parameter: "radius",
                value: self.radius,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        if !(self.thickness_ratio > 0.0 && self.thickness_ratio < 1.0) {
            return Err(ConfigError::OutOfRange {
                parameter: "thickness_ratio",
                value: self.thickness_ratio,
                min: 0.0,
                max: 1.0,
            });
        }
        if !(self.bricks_gap > 0.0 && self.bricks_gap < self.radius) {
            return Err(ConfigError::OutOfRange {
                parameter: "bricks_gap",
                value: self.bricks_gap,
                min: 0.0,
                max: self.radius,
            });
        }
        check_count("vertical_brick_count", self.vertical_brick_count, 2, 90)?;
        check_count("radial_brick_count", self.radial_brick_count, 2, 360)?;
        if self.precision < 3 {
            return Err(ConfigError::BelowMinimum {
                parameter: "precision",
                value: self.precision,
                min: 3,
            });
        }
        Ok(())
    }
}

fn check_count(parameter: &'static str, value: usize, min: usize, range: usize) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::BelowMinimum {
            parameter,
            value,
            min,
        });
    }
    if range % value != 0 {
        return Err(ConfigError::NotADivisor {
            parameter,
            value,
            range,
        });
    }
    Ok(())
}

/// How a batch of pieces reacts to a failing piece.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchPolicy {
    /// Abort on the first failure.
    #[default]
    FailFast,
    /// Keep going and report every failure alongside the pieces that succeeded.
    FailSoft,
}

/// Parameters of the per-brick hollowing pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HollowParams {
    /// Thickness of the remaining brick walls.
    ///
    /// Default: `0.02`
    pub wall_thickness: f64,

    /// Failure handling across pieces.
    ///
    /// Default: [`BatchPolicy::FailFast`]
    pub policy: BatchPolicy,
}

impl Default for HollowParams {
    fn default() -> Self {
        Self {
            wall_thickness: 0.02,
            policy: BatchPolicy::FailFast,
        }
    }
}

impl HollowParams {
    #[must_use]
    pub fn with_wall_thickness(mut self, thickness: f64) -> Self {
        self.wall_thickness = thickness;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for a non-positive wall thickness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wall_thickness.is_finite() && self.wall_thickness > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::OutOfRange {
                parameter: "wall_thickness",
                value: self.wall_thickness,
                min: 0.0,
                max: f64::INFINITY,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DomeConfig::default().validate().is_ok());
        assert!(HollowParams::default().validate().is_ok());
        assert!((DomeConfig::default().wall_thickness() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn non_divisors_are_rejected() {
        let err = DomeConfig::default()
            .with_vertical_brick_count(7)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotADivisor {
                parameter: "vertical_brick_count",
                value: 7,
                range: 90
            }
        ));
        let err = DomeConfig::default()
            .with_radial_brick_count(7)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotADivisor { range: 360, .. }));
    }

    #[test]
    fn minimum_counts() {
        let err = DomeConfig::default()
            .with_vertical_brick_count(1)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::BelowMinimum { min: 2, .. }));
        let err = DomeConfig::default().with_precision(2).validate().unwrap_err();
        assert!(matches!(err, ConfigError::BelowMinimum { parameter: "precision", .. }));
        assert!(DomeConfig::default()
            .with_vertical_brick_count(2)
            .with_radial_brick_count(2)
            .validate()
            .is_ok());
    }

    #[test]
    fn ranges() {
        assert!(DomeConfig::default().with_radius(0.0).validate().is_err());
        assert!(DomeConfig::default().with_radius(f64::NAN).validate().is_err());
        assert!(DomeConfig::default().with_thickness_ratio(1.0).validate().is_err());
        assert!(DomeConfig::default().with_bricks_gap(0.0).validate().is_err());
        assert!(DomeConfig::default().with_bricks_gap(2.5).validate().is_err());
        assert!(HollowParams::default().with_wall_thickness(-0.1).validate().is_err());
    }
}
