use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::DomeConfig;

/// Cut angles derived from the brick counts, in degrees.
///
/// The first polar cut at [`cap_angle`](Self::cap_angle) separates the cap; the
/// [`polar_angles`](Self::polar_angles) then split the rest of the dome into
/// rings and the [`azimuth_angles`](Self::azimuth_angles) split every ring into
/// wedges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngularPlan {
    cap_angle: f64,
    polar_angles: Vec<f64>,
    azimuth_angles: Vec<f64>,
}

impl AngularPlan {
    /// Polar angle of the cut that separates the cap: `90 / vertical_brick_count`.
    #[must_use]
    pub fn cap_angle(&self) -> f64 {
        self.cap_angle
    }

    /// Ring cuts after the cap cut, strictly increasing and below 90.
    #[must_use]
    pub fn polar_angles(&self) -> &[f64] {
        &self.polar_angles
    }

    /// Meridian cuts `0, a, 2a, ...` with `a = 360 / radial_brick_count`.
    #[must_use]
    pub fn azimuth_angles(&self) -> &[f64] {
        &self.azimuth_angles
    }

    /// Every polar cut in application order: the cap angle, then the ring cuts.
    ///
    /// Has `vertical_brick_count - 1` entries.
    #[must_use]
    pub fn cut_angles(&self) -> Vec<f64> {
        std::iter::once(self.cap_angle)
            .chain(self.polar_angles.iter().copied())
            .collect()
    }

    /// Number of rings below the cap.
    #[must_use]
    pub fn ring_count(&self) -> usize {
        self.polar_angles.len() + 1
    }

    /// Number of pieces a decomposition yields: the cap plus every wedge.
    #[must_use]
    pub fn piece_count(&self) -> usize {
        1 + self.ring_count() * self.azimuth_angles.len()
    }
}

/// Derives the cut angles from a configuration.
pub struct PlanAngles<'a> {
    config: &'a DomeConfig,
}

impl<'a> PlanAngles<'a> {
    /// Creates a new `PlanAngles` operation.
    #[must_use]
    pub fn new(config: &'a DomeConfig) -> Self {
        Self { config }
    }

    /// Validates the configuration and computes the plan.
    ///
    /// Angles are stepped in whole degrees, so every cut lands exactly on a
    /// multiple of the step.
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::InvalidConfiguration`](crate::error::DomeError::InvalidConfiguration)
    /// if the configuration fails [`DomeConfig::validate`].
    pub fn execute(&self) -> Result<AngularPlan> {
        self.config.validate()?;

        let unit = 90 / self.config.vertical_brick_count;
        let step = 360 / self.config.radial_brick_count;
        let polar_angles = (2..)
            .map(|k| k * unit)
            .take_while(|&angle| angle < 90)
            .map(degrees)
            .collect();
        let azimuth_angles = (0..)
            .map(|k| k * step)
            .take_while(|&angle| angle < 360)
            .map(degrees)
            .collect();

        Ok(AngularPlan {
            cap_angle: degrees(unit),
            polar_angles,
            azimuth_angles,
        })
    }
}

/// Plans the cuts for `config`. Shorthand for [`PlanAngles::execute`].
///
/// # Errors
///
/// See [`PlanAngles::execute`].
pub fn plan(config: &DomeConfig) -> Result<AngularPlan> {
    PlanAngles::new(config).execute()
}

#[allow(clippy::cast_precision_loss)]
fn degrees(value: usize) -> f64 {
    value as f64
}
