use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::math::spherical::{polar_sin_cos, wrap_angle};
use crate::math::TOLERANCE;

/// Azimuthal extent of a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AzimuthSpan {
    /// The full revolution, with no azimuthal boundary faces.
    Full,
    /// `[start, end]` in radians with `start ∈ [0, 2π)` and `0 < end - start < 2π`.
    /// `end` may exceed 2π when the span wraps past +X.
    Range { start: f64, end: f64 },
}

impl AzimuthSpan {
    /// Angular width in radians.
    #[must_use]
    pub fn width(self) -> f64 {
        match self {
            Self::Full => TAU,
            Self::Range { start, end } => end - start,
        }
    }

    /// Mid-azimuth in radians (0 for a full revolution).
    #[must_use]
    pub fn mid(self) -> f64 {
        match self {
            Self::Full => 0.0,
            Self::Range { start, end } => 0.5 * (start + end),
        }
    }

    /// The same span turned by `delta` radians about the polar axis.
    #[must_use]
    pub fn rotated(self, delta: f64) -> Self {
        match self {
            Self::Full => Self::Full,
            Self::Range { start, end } => Self::range(start + delta, end + delta),
        }
    }

    fn range(start: f64, end: f64) -> Self {
        let wrapped = wrap_angle(start);
        Self::Range {
            start: wrapped,
            end: wrapped + (end - start),
        }
    }
}

/// Tessellation resolution: segments around the axis, rings from pole to nadir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    pub segments: usize,
    pub rings: usize,
}

impl Precision {
    #[must_use]
    pub fn polar_step(self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let rings = self.rings as f64;
        PI / rings
    }

    #[must_use]
    pub fn azimuth_step(self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let segments = self.segments as f64;
        TAU / segments
    }
}

/// A spherical cell `r ∈ [inner, outer] × polar ∈ [polar_min, polar_max] × azimuth`.
///
/// Cells of one region never touch: every cut removes a band of positive width,
/// so each cell is its own connected component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub inner: f64,
    pub outer: f64,
    pub polar_min: f64,
    pub polar_max: f64,
    pub azimuth: AzimuthSpan,
}

impl Cell {
    /// Enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let (_, cos_min) = polar_sin_cos(self.polar_min);
        let (_, cos_max) = polar_sin_cos(self.polar_max);
        (self.outer.powi(3) - self.inner.powi(3)) / 3.0 * (cos_min - cos_max) * self.azimuth.width()
    }

    #[must_use]
    pub fn mid_radius(&self) -> f64 {
        0.5 * (self.inner + self.outer)
    }

    #[must_use]
    pub fn mid_polar(&self) -> f64 {
        0.5 * (self.polar_min + self.polar_max)
    }

    /// Range of distances from the polar axis covered by the cell.
    #[must_use]
    pub fn rho_range(&self) -> (f64, f64) {
        let (sin_min, _) = polar_sin_cos(self.polar_min);
        let (sin_max, _) = polar_sin_cos(self.polar_max);
        let low = self.inner * sin_min.min(sin_max);
        let high = if self.polar_min <= FRAC_PI_2 && FRAC_PI_2 <= self.polar_max {
            self.outer
        } else {
            self.outer * sin_min.max(sin_max)
        };
        (low, high)
    }

    /// Range of heights covered by the cell.
    #[must_use]
    pub fn z_range(&self) -> (f64, f64) {
        let (_, cos_min) = polar_sin_cos(self.polar_min);
        let (_, cos_max) = polar_sin_cos(self.polar_max);
        let low = (self.inner * cos_max).min(self.outer * cos_max);
        let high = (self.inner * cos_min).max(self.outer * cos_min);
        (low, high)
    }

    /// `true` if the polar band `(low, high)` overlaps the cell.
    #[must_use]
    pub fn polar_overlaps(&self, low: f64, high: f64) -> bool {
        low < self.polar_max - TOLERANCE && high > self.polar_min + TOLERANCE
    }

    /// Removes the polar band `(low, high)` and returns what is left.
    #[must_use]
    pub fn remove_polar_band(&self, low: f64, high: f64) -> Vec<Cell> {
        if !self.polar_overlaps(low, high) {
            return vec![*self];
        }
        let mut parts = Vec::with_capacity(2);
        if low > self.polar_min + TOLERANCE {
            parts.push(Cell {
                polar_max: low,
                ..*self
            });
        }
        if high < self.polar_max - TOLERANCE {
            parts.push(Cell {
                polar_min: high,
                ..*self
            });
        }
        parts
    }

    /// Keeps only the part of the cell with `polar <= limit`.
    #[must_use]
    pub fn clip_polar_max(&self, limit: f64) -> Option<Cell> {
        if self.polar_min >= limit - TOLERANCE {
            None
        } else {
            Some(Cell {
                polar_max: self.polar_max.min(limit),
                ..*self
            })
        }
    }

    /// `true` if the azimuth band `center ± half_width` overlaps the cell.
    #[must_use]
    pub fn azimuth_overlaps(&self, center: f64, half_width: f64) -> bool {
        match self.azimuth {
            AzimuthSpan::Full => true,
            AzimuthSpan::Range { start, end } => [-TAU, 0.0, TAU].iter().any(|shift| {
                let low = center - half_width + shift;
                let high = center + half_width + shift;
                low < end - TOLERANCE && high > start + TOLERANCE
            }),
        }
    }

    /// Removes the azimuth band `center ± half_width` and returns what is left.
    #[must_use]
    pub fn remove_azimuth_band(&self, center: f64, half_width: f64) -> Vec<Cell> {
        if 2.0 * half_width >= TAU - TOLERANCE {
            return Vec::new();
        }
        let mut parts = match self.azimuth {
            AzimuthSpan::Full => {
                return vec![Cell {
                    azimuth: AzimuthSpan::range(center + half_width, center + TAU - half_width),
                    ..*self
                }];
            }
            AzimuthSpan::Range { .. } => vec![*self],
        };
        for shift in [-TAU, 0.0, TAU] {
            let low = center - half_width + shift;
            let high = center + half_width + shift;
            parts = parts
                .into_iter()
                .flat_map(|cell| cell.remove_range_band(low, high))
                .collect();
        }
        parts
    }

    fn remove_range_band(self, low: f64, high: f64) -> Vec<Cell> {
        let AzimuthSpan::Range { start, end } = self.azimuth else {
            return vec![self];
        };
        if low >= end - TOLERANCE || high <= start + TOLERANCE {
            return vec![self];
        }
        let mut parts = Vec::with_capacity(2);
        if low > start + TOLERANCE {
            parts.push(Cell {
                azimuth: AzimuthSpan::range(start, low),
                ..self
            });
        }
        if high < end - TOLERANCE {
            parts.push(Cell {
                azimuth: AzimuthSpan::range(high, end),
                ..self
            });
        }
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_cell() -> Cell {
        Cell {
            inner: 1.7,
            outer: 2.0,
            polar_min: 0.0,
            polar_max: FRAC_PI_2,
            azimuth: AzimuthSpan::Full,
        }
    }

    #[test]
    fn hemisphere_shell_volume() {
        let expected = 2.0 / 3.0 * PI * (8.0 - 1.7_f64.powi(3));
        assert!((shell_cell().volume() - expected).abs() < 1e-12);
    }

    #[test]
    fn polar_band_splits_in_two() {
        let parts = shell_cell().remove_polar_band(0.3, 0.32);
        assert_eq!(parts.len(), 2);
        assert!((parts[0].polar_max - 0.3).abs() < TOLERANCE);
        assert!((parts[1].polar_min - 0.32).abs() < TOLERANCE);
    }

    #[test]
    fn polar_band_outside_is_noop() {
        let cell = Cell {
            polar_min: 0.5,
            ..shell_cell()
        };
        assert_eq!(cell.remove_polar_band(0.1, 0.2), vec![cell]);
    }

    #[test]
    fn first_azimuth_cut_opens_full_revolution() {
        let parts = shell_cell().remove_azimuth_band(0.0, 0.01);
        assert_eq!(parts.len(), 1);
        let AzimuthSpan::Range { start, end } = parts[0].azimuth else {
            panic!("expected a range");
        };
        assert!((start - 0.01).abs() < TOLERANCE);
        assert!((end - (TAU - 0.01)).abs() < TOLERANCE);
    }

    #[test]
    fn wrapped_range_is_cut_across_zero() {
        let cell = Cell {
            azimuth: AzimuthSpan::Range {
                start: 5.0,
                end: 5.0 + 2.0,
            },
            ..shell_cell()
        };
        // 0.5 rad lies inside the wrapped span [5.0, 7.0].
        let parts = cell.remove_azimuth_band(0.5, 0.01);
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|c| c.azimuth.width() < 2.0));
    }

    #[test]
    fn rotated_span_wraps() {
        let span = AzimuthSpan::Range {
            start: 5.0,
            end: 6.0,
        };
        let AzimuthSpan::Range { start, end } = span.rotated(2.0) else {
            panic!("expected a range");
        };
        assert!((start - (7.0 - TAU)).abs() < 1e-12);
        assert!((end - start - 1.0).abs() < 1e-12);
        assert_eq!(AzimuthSpan::Full.rotated(1.0), AzimuthSpan::Full);
    }

    #[test]
    fn rho_and_z_ranges() {
        let cell = Cell {
            polar_min: 0.4,
            polar_max: 0.9,
            ..shell_cell()
        };
        let (rho_low, rho_high) = cell.rho_range();
        assert!((rho_low - 1.7 * 0.4_f64.sin()).abs() < 1e-12);
        assert!((rho_high - 2.0 * 0.9_f64.sin()).abs() < 1e-12);
        let (z_low, z_high) = cell.z_range();
        assert!((z_low - 1.7 * 0.9_f64.cos()).abs() < 1e-12);
        assert!((z_high - 2.0 * 0.4_f64.cos()).abs() < 1e-12);
    }
}
