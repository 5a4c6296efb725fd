//! Spherical coordinates about the world origin.
//!
//! `polar` is measured from +Z (0 at the pole, π/2 on the equator) and
//! `azimuth` counter-clockwise from +X, both in radians.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::{Point3, Vector3, TOLERANCE};

/// `(sin, cos)` of a polar angle, exact at the pole, the equator and the nadir.
///
/// Points generated on the equator therefore have `z == 0.0` exactly.
#[must_use]
pub fn polar_sin_cos(polar: f64) -> (f64, f64) {
    if polar.abs() < TOLERANCE {
        (0.0, 1.0)
    } else if (polar - FRAC_PI_2).abs() < TOLERANCE {
        (1.0, 0.0)
    } else if (polar - PI).abs() < TOLERANCE {
        (0.0, -1.0)
    } else {
        polar.sin_cos()
    }
}

/// Cartesian point at radius `r`, polar angle `polar` and azimuth `azimuth`.
#[must_use]
pub fn spherical_point(r: f64, polar: f64, azimuth: f64) -> Point3 {
    let (sin_p, cos_p) = polar_sin_cos(polar);
    let (sin_a, cos_a) = azimuth.sin_cos();
    Point3::new(r * sin_p * cos_a, r * sin_p * sin_a, r * cos_p)
}

/// Unit radial direction.
#[must_use]
pub fn radial_dir(polar: f64, azimuth: f64) -> Vector3 {
    spherical_point(1.0, polar, azimuth).coords
}

/// Unit direction of increasing polar angle (down the meridian).
#[must_use]
pub fn polar_dir(polar: f64, azimuth: f64) -> Vector3 {
    let (sin_p, cos_p) = polar_sin_cos(polar);
    let (sin_a, cos_a) = azimuth.sin_cos();
    Vector3::new(cos_p * cos_a, cos_p * sin_a, -sin_p)
}

/// Unit direction of increasing azimuth.
#[must_use]
pub fn azimuth_dir(azimuth: f64) -> Vector3 {
    let (sin_a, cos_a) = azimuth.sin_cos();
    Vector3::new(-sin_a, cos_a, 0.0)
}

/// Wraps an angle in radians into `[0, 2π)`.
#[must_use]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU - TOLERANCE {
        0.0
    } else {
        wrapped
    }
}

/// Azimuth of a point's XY projection in degrees, normalised to `[0, 360)`.
#[must_use]
pub fn azimuth_degrees(point: &Point3) -> f64 {
    wrap_angle(point.y.atan2(point.x)).to_degrees()
}
