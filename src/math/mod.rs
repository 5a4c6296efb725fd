pub mod polygon_3d;
pub mod spherical;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Rigid transform (rotation followed by translation).
pub type Isometry3 = nalgebra::Isometry3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Normal and position components below this magnitude carry no sign.
pub const SIGN_EPSILON: f64 = 1e-9;

/// Relative + absolute closeness test, `|a - b| <= atol + rtol * |b|`.
///
/// Asymmetric: `b` is the reference value.
#[must_use]
pub fn is_close(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    (a - b).abs() <= atol + rtol * b.abs()
}

/// Sign of a value as `-1`, `0` or `1`, treating `|value| <= SIGN_EPSILON` as zero.
#[must_use]
pub fn sign(value: f64) -> i8 {
    if value > SIGN_EPSILON {
        1
    } else if value < -SIGN_EPSILON {
        -1
    } else {
        0
    }
}

/// Median of a slice. The mean of the two middle values for even lengths.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) * 0.5)
    } else {
        Some(sorted[mid])
    }
}
