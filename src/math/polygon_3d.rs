use super::{Point3, Vector3, TOLERANCE};

/// Newell's area vector of a (possibly non-planar) polygon.
///
/// Its direction is the polygon normal following the vertex winding and its
/// length is twice the polygon area. Coplanar vertices on a coordinate plane
/// yield exactly zero off-axis components.
#[must_use]
pub fn newell_vector(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    if n < 3 {
        return normal;
    }
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Unit normal of a polygon, or the zero vector for degenerate polygons.
#[must_use]
pub fn polygon_normal(points: &[Point3]) -> Vector3 {
    let normal = newell_vector(points);
    let len = normal.norm();
    if len < TOLERANCE {
        Vector3::zeros()
    } else {
        normal / len
    }
}

/// Compute the area of a 3D polygon.
#[must_use]
pub fn polygon_area_3d(points: &[Point3]) -> f64 {
    0.5 * newell_vector(points).norm()
}

/// Arithmetic mean of the polygon's vertices.
#[must_use]
pub fn vertex_centroid(points: &[Point3]) -> Option<Point3> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    #[allow(clippy::cast_precision_loss)]
    let count = points.len() as f64;
    Some(Point3::from(sum / count))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_square() -> Vec<Point3> {
        vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn unit_square_area() {
        assert!((polygon_area_3d(&unit_square()) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn triangle_area() {
        let tri = vec![p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(0.0, 3.0, 0.0)];
        assert!((polygon_area_3d(&tri) - 6.0).abs() < TOLERANCE);
    }

    #[test]
    fn flat_polygon_normal_is_exact() {
        let mut sq = unit_square();
        sq.reverse();
        let n = polygon_normal(&sq);
        assert_eq!(n, Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn degenerate_polygon_has_zero_normal() {
        let line = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)];
        assert_eq!(polygon_normal(&line), Vector3::zeros());
    }

    #[test]
    fn centroid_of_square() {
        let c = vertex_centroid(&unit_square()).unwrap();
        assert!((c - p(0.5, 0.5, 0.0)).norm() < TOLERANCE);
        assert!(vertex_centroid(&[]).is_none());
    }
}
