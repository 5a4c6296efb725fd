use std::f64::consts::PI;

use crate::math::spherical::{azimuth_dir, polar_dir, radial_dir, spherical_point};
use crate::math::{Point3, TOLERANCE};

use super::cell::{AzimuthSpan, Cell, Precision};
use super::mesh::{Patch, PolyMesh};

/// Number of grid steps needed to cover `span` with steps no wider than `step`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn steps(span: f64, step: f64) -> usize {
    ((span / step - 1e-9).ceil() as usize).max(1)
}

/// Evenly spaced samples from `low` to `high` with exact endpoints.
fn samples(low: f64, high: f64, count: usize) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let n = count as f64;
    (0..=count)
        .map(|k| {
            if k == count {
                high
            } else {
                #[allow(clippy::cast_precision_loss)]
                let t = k as f64 / n;
                low + (high - low) * t
            }
        })
        .collect()
}

/// Azimuth samples for a span. A full revolution repeats its first sample at the end
/// so seams weld.
fn azimuth_samples(span: AzimuthSpan, precision: Precision) -> Vec<f64> {
    match span {
        AzimuthSpan::Full => {
            let mut values = samples(0.0, 2.0 * PI, precision.segments);
            if let Some(last) = values.last_mut() {
                *last = 0.0;
            }
            values
        }
        AzimuthSpan::Range { start, end } => {
            samples(start, end, steps(end - start, precision.azimuth_step()))
        }
    }
}

/// Boundary faces of one cell, appended to `mesh`.
///
/// Each cell is closed on its own: sphere patches at both radii (the inner one
/// skipped when it collapses to the centre), cone patches at polar limits away
/// from the axis, and meridian planes for bounded azimuth spans. Every face is
/// wound so its normal points out of the cell.
pub fn tessellate_cell(mesh: &mut PolyMesh, cell: &Cell, precision: Precision) {
    let polar = samples(
        cell.polar_min,
        cell.polar_max,
        steps(cell.polar_max - cell.polar_min, precision.polar_step()),
    );
    let azimuth = azimuth_samples(cell.azimuth, precision);
    let mid_azimuth = |j: usize| {
        let (a0, a1) = (azimuth[j], azimuth[j + 1]);
        // The seam sample of a full revolution wraps back to zero.
        if a1 < a0 { 0.5 * (a0 + a1 + 2.0 * PI) } else { 0.5 * (a0 + a1) }
    };
    let (r0, r1) = (cell.inner, cell.outer);

    for k in 0..polar.len() - 1 {
        let (p0, p1) = (polar[k], polar[k + 1]);
        let mid_p = 0.5 * (p0 + p1);
        for j in 0..azimuth.len() - 1 {
            let (a0, a1) = (azimuth[j], azimuth[j + 1]);
            let dir = radial_dir(mid_p, mid_azimuth(j));
            let quad = |r: f64| -> [Point3; 4] {
                [
                    spherical_point(r, p0, a0),
                    spherical_point(r, p1, a0),
                    spherical_point(r, p1, a1),
                    spherical_point(r, p0, a1),
                ]
            };
            mesh.add_oriented_polygon(&quad(r1), &dir, Patch::Outer);
            if r0 > TOLERANCE {
                mesh.add_oriented_polygon(&quad(r0), &(-dir), Patch::Inner);
            }
        }
    }

    let polar_caps = [
        (cell.polar_min, cell.polar_min > TOLERANCE, -1.0, Patch::PolarLow),
        (cell.polar_max, cell.polar_max < PI - TOLERANCE, 1.0, Patch::PolarHigh),
    ];
    for (p, present, facing, patch) in polar_caps {
        if !present {
            continue;
        }
        for j in 0..azimuth.len() - 1 {
            let (a0, a1) = (azimuth[j], azimuth[j + 1]);
            let outward = polar_dir(p, mid_azimuth(j)) * facing;
            let quad = [
                spherical_point(r0, p, a0),
                spherical_point(r1, p, a0),
                spherical_point(r1, p, a1),
                spherical_point(r0, p, a1),
            ];
            mesh.add_oriented_polygon(&quad, &outward, patch);
        }
    }

    if let AzimuthSpan::Range { start, end } = cell.azimuth {
        for (a, facing, patch) in [(start, -1.0, Patch::AzimuthStart), (end, 1.0, Patch::AzimuthEnd)] {
            let outward = azimuth_dir(a) * facing;
            for k in 0..polar.len() - 1 {
                let (p0, p1) = (polar[k], polar[k + 1]);
                let quad = [
                    spherical_point(r0, p0, a),
                    spherical_point(r1, p0, a),
                    spherical_point(r1, p1, a),
                    spherical_point(r0, p1, a),
                ];
                mesh.add_oriented_polygon(&quad, &outward, patch);
            }
        }
    }
}

/// Tessellates a set of cells into one mesh.
#[must_use]
pub fn tessellate(cells: &[Cell], precision: Precision) -> PolyMesh {
    let mut mesh = PolyMesh::new();
    for cell in cells {
        tessellate_cell(&mut mesh, cell, precision);
    }
    mesh
}
