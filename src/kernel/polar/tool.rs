//! Cutting tools and how they act on spherical cells.
//!
//! A tool keeps its local shape plus a rigid placement. Only placements whose
//! effect on a cell is again a cell are supported: cones whose apex sits at the
//! world origin and open along +Z, boxes filling the half-space below the
//! equator, and thin boxes standing on a meridian half-plane.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::KernelError;
use crate::kernel::OffsetBias;
use crate::math::{Isometry3, Point3, Vector3, TOLERANCE};

use super::cell::Cell;

/// Placement tolerance for tool classification, relative to the tool size.
const PLACEMENT_EPSILON: f64 = 1e-9;

/// Cone surface with its apex at local `z = -depth/2`, opening towards +Z.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeTool {
    pub half_angle: f64,
    pub depth: f64,
    /// Signed distances `(low, high)` of the kerf from the cone surface,
    /// positive away from the axis. `None` until thickened.
    pub kerf: Option<(f64, f64)>,
    pub placement: Isometry3,
}

/// Box with half extents along its local axes: width X, thickness Y, height Z.
#[derive(Debug, Clone, PartialEq)]
pub struct SlabTool {
    pub half_extents: Vector3,
    pub placement: Isometry3,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tool {
    Cone(ConeTool),
    Slab(SlabTool),
}

/// What a slab does to a region once its placement is known.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SlabEffect {
    /// Removes everything below `z = 0`.
    BelowEquator,
    /// Removes a band of `thickness` around the meridian half-plane at
    /// `azimuth`, for distances from the axis in `[reach_start, reach_end]`.
    HalfPlane {
        azimuth: f64,
        reach_start: f64,
        reach_end: f64,
        z_low: f64,
        z_high: f64,
        thickness: f64,
    },
}

impl Tool {
    /// Moves the tool by a further rigid transform.
    pub fn transform(&mut self, iso: &Isometry3) {
        let placement = match self {
            Self::Cone(cone) => &mut cone.placement,
            Self::Slab(slab) => &mut slab.placement,
        };
        *placement = iso * *placement;
    }

    /// Thickens the tool surface.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Unsupported`] for slabs and already thickened cones.
    pub fn thicken(&mut self, thickness: f64, bias: OffsetBias) -> Result<(), KernelError> {
        match self {
            Self::Cone(cone) if cone.kerf.is_none() => {
                let (outer, inner) = bias.skins();
                cone.kerf = Some((thickness * inner, thickness * outer));
                Ok(())
            }
            Self::Cone(_) => Err(KernelError::Unsupported(
                "cone has already been thickened".into(),
            )),
            Self::Slab(_) => Err(KernelError::Unsupported(
                "slabs are already solid; offset is only defined for cone surfaces".into(),
            )),
        }
    }

    /// Subtracts the tool from a set of cells.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Unsupported`] for placements whose effect on the
    /// cells is not itself a set of cells.
    pub fn cut(&self, cells: &[Cell]) -> Result<Vec<Cell>, KernelError> {
        match self {
            Self::Cone(cone) => cone.cut(cells),
            Self::Slab(slab) => slab.cut(cells),
        }
    }
}

impl ConeTool {
    fn cut(&self, cells: &[Cell]) -> Result<Vec<Cell>, KernelError> {
        let Some((low, high)) = self.kerf else {
            return Err(KernelError::Unsupported(
                "an open cone surface encloses no volume; thicken it first".into(),
            ));
        };
        let apex = self.placement * Point3::new(0.0, 0.0, -0.5 * self.depth);
        let axis = self.placement * Vector3::z();
        let scale = self.depth.max(1.0);
        if apex.coords.norm() > PLACEMENT_EPSILON * scale
            || (axis - Vector3::z()).norm() > PLACEMENT_EPSILON
        {
            return Err(KernelError::Unsupported(format!(
                "cone must have its apex at the origin and open along +Z (apex {apex}, axis {axis})"
            )));
        }

        let slant = self.depth / self.half_angle.cos();
        let mut out = Vec::with_capacity(cells.len() + 1);
        for cell in cells {
            let r = cell.mid_radius();
            if cell.outer > slant + TOLERANCE {
                return Err(KernelError::Unsupported(format!(
                    "cone of slant length {slant} does not reach radius {}",
                    cell.outer
                )));
            }
            if r <= low.abs().max(high.abs()) {
                return Err(KernelError::Unsupported(format!(
                    "kerf ({low}, {high}) is too thick at radius {r}"
                )));
            }
            let band_low = self.half_angle + (low / r).asin();
            let band_high = self.half_angle + (high / r).asin();
            out.extend(cell.remove_polar_band(band_low, band_high));
        }
        Ok(out)
    }
}

impl SlabTool {
    fn cut(&self, cells: &[Cell]) -> Result<Vec<Cell>, KernelError> {
        match self.effect(cells)? {
            SlabEffect::BelowEquator => Ok(cells
                .iter()
                .filter_map(|cell| cell.clip_polar_max(FRAC_PI_2))
                .collect()),
            SlabEffect::HalfPlane {
                azimuth,
                reach_start,
                reach_end,
                z_low,
                z_high,
                thickness,
            } => {
                let mut arms = vec![(azimuth, reach_start.max(0.0), reach_end)];
                if reach_start < 0.0 {
                    arms.push((azimuth + PI, 0.0, -reach_start));
                }
                let mut out = cells.to_vec();
                for (arm_azimuth, near, far) in arms {
                    out = cut_half_plane(&out, arm_azimuth, near, far, (z_low, z_high), thickness)?;
                }
                Ok(out)
            }
        }
    }

    fn effect(&self, cells: &[Cell]) -> Result<SlabEffect, KernelError> {
        let reach = cells.iter().map(|c| c.outer).fold(0.0, f64::max);
        let rotation = self.placement.rotation;
        let center = self.placement.translation.vector;
        let h = self.half_extents;
        let size = h.norm().max(1.0);

        // World-space AABB, exact for axis-aligned placements.
        let extent = |world_axis: Vector3| -> f64 {
            let local = rotation.inverse() * world_axis;
            local.x.abs() * h.x + local.y.abs() * h.y + local.z.abs() * h.z
        };
        let axis_aligned = [Vector3::x(), Vector3::y(), Vector3::z()].iter().all(|a| {
            let w = rotation * a;
            let max = w.x.abs().max(w.y.abs()).max(w.z.abs());
            (max - 1.0).abs() < PLACEMENT_EPSILON
        });
        if axis_aligned {
            let (ex, ey, ez) = (extent(Vector3::x()), extent(Vector3::y()), extent(Vector3::z()));
            let top = center.z + ez;
            let covers = center.x - ex <= -reach
                && center.x + ex >= reach
                && center.y - ey <= -reach
                && center.y + ey >= reach
                && center.z - ez <= -reach;
            if top.abs() < PLACEMENT_EPSILON * size && covers {
                return Ok(SlabEffect::BelowEquator);
            }
        }

        let height_axis = rotation * Vector3::z();
        let normal = rotation * Vector3::y();
        let direction = rotation * Vector3::x();
        if (height_axis.z.abs() - 1.0).abs() < PLACEMENT_EPSILON
            && normal.dot(&center).abs() < PLACEMENT_EPSILON * size
        {
            let along = direction.dot(&center);
            return Ok(SlabEffect::HalfPlane {
                azimuth: direction.y.atan2(direction.x),
                reach_start: along - h.x,
                reach_end: along + h.x,
                z_low: center.z - h.z,
                z_high: center.z + h.z,
                thickness: 2.0 * h.y,
            });
        }

        Err(KernelError::Unsupported(
            "slab is neither a meridian half-plane nor the half-space below the equator".into(),
        ))
    }
}

/// Removes a meridian band of `thickness` at `azimuth` for axis distances in `[near, far]`.
fn cut_half_plane(
    cells: &[Cell],
    azimuth: f64,
    near: f64,
    far: f64,
    (z_low, z_high): (f64, f64),
    thickness: f64,
) -> Result<Vec<Cell>, KernelError> {
    let mut out = Vec::with_capacity(cells.len() * 2);
    for cell in cells {
        let rho_ref = cell.mid_radius() * cell.mid_polar().sin();
        let half_width = if rho_ref > TOLERANCE {
            (0.5 * thickness / rho_ref).min(1.0).asin()
        } else {
            FRAC_PI_2
        };
        let (rho_min, rho_max) = cell.rho_range();
        if !cell.azimuth_overlaps(azimuth, half_width)
            || rho_max <= near + TOLERANCE
            || rho_min >= far - TOLERANCE
        {
            out.push(*cell);
            continue;
        }
        if rho_min < near - TOLERANCE || rho_max > far + TOLERANCE {
            return Err(KernelError::Unsupported(format!(
                "slab reaching [{near}, {far}] from the axis only partly crosses a cell spanning [{rho_min}, {rho_max}]"
            )));
        }
        let (cell_z_low, cell_z_high) = cell.z_range();
        if cell_z_low < z_low - TOLERANCE || cell_z_high > z_high + TOLERANCE {
            return Err(KernelError::Unsupported(format!(
                "slab spanning z [{z_low}, {z_high}] only partly crosses a cell spanning [{cell_z_low}, {cell_z_high}]"
            )));
        }
        out.extend(cell.remove_azimuth_band(azimuth, half_width));
    }
    Ok(out)
}
