//! Reference [`GeometryKernel`] for solids made of spherical cells about the origin.
//!
//! A volumetric solid is a union of disjoint cells
//! `r ∈ [inner, outer] × polar ∈ [min, max] × azimuth span`. Booleans against
//! cones through the origin and meridian or equatorial slabs map cells to cells,
//! so cuts are exact in angle and radius; only the boundary faces are
//! tessellated. Once faces are deleted or a solid is moved off the cell
//! lattice it falls back to a plain polygon mesh, on which the face-level
//! operations (offset, component separation, queries) keep working.

mod cell;
mod mesh;
mod tessellate;
mod tool;

use std::collections::HashSet;
use std::f64::consts::{FRAC_PI_2, PI};

use tracing::debug;

use crate::error::KernelError;
use crate::kernel::{FaceRecord, GeometryKernel, OffsetBias};
use crate::math::{Isometry3, Point3, Vector3, TOLERANCE};

pub use cell::{AzimuthSpan, Cell, Precision};
pub use mesh::{FaceId, Patch};

use mesh::PolyMesh;
use tool::{ConeTool, SlabTool, Tool};

/// Analytic kernel over spherical cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarKernel;

impl PolarKernel {
    /// Creates a new kernel.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Enclosed volume. Exact for cell regions, polyhedral for meshes.
    #[must_use]
    pub fn volume(&self, solid: &Solid) -> f64 {
        match &solid.shape {
            Shape::Region(region) if !region.open => region.cells.iter().map(Cell::volume).sum(),
            _ => solid.mesh.volume(),
        }
    }

    /// Patch a face was generated on, if it belongs to the solid.
    #[must_use]
    pub fn patch(&self, solid: &Solid, face: FaceId) -> Option<Patch> {
        solid
            .mesh
            .iter_faces()
            .find_map(|(id, f)| (id == face).then_some(f.patch))
    }
}

/// A solid owned by [`PolarKernel`].
#[derive(Debug, Clone)]
pub struct Solid {
    shape: Shape,
    mesh: PolyMesh,
    origin: Point3,
}

#[derive(Debug, Clone)]
enum Shape {
    Region(Region),
    Tool(Tool),
    Mesh,
}

#[derive(Debug, Clone)]
struct Region {
    cells: Vec<Cell>,
    precision: Precision,
    /// Faces have been deleted; the mesh no longer bounds the cells.
    open: bool,
}

impl Solid {
    fn region(cells: Vec<Cell>, precision: Precision) -> Self {
        let mesh = tessellate::tessellate(&cells, precision);
        Self {
            shape: Shape::Region(Region {
                cells,
                precision,
                open: false,
            }),
            mesh,
            origin: Point3::origin(),
        }
    }

    fn tool(tool: Tool, mesh: PolyMesh) -> Self {
        Self {
            shape: Shape::Tool(tool),
            mesh,
            origin: Point3::origin(),
        }
    }

    fn from_mesh(mesh: PolyMesh, origin: Point3) -> Self {
        Self {
            shape: Shape::Mesh,
            mesh,
            origin,
        }
    }

    /// Reference origin, as last set by [`GeometryKernel::set_origin`].
    #[must_use]
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    /// Number of boundary faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    /// The spherical cells of a closed region, or `None` once the solid is a plain mesh.
    #[must_use]
    pub fn cells(&self) -> Option<&[Cell]> {
        match &self.shape {
            Shape::Region(region) if !region.open => Some(&region.cells),
            _ => None,
        }
    }

    /// `true` if every edge is shared by two faces.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.mesh.boundary_edges().is_empty()
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), KernelError> {
    if value.is_finite() && value > TOLERANCE {
        Ok(())
    } else {
        Err(KernelError::InvalidInput(format!("{name} must be positive, got {value}")))
    }
}

fn cone_mesh(base_radius: f64, depth: f64, segments: usize) -> PolyMesh {
    let mut mesh = PolyMesh::new();
    let apex = Point3::new(0.0, 0.0, -0.5 * depth);
    let rim = |a: f64| Point3::new(base_radius * a.cos(), base_radius * a.sin(), 0.5 * depth);
    #[allow(clippy::cast_precision_loss)]
    let step = 2.0 * PI / segments as f64;
    for j in 0..segments {
        #[allow(clippy::cast_precision_loss)]
        let a0 = j as f64 * step;
        // Close the seam on the first sample.
        let a1 = if j + 1 == segments { 0.0 } else { a0 + step };
        let mid = a0 + 0.5 * step;
        let outward = Vector3::new(mid.cos(), mid.sin(), 0.0);
        mesh.add_oriented_polygon(&[apex, rim(a0), rim(a1)], &outward, Patch::Tool);
    }
    mesh
}

fn box_mesh(half: &Vector3) -> PolyMesh {
    let mut mesh = PolyMesh::new();
    for axis in 0..3 {
        for sign in [-1.0, 1.0] {
            let mut normal = Vector3::zeros();
            normal[axis] = sign;
            let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
            let corner = |su: f64, sv: f64| {
                let mut c = Vector3::zeros();
                c[axis] = sign * half[axis];
                c[u] = su * half[u];
                c[v] = sv * half[v];
                Point3::from(c)
            };
            let quad = [
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            ];
            mesh.add_oriented_polygon(&quad, &normal, Patch::Tool);
        }
    }
    mesh
}

/// `true` if the remaining faces are exactly the outer sphere patches of `cells`
/// and those cells are solid ball sectors (no inner sphere).
fn is_outer_surface(region: &Region, mesh: &PolyMesh) -> bool {
    if region.cells.iter().any(|c| c.inner > TOLERANCE) {
        return false;
    }
    let all_outer = mesh.iter_faces().all(|(_, f)| f.patch == Patch::Outer);
    let expected = tessellate::tessellate(&region.cells, region.precision)
        .iter_faces()
        .filter(|(_, f)| f.patch == Patch::Outer)
        .count();
    all_outer && mesh.face_count() == expected
}

impl GeometryKernel for PolarKernel {
    type Solid = Solid;
    type FaceId = FaceId;

    fn make_sphere_sector(
        &self,
        radius: f64,
        segments: usize,
        rings: usize,
        z_min: f64,
    ) -> Result<Solid, KernelError> {
        require_positive("sphere radius", radius)?;
        if segments < 3 || rings < 2 {
            return Err(KernelError::InvalidInput(format!(
                "sphere needs at least 3 segments and 2 rings, got {segments} x {rings}"
            )));
        }
        let polar_max = if z_min <= -radius + TOLERANCE {
            PI
        } else if z_min.abs() <= TOLERANCE {
            FRAC_PI_2
        } else if z_min >= radius {
            return Err(KernelError::InvalidInput(format!(
                "truncation height {z_min} removes the whole sphere of radius {radius}"
            )));
        } else {
            return Err(KernelError::Unsupported(format!(
                "sphere truncation at z = {z_min} is not a cell boundary"
            )));
        };
        let cell = Cell {
            inner: 0.0,
            outer: radius,
            polar_min: 0.0,
            polar_max,
            azimuth: AzimuthSpan::Full,
        };
        Ok(Solid::region(vec![cell], Precision { segments, rings }))
    }

    fn make_cone(&self, base_radius: f64, depth: f64, segments: usize) -> Result<Solid, KernelError> {
        require_positive("cone base radius", base_radius)?;
        require_positive("cone depth", depth)?;
        if segments < 3 {
            return Err(KernelError::InvalidInput(format!(
                "cone needs at least 3 segments, got {segments}"
            )));
        }
        let tool = Tool::Cone(ConeTool {
            half_angle: base_radius.atan2(depth),
            depth,
            kerf: None,
            placement: Isometry3::identity(),
        });
        Ok(Solid::tool(tool, cone_mesh(base_radius, depth, segments)))
    }

    fn make_slab(&self, width: f64, height: f64, thickness: f64) -> Result<Solid, KernelError> {
        require_positive("slab width", width)?;
        require_positive("slab height", height)?;
        require_positive("slab thickness", thickness)?;
        let half_extents = Vector3::new(width, thickness, height) * 0.5;
        let mesh = box_mesh(&half_extents);
        let tool = Tool::Slab(SlabTool {
            half_extents,
            placement: Isometry3::identity(),
        });
        Ok(Solid::tool(tool, mesh))
    }

    fn boolean_difference(&self, solid: Solid, tool: Solid) -> Result<Solid, KernelError> {
        let Shape::Region(region) = solid.shape else {
            return Err(KernelError::Unsupported(
                "difference is only defined on cell regions".into(),
            ));
        };
        if region.open {
            return Err(KernelError::Unsupported(
                "difference of an open surface".into(),
            ));
        }
        let Shape::Tool(tool) = tool.shape else {
            return Err(KernelError::Unsupported(
                "the cutting solid must be a cone or slab tool".into(),
            ));
        };
        let cells = tool.cut(&region.cells)?;
        if cells.is_empty() {
            return Err(KernelError::Failed("difference removed the whole solid".into()));
        }
        debug!(before = region.cells.len(), after = cells.len(), "cells cut");
        let mut result = Solid::region(cells, region.precision);
        result.origin = solid.origin;
        Ok(result)
    }

    fn shell_offset(&self, solid: Solid, thickness: f64, bias: OffsetBias) -> Result<Solid, KernelError> {
        require_positive("offset thickness", thickness)?;
        match solid.shape {
            Shape::Tool(mut tool) => {
                tool.thicken(thickness, bias)?;
                let mesh = solid.mesh.solidify(thickness, bias);
                Ok(Solid::tool(tool, mesh))
            }
            Shape::Region(region) if region.open && is_outer_surface(&region, &solid.mesh) => {
                let (outer_skin, inner_skin) = bias.skins();
                let mut cells = Vec::with_capacity(region.cells.len());
                for cell in &region.cells {
                    let inner = cell.outer + thickness * inner_skin;
                    if inner < 0.0 {
                        return Err(KernelError::InvalidInput(format!(
                            "offset of {thickness} is thicker than radius {}",
                            cell.outer
                        )));
                    }
                    cells.push(Cell {
                        inner,
                        outer: cell.outer + thickness * outer_skin,
                        ..*cell
                    });
                }
                let mut result = Solid::region(cells, region.precision);
                result.origin = solid.origin;
                Ok(result)
            }
            Shape::Region(_) | Shape::Mesh => Ok(Solid::from_mesh(
                solid.mesh.solidify(thickness, bias),
                solid.origin,
            )),
        }
    }

    fn separate_connected_components(&self, solid: Solid) -> Result<Vec<Solid>, KernelError> {
        if matches!(solid.shape, Shape::Tool(_)) {
            return Ok(vec![solid]);
        }
        match solid.shape {
            Shape::Region(region) if !region.open => Ok(region
                .cells
                .iter()
                .map(|cell| Solid::region(vec![*cell], region.precision))
                .collect()),
            Shape::Region(_) | Shape::Tool(_) | Shape::Mesh => Ok(solid
                .mesh
                .components()
                .into_iter()
                .map(|mesh| Solid::from_mesh(mesh, solid.origin))
                .collect()),
        }
    }

    fn component_count(&self, solid: &Solid) -> usize {
        match &solid.shape {
            Shape::Tool(_) => 1,
            Shape::Region(region) if !region.open => region.cells.len(),
            Shape::Region(_) | Shape::Mesh => solid.mesh.components().len(),
        }
    }

    fn faces(&self, solid: &Solid) -> Vec<FaceRecord<FaceId>> {
        solid.mesh.records()
    }

    fn delete_faces(&self, mut solid: Solid, faces: &HashSet<FaceId>) -> Result<Solid, KernelError> {
        if let Some(missing) = faces.iter().find(|f| !solid.mesh.contains_face(**f)) {
            return Err(KernelError::InvalidInput(format!(
                "face {missing:?} does not belong to the solid"
            )));
        }
        if faces.is_empty() {
            return Ok(solid);
        }
        solid.mesh.remove_faces(faces);
        solid.shape = match solid.shape {
            Shape::Region(region) => Shape::Region(Region { open: true, ..region }),
            Shape::Tool(_) | Shape::Mesh => Shape::Mesh,
        };
        Ok(solid)
    }

    fn centroid(&self, solid: &Solid) -> Point3 {
        solid.mesh.centroid()
    }

    fn set_origin(&self, solid: &mut Solid, point: Point3) {
        solid.origin = point;
    }

    fn translate(&self, solid: Solid, offset: &Vector3) -> Result<Solid, KernelError> {
        if offset.norm() <= TOLERANCE {
            return Ok(solid);
        }
        let iso = Isometry3::translation(offset.x, offset.y, offset.z);
        let origin = iso * solid.origin;
        match solid.shape {
            Shape::Tool(mut tool) => {
                tool.transform(&iso);
                let mut moved = Solid::tool(tool, solid.mesh.transformed(&iso));
                moved.origin = origin;
                Ok(moved)
            }
            Shape::Region(_) | Shape::Mesh => {
                Ok(Solid::from_mesh(solid.mesh.transformed(&iso), origin))
            }
        }
    }

    fn rotate(&self, solid: Solid, axis: &Vector3, angle: f64) -> Result<Solid, KernelError> {
        let length = axis.norm();
        if length <= TOLERANCE {
            return Err(KernelError::InvalidInput("rotation axis is zero".into()));
        }
        let unit = axis / length;
        let iso = Isometry3::rotation(unit * angle);
        let origin = iso * solid.origin;
        match solid.shape {
            Shape::Tool(mut tool) => {
                tool.transform(&iso);
                let mut moved = Solid::tool(tool, solid.mesh.transformed(&iso));
                moved.origin = origin;
                Ok(moved)
            }
            Shape::Region(region) if !region.open && (unit.z.abs() - 1.0).abs() <= TOLERANCE => {
                let delta = angle * unit.z.signum();
                let cells = region
                    .cells
                    .iter()
                    .map(|cell| Cell {
                        azimuth: cell.azimuth.rotated(delta),
                        ..*cell
                    })
                    .collect();
                let mut moved = Solid::region(cells, region.precision);
                moved.origin = origin;
                Ok(moved)
            }
            Shape::Region(_) | Shape::Mesh => {
                Ok(Solid::from_mesh(solid.mesh.transformed(&iso), origin))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn hemisphere_shell(kernel: &PolarKernel) -> Solid {
        let sphere = kernel.make_sphere_sector(2.0, 16, 16, -2.0).unwrap();
        let cutter = kernel.make_slab(8.0, 4.0, 8.0).unwrap();
        let cutter = kernel.translate(cutter, &Vector3::new(0.0, 0.0, -2.0)).unwrap();
        let dome = kernel.boolean_difference(sphere, cutter).unwrap();
        let flat: HashSet<FaceId> = kernel
            .faces(&dome)
            .into_iter()
            .filter(|f| f.all_vertices(|v| v.z == 0.0))
            .map(|f| f.id)
            .collect();
        assert_eq!(flat.len(), 16);
        let surface = kernel.delete_faces(dome, &flat).unwrap();
        kernel.shell_offset(surface, 0.3, OffsetBias::Inward).unwrap()
    }

    #[test]
    fn sphere_minus_bottom_box_then_offset_is_a_closed_shell() {
        let kernel = PolarKernel::new();
        let shell = hemisphere_shell(&kernel);
        let cells = shell.cells().unwrap();
        assert_eq!(cells.len(), 1);
        assert_relative_eq!(cells[0].inner, 1.7, epsilon = 1e-12);
        assert!(shell.is_closed());
        let expected = 2.0 / 3.0 * PI * (8.0 - 1.7_f64.powi(3));
        assert_relative_eq!(kernel.volume(&shell), expected, epsilon = 1e-9);
    }

    #[test]
    fn cone_then_slab_cuts_separate_into_components() {
        let kernel = PolarKernel::new();
        let shell = hemisphere_shell(&kernel);

        let angle = 45_f64.to_radians();
        let cone = kernel.make_cone(2.0 * angle.tan(), 2.0, 16).unwrap();
        let cone = kernel.translate(cone, &Vector3::new(0.0, 0.0, 1.0)).unwrap();
        let cone = kernel.shell_offset(cone, 0.015, OffsetBias::Symmetric).unwrap();
        let cut = kernel.boolean_difference(shell, cone).unwrap();
        assert_eq!(cut.cells().unwrap().len(), 2);

        let parts = kernel.separate_connected_components(cut).unwrap();
        assert_eq!(parts.len(), 2);
        let mut ring = parts
            .into_iter()
            .min_by(|a, b| kernel.centroid(a).z.total_cmp(&kernel.centroid(b).z))
            .unwrap();

        // Half-planes starting 1.0 from the axis, clear of the ring's inner edge.
        for degrees in [90.0_f64, 270.0] {
            let slab = kernel.make_slab(4.0, 8.0, 0.03).unwrap();
            let slab = kernel.translate(slab, &Vector3::new(3.0, 0.0, 0.0)).unwrap();
            let slab = kernel.rotate(slab, &Vector3::z(), degrees.to_radians()).unwrap();
            ring = kernel.boolean_difference(ring, slab).unwrap();
        }

        let wedges = kernel.separate_connected_components(ring).unwrap();
        assert_eq!(wedges.len(), 2);
        assert!(wedges.iter().all(Solid::is_closed));
        let ys: Vec<f64> = wedges.iter().map(|w| kernel.centroid(w).y).collect();
        assert!(ys.iter().all(|y| y.abs() < 1e-9));
    }

    #[test]
    fn open_cone_cannot_cut() {
        let kernel = PolarKernel::new();
        let shell = hemisphere_shell(&kernel);
        let cone = kernel.make_cone(1.0, 2.0, 16).unwrap();
        let cone = kernel.translate(cone, &Vector3::new(0.0, 0.0, 1.0)).unwrap();
        assert!(matches!(
            kernel.boolean_difference(shell, cone),
            Err(KernelError::Unsupported(_))
        ));
    }

    #[test]
    fn deleting_a_stale_face_fails() {
        let kernel = PolarKernel::new();
        let slab = kernel.make_slab(1.0, 1.0, 1.0).unwrap();
        let faces = kernel.faces(&slab);
        assert_eq!(faces.len(), 6);
        let first = HashSet::from([faces[0].id]);
        let slab = kernel.delete_faces(slab, &first).unwrap();
        assert_eq!(slab.face_count(), 5);
        assert!(kernel.patch(&slab, faces[1].id) == Some(Patch::Tool));
        assert!(matches!(
            kernel.delete_faces(slab, &first),
            Err(KernelError::InvalidInput(_))
        ));
    }

    #[test]
    fn mesh_solidify_keeps_faces_reachable() {
        let kernel = PolarKernel::new();
        let shell = hemisphere_shell(&kernel);
        let top: HashSet<FaceId> = kernel
            .faces(&shell)
            .into_iter()
            .filter(|f| f.normal.z > 0.9)
            .map(|f| f.id)
            .collect();
        let open = kernel.delete_faces(shell, &top).unwrap();
        assert!(!open.is_closed());
        let hollow = kernel.shell_offset(open, 0.02, OffsetBias::Outward).unwrap();
        assert!(hollow.cells().is_none());
        assert!(hollow.is_closed());
        assert!(kernel.volume(&hollow) > 0.0);
    }

    #[test]
    fn unsupported_truncation() {
        let kernel = PolarKernel::new();
        assert!(matches!(
            kernel.make_sphere_sector(2.0, 16, 16, 0.5),
            Err(KernelError::Unsupported(_))
        ));
        assert!(kernel.make_sphere_sector(0.0, 16, 16, 0.0).is_err());
    }

    #[test]
    fn rotating_a_region_about_z_keeps_it_analytic() {
        let kernel = PolarKernel::new();
        let shell = hemisphere_shell(&kernel);
        let turned = kernel.rotate(shell, &Vector3::z(), 0.3).unwrap();
        assert!(turned.cells().is_some());
        let moved = kernel.translate(turned, &Vector3::new(1.0, 0.0, 0.0)).unwrap();
        assert!(moved.cells().is_none());
    }
}
