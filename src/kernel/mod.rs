//! Geometry kernel interface consumed by the decomposition pipeline.
//!
//! The pipeline never inspects solid topology directly: every primitive,
//! boolean, offset and query goes through [`GeometryKernel`]. Operations that
//! replace a solid take it by value, so a cutting tool handed to
//! [`GeometryKernel::boolean_difference`] can never be reused.

pub mod polar;

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::math::{Point3, Vector3};

pub use polar::PolarKernel;

/// Placement of the new wall relative to the faces being offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffsetBias {
    /// New wall grows against the face normals (offset factor −1).
    Inward,
    /// New wall grows along the face normals (offset factor +1).
    Outward,
    /// New wall straddles the faces (offset factor 0).
    Symmetric,
}

impl OffsetBias {
    /// Signed offsets `(outer, inner)` of the two skins, in units of thickness.
    #[must_use]
    pub fn skins(self) -> (f64, f64) {
        match self {
            Self::Inward => (0.0, -1.0),
            Self::Outward => (1.0, 0.0),
            Self::Symmetric => (0.5, -0.5),
        }
    }
}

/// Snapshot of one face: its identity, outward unit normal and vertex loop.
///
/// Degenerate faces report a zero normal.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRecord<F> {
    pub id: F,
    pub normal: Vector3,
    pub vertices: Vec<Point3>,
}

impl<F> FaceRecord<F> {
    /// `true` if every vertex satisfies `predicate`.
    pub fn all_vertices(&self, predicate: impl Fn(&Point3) -> bool) -> bool {
        self.vertices.iter().all(predicate)
    }
}

/// Operations the decomposition pipeline needs from a geometry kernel.
pub trait GeometryKernel {
    /// Owned handle to a boundary-represented solid.
    type Solid;
    /// Identifier of a face within a solid.
    type FaceId: Copy + Eq + Hash + Debug;

    /// Sphere of `radius` centred at the origin, truncated below `z_min`.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive sizes or unsupported truncations.
    fn make_sphere_sector(
        &self,
        radius: f64,
        segments: usize,
        rings: usize,
        z_min: f64,
    ) -> Result<Self::Solid, KernelError>;

    /// Open cone surface (no end caps) along +Z, apex down at `z = -depth/2`
    /// and base circle of `base_radius` at `z = depth/2`.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive sizes.
    fn make_cone(
        &self,
        base_radius: f64,
        depth: f64,
        segments: usize,
    ) -> Result<Self::Solid, KernelError>;

    /// Box centred at the origin: `width` along X, `thickness` along Y, `height` along Z.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive sizes.
    fn make_slab(
        &self,
        width: f64,
        height: f64,
        thickness: f64,
    ) -> Result<Self::Solid, KernelError>;

    /// `solid − tool`. Consumes both operands.
    ///
    /// # Errors
    ///
    /// Returns an error if no manifold result can be produced.
    fn boolean_difference(
        &self,
        solid: Self::Solid,
        tool: Self::Solid,
    ) -> Result<Self::Solid, KernelError>;

    /// Uniform thickening of the solid's faces ("solidify").
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive thickness or unsupported inputs.
    fn shell_offset(
        &self,
        solid: Self::Solid,
        thickness: f64,
        bias: OffsetBias,
    ) -> Result<Self::Solid, KernelError>;

    /// Splits a solid into its connected components.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid cannot be separated.
    fn separate_connected_components(
        &self,
        solid: Self::Solid,
    ) -> Result<Vec<Self::Solid>, KernelError>;

    /// Number of connected components, without splitting the solid.
    fn component_count(&self, solid: &Self::Solid) -> usize;

    /// Snapshot of every face of the solid, in a deterministic order.
    fn faces(&self, solid: &Self::Solid) -> Vec<FaceRecord<Self::FaceId>>;

    /// Removes the given faces, leaving the solid open where they were.
    ///
    /// # Errors
    ///
    /// Returns an error if a face does not belong to the solid.
    fn delete_faces(
        &self,
        solid: Self::Solid,
        faces: &HashSet<Self::FaceId>,
    ) -> Result<Self::Solid, KernelError>;

    /// Mean of the solid's distinct face vertices.
    fn centroid(&self, solid: &Self::Solid) -> Point3;

    /// Moves the solid's reference origin without moving its geometry.
    fn set_origin(&self, solid: &mut Self::Solid, point: Point3);

    /// Translates the solid.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel cannot represent the moved solid.
    fn translate(&self, solid: Self::Solid, offset: &Vector3) -> Result<Self::Solid, KernelError>;

    /// Rotates the solid by `angle` radians about an axis through the origin.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero axis.
    fn rotate(
        &self,
        solid: Self::Solid,
        axis: &Vector3,
        angle: f64,
    ) -> Result<Self::Solid, KernelError>;
}
