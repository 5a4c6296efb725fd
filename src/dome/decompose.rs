use std::collections::HashSet;
use std::hash::Hash;

use tracing::{debug, info, warn};

use crate::error::{DomeError, KernelError, Result, Stage};
use crate::kernel::{FaceRecord, GeometryKernel, OffsetBias};
use crate::math::Vector3;

use super::{AngularPlan, DomeConfig};

/// Faces below `z = -REPAIR_EPSILON` are left over from the cap cut.
const REPAIR_EPSILON: f64 = 1e-5;

/// The cut dome: the cap on its own, and the body holding every ring and wedge.
#[derive(Debug, Clone)]
pub struct Decomposition<S> {
    pub cap: S,
    /// All other pieces, still one solid until separated.
    pub body: S,
    /// Base radius of the cap-cut cone, `radius * tan(cap_angle)`.
    pub cap_radius: f64,
    /// `radius * tan(angle)` for every polar cut, cap cut first.
    pub boundary_radii: Vec<f64>,
}

/// Carves the shell into cap, rings and wedges.
///
/// The cap cut runs first and the cap is set aside, so the meridian cuts only
/// ever reach the rings. Ring cuts follow in increasing polar angle, then one
/// meridian cut per azimuth angle. Every tool is consumed by its boolean.
pub struct Decompose<'a> {
    config: &'a DomeConfig,
    plan: &'a AngularPlan,
}

impl<'a> Decompose<'a> {
    /// Creates a new `Decompose` operation.
    #[must_use]
    pub fn new(config: &'a DomeConfig, plan: &'a AngularPlan) -> Self {
        Self { config, plan }
    }

    /// Executes the operation on `shell`.
    ///
    /// # Errors
    ///
    /// - [`DomeError::BooleanOperationFailed`] if a cut fails or leaves a
    ///   different number of pieces than planned, for example when the gap is
    ///   wider than a ring or a wedge.
    /// - [`DomeError::AmbiguousClassification`] if both halves of the cap cut
    ///   share a centroid height.
    /// - [`DomeError::Kernel`] if building a tool or separating components fails.
    pub fn execute<K: GeometryKernel>(&self, kernel: &K, shell: K::Solid) -> Result<Decomposition<K::Solid>> {
        let radius = self.config.radius;
        let cap_angle = self.plan.cap_angle();
        let cap_stage = Stage::CapCut {
            angle_deg: cap_angle,
        };

        let cut = self.polar_cut(kernel, shell, cap_angle, cap_stage)?;
        let parts = kernel
            .separate_connected_components(cut)
            .map_err(DomeError::kernel(cap_stage))?;
        let (cap, mut body) = split_cap(kernel, parts, cap_stage)?;
        info!(angle = cap_angle, "cap separated");

        let spurious = spurious_faces(&kernel.faces(&body));
        if !spurious.is_empty() {
            warn!(faces = spurious.len(), "deleting faces left below the base by the cap cut");
            body = kernel
                .delete_faces(body, &spurious)
                .map_err(DomeError::kernel(cap_stage))?;
        }

        let mut boundary_radii = vec![radius * cap_angle.to_radians().tan()];
        for (cut, &angle) in self.plan.polar_angles().iter().enumerate() {
            let stage = Stage::PolarCut { angle_deg: angle };
            body = self.polar_cut(kernel, body, angle, stage)?;
            expect_components(kernel, &body, cut + 2, stage)?;
            boundary_radii.push(radius * angle.to_radians().tan());
            debug!(angle, "ring cut");
        }
        info!(cuts = self.plan.polar_angles().len(), "rings cut");

        let cap_radius = boundary_radii[0];
        let rings = self.plan.ring_count();
        for (cut, &angle) in self.plan.azimuth_angles().iter().enumerate() {
            body = self.azimuth_cut(kernel, body, angle, cap_radius)?;
            // The first meridian cut opens each ring without splitting it.
            expect_components(kernel, &body, rings * cut.max(1), Stage::AzimuthCut { angle_deg: angle })?;
            debug!(angle, "meridian cut");
        }
        info!(cuts = self.plan.azimuth_angles().len(), "wedges cut");

        Ok(Decomposition {
            cap,
            body,
            cap_radius,
            boundary_radii,
        })
    }

    /// Subtracts a cone of half-angle `angle_deg` with its apex at the dome centre,
    /// thickened symmetrically to half the brick gap.
    fn polar_cut<K: GeometryKernel>(
        &self,
        kernel: &K,
        solid: K::Solid,
        angle_deg: f64,
        stage: Stage,
    ) -> Result<K::Solid> {
        let depth = self.config.radius;
        let base_radius = depth * angle_deg.to_radians().tan();
        let tool = kernel
            .make_cone(base_radius, depth, self.config.precision)
            .and_then(|cone| kernel.translate(cone, &Vector3::new(0.0, 0.0, 0.5 * depth)))
            .and_then(|cone| kernel.shell_offset(cone, 0.5 * self.config.bricks_gap, OffsetBias::Symmetric))
            .map_err(DomeError::kernel(stage))?;
        kernel
            .boolean_difference(solid, tool)
            .map_err(DomeError::boolean(stage))
    }

    /// Subtracts a slab of the brick gap's thickness standing on the meridian
    /// half-plane at `angle_deg`, starting half the cap radius from the axis.
    fn azimuth_cut<K: GeometryKernel>(
        &self,
        kernel: &K,
        solid: K::Solid,
        angle_deg: f64,
        cap_radius: f64,
    ) -> Result<K::Solid> {
        let radius = self.config.radius;
        let stage = Stage::AzimuthCut { angle_deg };
        let tool = kernel
            .make_slab(2.0 * radius, 4.0 * radius, self.config.bricks_gap)
            .and_then(|slab| kernel.translate(slab, &Vector3::new(0.5 * cap_radius + radius, 0.0, 0.0)))
            .and_then(|slab| kernel.rotate(slab, &Vector3::z(), angle_deg.to_radians()))
            .map_err(DomeError::kernel(stage))?;
        kernel
            .boolean_difference(solid, tool)
            .map_err(DomeError::boolean(stage))
    }
}

/// Splits the two halves of the cap cut into `(cap, body)`; the cap is the
/// half with the higher centroid.
fn split_cap<K: GeometryKernel>(
    kernel: &K,
    parts: Vec<K::Solid>,
    stage: Stage,
) -> Result<(K::Solid, K::Solid)> {
    let count = parts.len();
    let Ok([first, second]) = <[K::Solid; 2]>::try_from(parts) else {
        return Err(DomeError::BooleanOperationFailed {
            stage,
            source: KernelError::Failed(format!(
                "expected the cap cut to leave 2 components, found {count}"
            )),
        });
    };
    let (z_first, z_second) = (kernel.centroid(&first).z, kernel.centroid(&second).z);
    if (z_first - z_second).abs() <= f64::EPSILON * (1.0 + z_first.abs()) {
        return Err(DomeError::AmbiguousClassification {
            first: 0,
            second: 1,
            key: format!("centroid z = {z_first}"),
        });
    }
    if z_first > z_second {
        Ok((first, second))
    } else {
        Ok((second, first))
    }
}

/// Fails the cut at `stage` unless it left exactly `expected` pieces.
///
/// A kerf wider than the band between two cuts swallows the band whole, which
/// a boolean difference reports as success.
fn expect_components<K: GeometryKernel>(
    kernel: &K,
    solid: &K::Solid,
    expected: usize,
    stage: Stage,
) -> Result<()> {
    let found = kernel.component_count(solid);
    if found == expected {
        return Ok(());
    }
    Err(DomeError::BooleanOperationFailed {
        stage,
        source: KernelError::Failed(format!(
            "expected {expected} pieces after the cut, found {found}; the gap is wider than the brick"
        )),
    })
}

/// Faces with a vertex clearly below the base plane.
///
/// At high tessellation precision the cap cut can leave a sliver just under
/// `z = 0`; those faces are removed before any further cut.
pub fn spurious_faces<F: Copy + Eq + Hash>(faces: &[FaceRecord<F>]) -> HashSet<F> {
    faces
        .iter()
        .filter(|face| face.vertices.iter().any(|v| v.z < -REPAIR_EPSILON))
        .map(|face| face.id)
        .collect()
}
