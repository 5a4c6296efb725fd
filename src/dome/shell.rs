use std::collections::HashSet;

use tracing::debug;

use crate::error::{DomeError, Result, Stage};
use crate::kernel::{GeometryKernel, OffsetBias};
use crate::math::Vector3;

use super::DomeConfig;

/// Builds the hollow hemispherical dome shell.
///
/// Construction: a full sphere loses everything below the equator to a
/// flat-bottomed box, the flat faces left on the equator are deleted, and the
/// open hemisphere surface is thickened inwards by `radius * thickness_ratio`.
/// The offset closes the base with a flat rim, so every piece cut from the
/// shell is watertight.
pub struct BuildShell<'a> {
    config: &'a DomeConfig,
}

impl<'a> BuildShell<'a> {
    /// Creates a new `BuildShell` operation.
    #[must_use]
    pub fn new(config: &'a DomeConfig) -> Self {
        Self { config }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::InvalidConfiguration`] for an invalid configuration,
    /// [`DomeError::BooleanOperationFailed`] if the base cannot be cut off and
    /// [`DomeError::Kernel`] if another kernel step fails.
    pub fn execute<K: GeometryKernel>(&self, kernel: &K) -> Result<K::Solid> {
        self.config.validate()?;
        let radius = self.config.radius;
        let precision = self.config.precision;

        let sphere = kernel
            .make_sphere_sector(radius, precision, precision, -radius)
            .map_err(DomeError::kernel(Stage::Shell))?;
        let cutter = kernel
            .make_slab(4.0 * radius, 2.0 * radius, 4.0 * radius)
            .and_then(|slab| kernel.translate(slab, &Vector3::new(0.0, 0.0, -radius)))
            .map_err(DomeError::kernel(Stage::Shell))?;
        let dome = kernel
            .boolean_difference(sphere, cutter)
            .map_err(DomeError::boolean(Stage::Shell))?;

        // Exact comparison: the base is generated on z == 0.
        #[allow(clippy::float_cmp)]
        let base: HashSet<K::FaceId> = kernel
            .faces(&dome)
            .into_iter()
            .filter(|face| face.all_vertices(|v| v.z == 0.0))
            .map(|face| face.id)
            .collect();
        debug!(faces = base.len(), "removing flat base");
        let surface = kernel
            .delete_faces(dome, &base)
            .map_err(DomeError::kernel(Stage::Shell))?;

        kernel
            .shell_offset(surface, self.config.wall_thickness(), OffsetBias::Inward)
            .map_err(DomeError::kernel(Stage::Shell))
    }
}
