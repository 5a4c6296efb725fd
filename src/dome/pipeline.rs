use std::f64::consts::PI;

use tracing::info;

use crate::error::Result;
use crate::kernel::GeometryKernel;

use super::{
    AngularPlan, BuildShell, Classify, Decompose, DomeConfig, HollowAll, HollowParams, Piece,
    PieceFailure, PieceRole, PlanAngles,
};

/// A decomposed dome.
#[derive(Debug)]
pub struct Dome<S> {
    pub plan: AngularPlan,
    /// Base radius of the cap-cut cone.
    pub cap_radius: f64,
    /// `radius * tan(angle)` for every polar cut, cap cut first.
    pub boundary_radii: Vec<f64>,
    /// Pieces in id order. Pieces that failed a fail-soft hollowing pass are missing.
    pub pieces: Vec<Piece<S>>,
    /// Pieces that could not be hollowed under [`BatchPolicy::FailSoft`](super::BatchPolicy::FailSoft).
    pub failures: Vec<PieceFailure>,
}

impl<S> Dome<S> {
    /// The cap piece, if present.
    #[must_use]
    pub fn cap(&self) -> Option<&Piece<S>> {
        self.pieces.iter().find(|p| p.role == PieceRole::Cap)
    }

    /// Pieces of one ring, in wedge order.
    pub fn ring(&self, ring: usize) -> impl Iterator<Item = &Piece<S>> {
        self.pieces
            .iter()
            .filter(move |p| p.role.ring() == Some(ring))
    }

    /// One piece per distinct brick shape, bottom to top.
    ///
    /// Wedges of a ring are congruent, so each ring is represented by its wedge
    /// with the smallest positive centroid azimuth (measured in `(-180°, 180°]`);
    /// a ring with no such wedge is represented by its first piece. The cap is
    /// always included.
    #[must_use]
    pub fn unique_bricks(&self) -> Vec<&Piece<S>> {
        let mut unique: Vec<&Piece<S>> = Vec::new();
        let ring_count = self
            .pieces
            .iter()
            .filter_map(|p| p.role.ring())
            .max()
            .map_or(0, |last| last + 1);
        for ring in 0..ring_count {
            let azimuth = |p: &&Piece<S>| p.centroid.y.atan2(p.centroid.x);
            let representative = self
                .ring(ring)
                .filter(|p| {
                    let a = azimuth(p);
                    a > 0.0 && a <= PI
                })
                .min_by(|a, b| azimuth(a).total_cmp(&azimuth(b)))
                .or_else(|| self.ring(ring).next());
            unique.extend(representative);
        }
        unique.extend(self.cap());
        unique.sort_by(|a, b| a.centroid.z.total_cmp(&b.centroid.z));
        unique
    }
}

/// Runs the full pipeline: plan, shell, cuts, classification and optional hollowing.
pub struct BuildDome {
    config: DomeConfig,
    hollow: Option<HollowParams>,
}

impl BuildDome {
    /// Creates a new `BuildDome` operation that stops after classification.
    #[must_use]
    pub fn new(config: DomeConfig) -> Self {
        Self {
            config,
            hollow: None,
        }
    }

    /// Also hollows every piece with `params`.
    #[must_use]
    pub fn with_hollowing(mut self, params: HollowParams) -> Self {
        self.hollow = Some(params);
        self
    }

    /// Executes the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage. Configuration errors are reported
    /// before any geometry is built.
    pub fn execute<K>(&self, kernel: &K) -> Result<Dome<K::Solid>>
    where
        K: GeometryKernel + Sync,
        K::Solid: Send,
    {
        let plan = PlanAngles::new(&self.config).execute()?;
        if let Some(params) = &self.hollow {
            params.validate()?;
        }
        info!(
            cap_angle = plan.cap_angle(),
            rings = plan.ring_count(),
            wedges_per_ring = plan.azimuth_angles().len(),
            "planned cuts"
        );

        let shell = BuildShell::new(&self.config).execute(kernel)?;
        info!(radius = self.config.radius, "shell built");

        let decomposition = Decompose::new(&self.config, &plan).execute(kernel, shell)?;
        let cap_radius = decomposition.cap_radius;
        let boundary_radii = decomposition.boundary_radii.clone();

        let mut pieces = Classify::new().execute(kernel, decomposition)?;
        let mut failures = Vec::new();
        if let Some(params) = self.hollow {
            let outcome = HollowAll::new(params).execute(kernel, pieces)?;
            pieces = outcome.pieces;
            failures = outcome.failures;
        }

        Ok(Dome {
            plan,
            cap_radius,
            boundary_radii,
            pieces,
            failures,
        })
    }
}
