use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{DomeError, Result, Stage};
use crate::kernel::{GeometryKernel, OffsetBias};

use super::select::select_open_faces;
use super::{BatchPolicy, HollowParams, Piece, PieceRole};

/// Opens one face group of a piece and thins its walls.
pub struct Hollow {
    wall_thickness: f64,
}

impl Hollow {
    /// Creates a new `Hollow` operation.
    #[must_use]
    pub fn new(wall_thickness: f64) -> Self {
        Self { wall_thickness }
    }

    /// Executes the operation.
    ///
    /// The piece's origin is moved to its centroid, the faces picked by
    /// [`select_open_faces`] are deleted and the remaining surface is thickened
    /// outwards by the wall thickness. The origin and centroid are then
    /// recomputed on the hollow brick.
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::NoInnerWallFound`] if no face qualifies for removal
    /// and [`DomeError::Kernel`] if deletion or offset fails.
    pub fn execute<K: GeometryKernel>(&self, kernel: &K, piece: Piece<K::Solid>) -> Result<Piece<K::Solid>> {
        let Piece { id, role, mut solid, .. } = piece;
        let stage = Stage::Hollowing { piece_id: id };

        let centroid = kernel.centroid(&solid);
        kernel.set_origin(&mut solid, centroid);

        let selection = select_open_faces(role, &centroid, &kernel.faces(&solid));
        if selection.is_empty() {
            return Err(DomeError::NoInnerWallFound { piece_id: id, role });
        }
        if selection.escape_hatch_matches > 0 {
            debug!(id, matches = selection.escape_hatch_matches, "flat base faces accepted as inner wall");
        }
        debug!(
            id,
            %role,
            faces = selection.faces.len(),
            candidates = selection.candidates,
            "opening piece"
        );

        let open: HashSet<K::FaceId> = selection.faces.into_iter().collect();
        let opened = kernel
            .delete_faces(solid, &open)
            .map_err(DomeError::kernel(stage))?;
        let mut hollow = kernel
            .shell_offset(opened, self.wall_thickness, OffsetBias::Outward)
            .map_err(DomeError::kernel(stage))?;

        let centroid = kernel.centroid(&hollow);
        kernel.set_origin(&mut hollow, centroid);
        Ok(Piece {
            id,
            role,
            centroid,
            solid: hollow,
        })
    }
}

/// A piece that could not be hollowed.
#[derive(Debug)]
pub struct PieceFailure {
    pub id: usize,
    pub role: PieceRole,
    pub error: DomeError,
}

/// Result of a batch: the pieces that were hollowed and the ones that failed.
#[derive(Debug)]
pub struct BatchOutcome<S> {
    pub pieces: Vec<Piece<S>>,
    pub failures: Vec<PieceFailure>,
}

/// Hollows every piece of a dome in parallel.
///
/// Pieces are independent once classified, so each one is handed to a rayon
/// worker that owns it until it is hollowed. Output keeps the input order.
pub struct HollowAll {
    params: HollowParams,
}

impl HollowAll {
    /// Creates a new `HollowAll` operation.
    #[must_use]
    pub fn new(params: HollowParams) -> Self {
        Self { params }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::InvalidConfiguration`] for a bad wall thickness. With
    /// [`BatchPolicy::FailFast`] the first piece error is returned and the rest of
    /// the batch is abandoned; with [`BatchPolicy::FailSoft`] piece errors are
    /// collected in [`BatchOutcome::failures`] instead.
    pub fn execute<K>(&self, kernel: &K, pieces: Vec<Piece<K::Solid>>) -> Result<BatchOutcome<K::Solid>>
    where
        K: GeometryKernel + Sync,
        K::Solid: Send,
    {
        self.params.validate()?;
        let hollow = Hollow::new(self.params.wall_thickness);
        let total = pieces.len();

        let outcome = match self.params.policy {
            BatchPolicy::FailFast => {
                let pieces = pieces
                    .into_par_iter()
                    .map(|piece| hollow.execute(kernel, piece))
                    .collect::<Result<Vec<_>>>()?;
                BatchOutcome {
                    pieces,
                    failures: Vec::new(),
                }
            }
            BatchPolicy::FailSoft => {
                let results: Vec<_> = pieces
                    .into_par_iter()
                    .map(|piece| {
                        let (id, role) = (piece.id, piece.role);
                        hollow
                            .execute(kernel, piece)
                            .map_err(|error| PieceFailure { id, role, error })
                    })
                    .collect();
                let mut outcome = BatchOutcome {
                    pieces: Vec::with_capacity(total),
                    failures: Vec::new(),
                };
                for result in results {
                    match result {
                        Ok(piece) => outcome.pieces.push(piece),
                        Err(failure) => {
                            warn!(id = failure.id, error = %failure.error, "piece not hollowed");
                            outcome.failures.push(failure);
                        }
                    }
                }
                outcome
            }
        };
        info!(
            hollowed = outcome.pieces.len(),
            failed = outcome.failures.len(),
            total,
            "pieces hollowed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dome::{plan, BuildShell, Classify, Decompose, DomeConfig};
    use crate::kernel::polar::{FaceId, Solid};
    use crate::kernel::PolarKernel;

    fn pieces(config: &DomeConfig) -> (PolarKernel, Vec<Piece<Solid>>) {
        let kernel = PolarKernel::new();
        let plan = plan(config).unwrap();
        let shell = BuildShell::new(config).execute(&kernel).unwrap();
        let cut = Decompose::new(config, &plan).execute(&kernel, shell).unwrap();
        let pieces = Classify::new().execute(&kernel, cut).unwrap();
        (kernel, pieces)
    }

    /// Upper half of a ball with its flat bottom removed: nothing faces down.
    fn dome_lid(kernel: &PolarKernel, id: usize) -> Piece<Solid> {
        let ball = kernel.make_sphere_sector(1.0, 8, 4, 0.0).unwrap();
        let downward: HashSet<FaceId> = kernel
            .faces(&ball)
            .iter()
            .filter(|f| f.normal.z < 0.0)
            .map(|f| f.id)
            .collect();
        assert!(!downward.is_empty());
        let solid = kernel.delete_faces(ball, &downward).unwrap();
        Piece {
            id,
            role: PieceRole::Wedge { ring: 0, wedge: 0 },
            centroid: kernel.centroid(&solid),
            solid,
        }
    }

    fn mixed_batch() -> (PolarKernel, Vec<Piece<Solid>>, usize) {
        let config = DomeConfig::default()
            .with_precision(12)
            .with_radial_brick_count(4)
            .with_vertical_brick_count(3);
        let (kernel, mut pieces) = pieces(&config);
        let bad = 3;
        let lid = dome_lid(&kernel, bad);
        pieces[bad] = lid;
        (kernel, pieces, bad)
    }

    #[test]
    fn piece_without_downward_faces_has_no_inner_wall() {
        let kernel = PolarKernel::new();
        let lid = dome_lid(&kernel, 7);
        let err = Hollow::new(0.02).execute(&kernel, lid).unwrap_err();
        assert!(matches!(
            err,
            DomeError::NoInnerWallFound {
                piece_id: 7,
                role: PieceRole::Wedge { ring: 0, wedge: 0 },
            }
        ));
    }

    #[test]
    fn fail_fast_aborts_on_the_failing_piece() {
        let (kernel, pieces, bad) = mixed_batch();
        let err = HollowAll::new(HollowParams::default())
            .execute(&kernel, pieces)
            .unwrap_err();
        assert!(matches!(err, DomeError::NoInnerWallFound { piece_id, .. } if piece_id == bad));
    }

    #[test]
    fn fail_soft_keeps_the_rest_of_the_batch() {
        let (kernel, pieces, bad) = mixed_batch();
        let total = pieces.len();
        let params = HollowParams::default().with_policy(BatchPolicy::FailSoft);
        let outcome = HollowAll::new(params).execute(&kernel, pieces).unwrap();

        assert_eq!(outcome.pieces.len(), total - 1);
        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert_eq!(failure.id, bad);
        assert!(matches!(failure.error, DomeError::NoInnerWallFound { piece_id, .. } if piece_id == bad));
        let ids: Vec<usize> = outcome.pieces.iter().map(|p| p.id).collect();
        let expected: Vec<usize> = (0..total).filter(|&id| id != bad).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn cap_opens_from_below() {
        let config = DomeConfig::default().with_precision(16);
        let (kernel, mut pieces) = pieces(&config);
        let cap = pieces.remove(0);
        let before = cap.solid.face_count();
        let selection = select_open_faces(cap.role, &cap.centroid, &kernel.faces(&cap.solid));
        assert!(kernel
            .faces(&cap.solid)
            .iter()
            .all(|f| selection.faces.contains(&f.id) == (f.normal.z >= 0.0)));
        assert!(selection.faces.len() < before);

        let hollow = Hollow::new(0.02).execute(&kernel, cap).unwrap();
        assert!(hollow.solid.is_closed());
        assert!(hollow.solid.cells().is_none());
        assert!((hollow.solid.origin() - hollow.centroid).norm() < 1e-12);
    }

    #[test]
    fn base_row_uses_flat_bottom() {
        let config = DomeConfig::default().with_precision(16);
        let (kernel, pieces) = pieces(&config);
        let base = pieces
            .into_iter()
            .find(|p| p.role == PieceRole::Wedge { ring: 0, wedge: 0 })
            .unwrap();
        let selection = select_open_faces(base.role, &base.centroid, &kernel.faces(&base.solid));
        assert!(selection.escape_hatch_matches > 0);
        assert!(Hollow::new(0.02).execute(&kernel, base).is_ok());
    }

    #[test]
    fn batch_keeps_order() {
        let config = DomeConfig::default()
            .with_precision(12)
            .with_radial_brick_count(4)
            .with_vertical_brick_count(3);
        let (kernel, pieces) = pieces(&config);
        let ids: Vec<usize> = pieces.iter().map(|p| p.id).collect();
        let outcome = HollowAll::new(HollowParams::default())
            .execute(&kernel, pieces)
            .unwrap();
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.pieces.iter().map(|p| p.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn bad_wall_thickness_is_rejected_up_front() {
        let config = DomeConfig::default().with_precision(12);
        let (kernel, pieces) = pieces(&config);
        let params = HollowParams::default().with_wall_thickness(0.0);
        assert!(matches!(
            HollowAll::new(params).execute(&kernel, pieces),
            Err(DomeError::InvalidConfiguration(_))
        ));
    }
}
