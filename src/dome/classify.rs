use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DomeError, Result, Stage};
use crate::kernel::GeometryKernel;
use crate::math::spherical::azimuth_degrees;
use crate::math::{Point3, TOLERANCE};

use super::Decomposition;

/// Position of a piece in the brick layout. Rings count up from the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceRole {
    Cap,
    /// A ring that was not split around the axis.
    Ring { ring: usize },
    Wedge { ring: usize, wedge: usize },
}

impl PieceRole {
    /// Ring index, or `None` for the cap.
    #[must_use]
    pub fn ring(self) -> Option<usize> {
        match self {
            Self::Cap => None,
            Self::Ring { ring } | Self::Wedge { ring, .. } => Some(ring),
        }
    }
}

impl fmt::Display for PieceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cap => write!(f, "cap"),
            Self::Ring { ring } => write!(f, "ring {ring}"),
            Self::Wedge { ring, wedge } => write!(f, "ring {ring}, wedge {wedge}"),
        }
    }
}

/// A classified solid.
#[derive(Debug, Clone)]
pub struct Piece<S> {
    /// Position in the canonical order: the cap is 0, then rings bottom-up,
    /// wedges by increasing azimuth.
    pub id: usize,
    pub role: PieceRole,
    /// Mean of the solid's face vertices when classified (or last hollowed).
    pub centroid: Point3,
    pub solid: S,
}

/// Separates the body into pieces and labels every piece.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classify;

impl Classify {
    /// Creates a new `Classify` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the operation. The returned pieces are sorted by id.
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Kernel`] if the body cannot be separated and
    /// [`DomeError::AmbiguousClassification`] if two body pieces share an
    /// ordering key.
    pub fn execute<K: GeometryKernel>(
        &self,
        kernel: &K,
        decomposition: Decomposition<K::Solid>,
    ) -> Result<Vec<Piece<K::Solid>>> {
        let Decomposition { cap, body, .. } = decomposition;
        let parts = kernel
            .separate_connected_components(body)
            .map_err(DomeError::kernel(Stage::Classification))?;
        let centroids: Vec<Point3> = parts.iter().map(|part| kernel.centroid(part)).collect();
        let order = order_pieces(&centroids)?;

        // `order` is a permutation of the parts: rank every part, then sort.
        let mut rank = vec![(0, PieceRole::Cap); parts.len()];
        for (position, (index, role)) in order.into_iter().enumerate() {
            rank[index] = (position + 1, role);
        }
        let mut body: Vec<Piece<K::Solid>> = parts
            .into_iter()
            .zip(centroids)
            .zip(rank)
            .map(|((solid, centroid), (id, role))| Piece {
                id,
                role,
                centroid,
                solid,
            })
            .collect();
        body.sort_by_key(|piece| piece.id);

        let mut pieces = Vec::with_capacity(body.len() + 1);
        pieces.push(Piece {
            id: 0,
            role: PieceRole::Cap,
            centroid: kernel.centroid(&cap),
            solid: cap,
        });
        for piece in body {
            debug!(id = piece.id, role = %piece.role, "piece classified");
            pieces.push(piece);
        }
        info!(pieces = pieces.len(), "pieces classified");
        Ok(pieces)
    }
}

/// Orders body pieces by their centroids.
///
/// Pieces are grouped into rings by centroid height (ascending, with a small
/// relative tolerance) and ordered within a ring by centroid azimuth in
/// `[0, 360)`. Returns `(index into centroids, role)` in canonical order.
///
/// # Errors
///
/// Returns [`DomeError::AmbiguousClassification`] when two pieces of a ring
/// share an azimuth, or a ring piece sits on the axis so its azimuth is
/// undefined. Ids in the error are the ids the pieces would have received.
pub fn order_pieces(centroids: &[Point3]) -> Result<Vec<(usize, PieceRole)>> {
    let scale = centroids
        .iter()
        .flat_map(|c| [c.x.abs(), c.y.abs(), c.z.abs()])
        .fold(0.0, f64::max);
    let tolerance = 1e-6 * (1.0 + scale);

    let mut by_height: Vec<usize> = (0..centroids.len()).collect();
    by_height.sort_by(|&a, &b| centroids[a].z.total_cmp(&centroids[b].z));

    let mut rings: Vec<Vec<usize>> = Vec::new();
    for index in by_height {
        match rings.last_mut() {
            Some(ring) if centroids[index].z - centroids[ring[0]].z <= tolerance => ring.push(index),
            _ => rings.push(vec![index]),
        }
    }

    let mut ordered = Vec::with_capacity(centroids.len());
    for (ring_index, mut ring) in rings.into_iter().enumerate() {
        // Body ids start at 1, after the cap.
        let first_id = ordered.len() + 1;
        if let [index] = ring[..] {
            ordered.push((index, PieceRole::Ring { ring: ring_index }));
            continue;
        }
        for (offset, &index) in ring.iter().enumerate() {
            let c = centroids[index];
            if c.x.abs() <= tolerance && c.y.abs() <= tolerance {
                return Err(DomeError::AmbiguousClassification {
                    first: first_id + offset,
                    second: first_id + offset,
                    key: format!("ring {ring_index} piece on the axis has no azimuth"),
                });
            }
        }
        ring.sort_by(|&a, &b| azimuth_degrees(&centroids[a]).total_cmp(&azimuth_degrees(&centroids[b])));
        for (offset, pair) in ring.windows(2).enumerate() {
            let (a, b) = (azimuth_degrees(&centroids[pair[0]]), azimuth_degrees(&centroids[pair[1]]));
            if b - a <= TOLERANCE.max(1e-9 * a.abs()) {
                return Err(DomeError::AmbiguousClassification {
                    first: first_id + offset,
                    second: first_id + offset + 1,
                    key: format!("ring {ring_index}, azimuth {a:.6}°"),
                });
            }
        }
        for (wedge, &index) in ring.iter().enumerate() {
            ordered.push((
                index,
                PieceRole::Wedge {
                    ring: ring_index,
                    wedge,
                },
            ));
        }
    }
    Ok(ordered)
}
