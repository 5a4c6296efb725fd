use crate::kernel::FaceRecord;
use crate::math::{is_close, median, sign, Point3, SIGN_EPSILON};

use super::PieceRole;

/// Relative and absolute tolerance for clustering faces by normal z.
const CLUSTER_TOLERANCE: f64 = 0.01;

/// Distances to the median closer than this are ties.
const TIE_TOLERANCE: f64 = 1e-9;

/// Faces chosen to be opened up on one piece, with what the choice was based on.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSelection<F> {
    /// Selected faces, in the order the faces were listed.
    pub faces: Vec<F>,
    /// Normal z of the representative face; `None` for the cap.
    pub reference_normal_z: Option<f64>,
    /// Faces with a downward normal.
    pub candidates: usize,
    /// Candidates facing the axis or accepted as a flat base face.
    pub matching: usize,
    /// Matching faces that were accepted only as flat base faces.
    pub escape_hatch_matches: usize,
}

impl<F> FaceSelection<F> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Picks the faces to delete before a piece is hollowed.
///
/// The cap opens from below: every face whose normal has a non-negative z is
/// selected. Any other piece opens on its inner wall:
///
/// 1. candidates are the faces with a downward normal;
/// 2. a candidate matches when the signs of its normal's x and y agree with the
///    direction from the piece's centroid towards the axis (a zero component of
///    that direction accepts any sign), or when its normal is close to straight
///    down, which is how base-row bricks expose their flat bottom;
/// 3. the matching face whose normal z is closest to the median of the
///    matching normals is the reference (the first listed wins ties, up to
///    rounding);
/// 4. every candidate whose normal z is within 1% of the reference is selected.
///
/// `centroid` is the piece's centroid in world coordinates. The selection is
/// empty when nothing qualifies.
#[must_use]
pub fn select_open_faces<F: Copy>(
    role: PieceRole,
    centroid: &Point3,
    faces: &[FaceRecord<F>],
) -> FaceSelection<F> {
    if role == PieceRole::Cap {
        let selected: Vec<F> = faces
            .iter()
            .filter(|f| sign(f.normal.z) >= 0)
            .map(|f| f.id)
            .collect();
        return FaceSelection {
            candidates: selected.len(),
            matching: selected.len(),
            faces: selected,
            reference_normal_z: None,
            escape_hatch_matches: 0,
        };
    }

    let toward_axis = [-sign(centroid.x), -sign(centroid.y)];
    let candidates: Vec<&FaceRecord<F>> = faces.iter().filter(|f| f.normal.z < -SIGN_EPSILON).collect();

    let mut matching_z = Vec::new();
    let mut escape_hatch_matches = 0;
    for face in &candidates {
        let facing_axis = [face.normal.x, face.normal.y]
            .iter()
            .zip(toward_axis)
            .all(|(&component, wanted)| wanted == 0 || sign(component) == wanted);
        if facing_axis {
            matching_z.push(face.normal.z);
        } else if is_close(face.normal.z, -1.0, CLUSTER_TOLERANCE, CLUSTER_TOLERANCE) {
            matching_z.push(face.normal.z);
            escape_hatch_matches += 1;
        }
    }

    // With an even count the median falls between two rows of faces; their
    // distances differ only by rounding, so the earlier face wins.
    let reference = median(&matching_z).and_then(|mid| {
        let nearest = matching_z
            .iter()
            .map(|z| (z - mid).abs())
            .fold(f64::INFINITY, f64::min);
        matching_z
            .iter()
            .copied()
            .find(|z| is_close((z - mid).abs(), nearest, TIE_TOLERANCE, TIE_TOLERANCE * 1e-3))
    });
    let selected = reference.map_or_else(Vec::new, |reference| {
        candidates
            .iter()
            .filter(|f| is_close(f.normal.z, reference, CLUSTER_TOLERANCE, CLUSTER_TOLERANCE))
            .map(|f| f.id)
            .collect()
    });

    FaceSelection {
        faces: selected,
        reference_normal_z: reference,
        candidates: candidates.len(),
        matching: matching_z.len(),
        escape_hatch_matches,
    }
}
