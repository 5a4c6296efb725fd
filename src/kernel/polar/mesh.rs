//! Slotmap-backed polygon mesh used for every face-level query and edit.

// Quantised vertex keys are far inside i64 range for any practical model size.
#![allow(clippy::cast_possible_truncation)]

use std::collections::{HashMap, HashSet};

use slotmap::SlotMap;

use crate::kernel::{FaceRecord, OffsetBias};
use crate::math::polygon_3d::{newell_vector, polygon_normal};
use crate::math::{Isometry3, Point3, Vector3, TOLERANCE};

/// Vertices closer than this are welded into one.
const WELD_EPSILON: f64 = 1e-9;

slotmap::new_key_type! {
    /// Unique identifier for a face of a [`PolyMesh`].
    pub struct FaceId;
}

slotmap::new_key_type! {
    /// Unique identifier for a vertex of a [`PolyMesh`].
    pub struct VertexId;
}

/// Which boundary patch of a spherical cell (or derived geometry) a face lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Patch {
    Outer,
    Inner,
    PolarLow,
    PolarHigh,
    AzimuthStart,
    AzimuthEnd,
    /// Offset skin created by a solidify.
    Offset,
    /// Rim closing an opening after a solidify.
    Rim,
    /// Surface of a cutting tool.
    Tool,
}

/// A polygonal face: an ordered vertex loop and the patch it came from.
#[derive(Debug, Clone)]
pub struct MeshFace {
    pub vertices: Vec<VertexId>,
    pub patch: Patch,
}

/// Polygon mesh with welded vertices and stable face identifiers.
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    vertices: SlotMap<VertexId, Point3>,
    faces: SlotMap<FaceId, MeshFace>,
    weld: HashMap<(i64, i64, i64), VertexId>,
}

fn weld_key(p: &Point3) -> (i64, i64, i64) {
    (
        (p.x / WELD_EPSILON).round() as i64,
        (p.y / WELD_EPSILON).round() as i64,
        (p.z / WELD_EPSILON).round() as i64,
    )
}

impl PolyMesh {
    /// Creates a new, empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a vertex, reusing an existing one at the same position.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        let key = weld_key(&point);
        if let Some(&id) = self.weld.get(&key) {
            return id;
        }
        let id = self.vertices.insert(point);
        self.weld.insert(key, id);
        id
    }

    /// Inserts a face over existing vertices.
    ///
    /// Repeated consecutive vertices are collapsed; loops left with fewer than
    /// three vertices are dropped and `None` is returned.
    pub fn add_face(&mut self, vertices: &[VertexId], patch: Patch) -> Option<FaceId> {
        let mut loop_ids: Vec<VertexId> = Vec::with_capacity(vertices.len());
        for &v in vertices {
            if loop_ids.last() != Some(&v) {
                loop_ids.push(v);
            }
        }
        while loop_ids.len() > 1 && loop_ids.first() == loop_ids.last() {
            loop_ids.pop();
        }
        if loop_ids.len() < 3 {
            return None;
        }
        Some(self.faces.insert(MeshFace {
            vertices: loop_ids,
            patch,
        }))
    }

    /// Inserts a polygon, flipping its winding if it disagrees with `outward`.
    pub fn add_oriented_polygon(
        &mut self,
        points: &[Point3],
        outward: &Vector3,
        patch: Patch,
    ) -> Option<FaceId> {
        let mut ids: Vec<VertexId> = points.iter().map(|p| self.add_vertex(*p)).collect();
        if newell_vector(points).dot(outward) < 0.0 {
            ids.reverse();
        }
        self.add_face(&ids, patch)
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn contains_face(&self, id: FaceId) -> bool {
        self.faces.contains_key(id)
    }

    /// Iterates over `(id, face)` pairs in insertion order.
    pub fn iter_faces(&self) -> impl Iterator<Item = (FaceId, &MeshFace)> {
        self.faces.iter()
    }

    /// Positions of a face's vertex loop.
    #[must_use]
    pub fn face_points(&self, face: &MeshFace) -> Vec<Point3> {
        face.vertices
            .iter()
            .filter_map(|v| self.vertices.get(*v).copied())
            .collect()
    }

    /// Snapshot of every face.
    #[must_use]
    pub fn records(&self) -> Vec<FaceRecord<FaceId>> {
        self.faces
            .iter()
            .map(|(id, face)| {
                let vertices = self.face_points(face);
                FaceRecord {
                    id,
                    normal: polygon_normal(&vertices),
                    vertices,
                }
            })
            .collect()
    }

    /// Removes faces and any vertex no longer referenced. Returns how many faces were removed.
    pub fn remove_faces(&mut self, ids: &HashSet<FaceId>) -> usize {
        let mut removed = 0;
        for id in ids {
            if self.faces.remove(*id).is_some() {
                removed += 1;
            }
        }
        let referenced: HashSet<VertexId> = self
            .faces
            .values()
            .flat_map(|f| f.vertices.iter().copied())
            .collect();
        self.vertices.retain(|id, _| referenced.contains(&id));
        self.weld.retain(|_, id| referenced.contains(&*id));
        removed
    }

    /// Mean of the distinct vertices referenced by faces.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        let referenced: HashSet<VertexId> = self
            .faces
            .values()
            .flat_map(|f| f.vertices.iter().copied())
            .collect();
        if referenced.is_empty() {
            return Point3::origin();
        }
        // Summed in slot order so the result does not depend on hash order.
        let mut sum = Vector3::zeros();
        for (id, p) in &self.vertices {
            if referenced.contains(&id) {
                sum += p.coords;
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let count = referenced.len() as f64;
        Point3::from(sum / count)
    }

    /// Enclosed volume by the divergence theorem (fan triangulation).
    ///
    /// Only meaningful for closed meshes with consistent outward winding.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let mut signed = 0.0;
        for face in self.faces.values() {
            let pts = self.face_points(face);
            for i in 1..pts.len().saturating_sub(1) {
                signed += pts[0]
                    .coords
                    .dot(&pts[i].coords.cross(&pts[i + 1].coords));
            }
        }
        signed / 6.0
    }

    /// Applies a rigid transform to every vertex.
    #[must_use]
    pub fn transformed(&self, iso: &Isometry3) -> Self {
        let mut out = Self::new();
        let mut remap: HashMap<VertexId, VertexId> = HashMap::new();
        for (id, p) in &self.vertices {
            remap.insert(id, out.add_vertex(iso.transform_point(p)));
        }
        for face in self.faces.values() {
            let ids: Vec<VertexId> = face.vertices.iter().filter_map(|v| remap.get(v).copied()).collect();
            out.add_face(&ids, face.patch);
        }
        out
    }

    /// Splits the mesh into groups of faces connected through shared vertices.
    #[must_use]
    pub fn components(&self) -> Vec<PolyMesh> {
        let mut by_vertex: HashMap<VertexId, Vec<FaceId>> = HashMap::new();
        for (id, face) in &self.faces {
            for v in &face.vertices {
                by_vertex.entry(*v).or_default().push(id);
            }
        }

        let mut visited: HashSet<FaceId> = HashSet::new();
        let mut components = Vec::new();
        for (start, _) in &self.faces {
            if visited.contains(&start) {
                continue;
            }
            let mut member: HashSet<FaceId> = HashSet::new();
            let mut stack = vec![start];
            while let Some(face_id) = stack.pop() {
                if !member.insert(face_id) {
                    continue;
                }
                let Some(face) = self.faces.get(face_id) else {
                    continue;
                };
                for v in &face.vertices {
                    for &neighbor in by_vertex.get(v).map_or(&[][..], Vec::as_slice) {
                        if !member.contains(&neighbor) {
                            stack.push(neighbor);
                        }
                    }
                }
            }
            visited.extend(member.iter().copied());
            components.push(self.subset(&member));
        }
        components
    }

    /// Copy of the mesh restricted to `faces`, preserving face order.
    #[must_use]
    pub fn subset(&self, faces: &HashSet<FaceId>) -> PolyMesh {
        let mut out = Self::new();
        for (id, face) in &self.faces {
            if faces.contains(&id) {
                let pts = self.face_points(face);
                let ids: Vec<VertexId> = pts.iter().map(|p| out.add_vertex(*p)).collect();
                out.add_face(&ids, face.patch);
            }
        }
        out
    }

    /// Directed boundary edges: edges used by exactly one face, in face winding order.
    #[must_use]
    pub fn boundary_edges(&self) -> Vec<(VertexId, VertexId)> {
        let mut uses: HashMap<(VertexId, VertexId), usize> = HashMap::new();
        for face in self.faces.values() {
            for (a, b) in loop_edges(&face.vertices) {
                *uses.entry(undirected(a, b)).or_insert(0) += 1;
            }
        }
        let mut edges = Vec::new();
        for face in self.faces.values() {
            for (a, b) in loop_edges(&face.vertices) {
                if uses.get(&undirected(a, b)) == Some(&1) {
                    edges.push((a, b));
                }
            }
        }
        edges
    }

    /// Area-weighted vertex normals.
    fn vertex_normals(&self) -> HashMap<VertexId, Vector3> {
        let mut normals: HashMap<VertexId, Vector3> = HashMap::new();
        for face in self.faces.values() {
            let area_vector = newell_vector(&self.face_points(face));
            for v in &face.vertices {
                *normals.entry(*v).or_insert_with(Vector3::zeros) += area_vector;
            }
        }
        for n in normals.values_mut() {
            let len = n.norm();
            if len > TOLERANCE {
                *n /= len;
            }
        }
        normals
    }

    /// Thickens the surface into a closed wall of `thickness`.
    ///
    /// Both skins are offset along vertex normals according to `bias`; the
    /// outer skin keeps the original winding, the inner skin is reversed, and
    /// each open boundary edge gets a rim quad joining the two skins.
    #[must_use]
    pub fn solidify(&self, thickness: f64, bias: OffsetBias) -> PolyMesh {
        let (outer_factor, inner_factor) = bias.skins();
        let normals = self.vertex_normals();
        let mut out = Self::new();
        let mut outer: HashMap<VertexId, VertexId> = HashMap::new();
        let mut inner: HashMap<VertexId, VertexId> = HashMap::new();
        for (id, p) in &self.vertices {
            let n = normals.get(&id).copied().unwrap_or_else(Vector3::zeros);
            outer.insert(id, out.add_vertex(p + n * (thickness * outer_factor)));
        }
        for (id, p) in &self.vertices {
            let n = normals.get(&id).copied().unwrap_or_else(Vector3::zeros);
            inner.insert(id, out.add_vertex(p + n * (thickness * inner_factor)));
        }

        for face in self.faces.values() {
            let skin: Vec<VertexId> = face.vertices.iter().filter_map(|v| outer.get(v).copied()).collect();
            out.add_face(&skin, face.patch);
        }
        for face in self.faces.values() {
            let mut skin: Vec<VertexId> = face.vertices.iter().filter_map(|v| inner.get(v).copied()).collect();
            skin.reverse();
            out.add_face(&skin, Patch::Offset);
        }
        for (a, b) in self.boundary_edges() {
            if let (Some(&ao), Some(&ai), Some(&bi), Some(&bo)) =
                (outer.get(&a), inner.get(&a), inner.get(&b), outer.get(&b))
            {
                out.add_face(&[ao, ai, bi, bo], Patch::Rim);
            }
        }
        out
    }
}

fn loop_edges(ids: &[VertexId]) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
    (0..ids.len()).map(move |i| (ids[i], ids[(i + 1) % ids.len()]))
}

fn undirected(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
