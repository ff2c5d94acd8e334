use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::SplitError;
use crate::math::triangle::{intersect_triangles, IndexedTriangle};
use crate::math::{Aabb, Point3, WELD_EPSILON};
use crate::mesh::{edge_key, Bvh, Face, Mesh, VertexWelder};

use super::kernel::{IntersectionKernel, MergedMesh, Origin};
use super::retriangulate::{retriangulate, CutTriangle};

/// Splits a solid and a surface along their intersection curves.
///
/// Every solid triangle is tested against the surface triangles whose boxes
/// it overlaps. Crossing segments are pooled with a spatial hash, cut
/// triangles are re-triangulated with the segments as constraints, and the
/// result is separated into islands along the segments.
#[derive(Debug, Clone, Copy)]
pub struct MeshArrangement {
    weld_epsilon: f64,
}

impl Default for MeshArrangement {
    fn default() -> Self {
        Self {
            weld_epsilon: WELD_EPSILON,
        }
    }
}

impl MeshArrangement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the distance below which curve points are merged and snapped to corners.
    #[must_use]
    pub fn with_weld_epsilon(mut self, weld_epsilon: f64) -> Self {
        self.weld_epsilon = weld_epsilon;
        self
    }
}

impl IntersectionKernel for MeshArrangement {
    #[allow(clippy::cast_possible_truncation, clippy::too_many_lines)]
    fn intersect(&self, merged: &MergedMesh) -> Result<MergedMesh, SplitError> {
        merged
            .mesh
            .validate()
            .map_err(|e| SplitError::Kernel(e.to_string()))?;
        if merged.origins.len() != merged.mesh.faces.len() {
            return Err(SplitError::Kernel(format!(
                "{} origins for {} faces",
                merged.origins.len(),
                merged.mesh.faces.len()
            )));
        }

        let mut tris: Vec<[u32; 3]> = Vec::new();
        let mut origins: Vec<Origin> = Vec::new();
        for (face, &origin) in merged.mesh.faces.iter().zip(&merged.origins) {
            for t in face.triangles() {
                tris.push(t);
                origins.push(origin);
            }
        }
        let indexed = |t: usize| IndexedTriangle::new(tris[t], merged.mesh.triangle_points(tris[t]));
        let (solid_tris, surface_tris): (Vec<usize>, Vec<usize>) =
            (0..tris.len()).partition(|&t| origins[t] == Origin::Solid);
        let bvh = Bvh::build(
            surface_tris
                .iter()
                .map(|&t| Aabb::from_points(&indexed(t).points).unwrap_or_else(Aabb::empty))
                .collect(),
        );

        let base = merged.mesh.vertices.len() as u32;
        let mut pool = VertexWelder::new(self.weld_epsilon);
        let mut segments: Vec<Vec<[u32; 2]>> = vec![Vec::new(); tris.len()];
        let mut candidates = Vec::new();
        let mut pairs = 0usize;
        for &s in &solid_tris {
            let st = indexed(s);
            let Some(bb) = Aabb::from_points(&st.points) else {
                continue;
            };
            candidates.clear();
            bvh.query(&bb, &mut candidates);
            candidates.sort_unstable();
            for &k in &candidates {
                let f = surface_tris[k];
                let Some((p, q)) = intersect_triangles(&st, &indexed(f)) else {
                    continue;
                };
                let (ip, iq) = (base + pool.insert(&p), base + pool.insert(&q));
                if ip == iq {
                    continue;
                }
                segments[s].push([ip, iq]);
                segments[f].push([ip, iq]);
                pairs += 1;
            }
        }
        debug!(pairs, curve_points = pool.len(), "intersection curves computed");

        let mut vertices = merged.mesh.vertices.clone();
        vertices.extend_from_slice(pool.points());

        let mut cuts: Vec<Option<CutTriangle>> = vec![None; tris.len()];
        let mut edge_points: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
        for (t, segs) in segments.iter().enumerate() {
            if segs.is_empty() {
                continue;
            }
            let corners = tris[t];
            let pts = corners.map(|i| vertices[i as usize]);
            let mut cut = CutTriangle {
                corners,
                ..CutTriangle::default()
            };
            let mut resolved: HashMap<u32, u32> = HashMap::new();
            for &id in segs.iter().flatten() {
                if resolved.contains_key(&id) {
                    continue;
                }
                let target = match locate(&vertices[id as usize], &pts, self.weld_epsilon) {
                    Location::Corner(i) => corners[i],
                    Location::Edge(i) => {
                        edge_points
                            .entry(edge_key(corners[i], corners[(i + 1) % 3]))
                            .or_default()
                            .push(id);
                        id
                    }
                    Location::Interior => {
                        cut.interior.push(id);
                        id
                    }
                };
                resolved.insert(id, target);
            }
            let mut segs: Vec<[u32; 2]> = segs
                .iter()
                .map(|[p, q]| [resolved[p], resolved[q]])
                .filter(|[p, q]| p != q)
                .map(|[p, q]| if p < q { [p, q] } else { [q, p] })
                .collect();
            segs.sort_unstable();
            segs.dedup();
            cut.segments = segs;
            cuts[t] = Some(cut);
        }

        let mut faces = Vec::with_capacity(tris.len());
        let mut face_origins = Vec::with_capacity(tris.len());
        let mut cut_edges: HashSet<(u32, u32)> = HashSet::new();
        for (t, slot) in cuts.into_iter().enumerate() {
            let corners = tris[t];
            let on_edges: [Vec<u32>; 3] = std::array::from_fn(|i| {
                edge_points
                    .get(&edge_key(corners[i], corners[(i + 1) % 3]))
                    .cloned()
                    .unwrap_or_default()
            });
            if slot.is_none() && on_edges.iter().all(Vec::is_empty) {
                faces.push(corners);
                face_origins.push(origins[t]);
                continue;
            }
            let mut cut = slot.unwrap_or_else(|| CutTriangle {
                corners,
                ..CutTriangle::default()
            });
            cut.edge_points = on_edges;
            let pieces = retriangulate(&vertices, &cut)?;
            face_origins.extend(std::iter::repeat(origins[t]).take(pieces.triangles.len()));
            faces.extend(pieces.triangles);
            cut_edges.extend(pieces.cut_edges);
        }
        debug!(
            triangles = faces.len(),
            cut_edges = cut_edges.len(),
            "shells re-triangulated"
        );

        Ok(separate(&vertices, &faces, face_origins, &cut_edges))
    }
}

enum Location {
    Corner(usize),
    Edge(usize),
    Interior,
}

/// Places `p` on a corner or edge of the triangle if it is within `epsilon` of it.
fn locate(p: &Point3, corners: &[Point3; 3], epsilon: f64) -> Location {
    if let Some(i) = (0..3).find(|&i| (corners[i] - p).norm() <= epsilon) {
        return Location::Corner(i);
    }
    for i in 0..3 {
        let a = corners[i];
        let d = corners[(i + 1) % 3] - a;
        let len2 = d.norm_squared();
        if len2 == 0.0 {
            continue;
        }
        let s = (p - a).dot(&d) / len2;
        if s > 0.0 && s < 1.0 && (a + d * s - p).norm() <= epsilon {
            return Location::Edge(i);
        }
    }
    Location::Interior
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Gives every piece bounded by cut edges its own copy of its vertices.
///
/// Faces are connected through shared edges that are not cut edges and
/// whose faces have the same origin.
#[allow(clippy::cast_possible_truncation)]
fn separate(
    vertices: &[Point3],
    faces: &[[u32; 3]],
    origins: Vec<Origin>,
    cut_edges: &HashSet<(u32, u32)>,
) -> MergedMesh {
    let mut uf = UnionFind::new(faces.len());
    let mut first: HashMap<((u32, u32), Origin), usize> = HashMap::new();
    for (fi, tri) in faces.iter().enumerate() {
        for k in 0..3 {
            let key = edge_key(tri[k], tri[(k + 1) % 3]);
            if cut_edges.contains(&key) {
                continue;
            }
            match first.entry((key, origins[fi])) {
                Entry::Occupied(e) => uf.union(fi, *e.get()),
                Entry::Vacant(e) => {
                    e.insert(fi);
                }
            }
        }
    }

    let mut island_of_root: HashMap<usize, usize> = HashMap::new();
    let mut remaps: Vec<HashMap<u32, u32>> = Vec::new();
    let mut out_vertices: Vec<Point3> = Vec::new();
    let mut out_faces = Vec::with_capacity(faces.len());
    for (fi, tri) in faces.iter().enumerate() {
        let root = uf.find(fi);
        let island = *island_of_root.entry(root).or_insert_with(|| {
            remaps.push(HashMap::new());
            remaps.len() - 1
        });
        let remap = &mut remaps[island];
        let corners = tri.map(|v| {
            *remap.entry(v).or_insert_with(|| {
                out_vertices.push(vertices[v as usize]);
                (out_vertices.len() - 1) as u32
            })
        });
        out_faces.push(Face::Triangle(corners));
    }

    MergedMesh {
        mesh: Mesh::new(out_vertices, out_faces),
        origins,
    }
}
