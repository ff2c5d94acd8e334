pub mod bvh;
pub mod islands;
mod solid;
mod weld;

pub use bvh::Bvh;
pub use islands::FaceAdjacency;
pub use solid::{Solid, SolidId};
pub use weld::VertexWelder;

use crate::error::MeshError;
use crate::math::triangle::triangle_normal;
use crate::math::{Aabb, Point3, Vector3};

/// A mesh face: a triangle or a planar-ish quad, counter-clockwise seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Triangle([u32; 3]),
    Quad([u32; 4]),
}

impl Face {
    /// Vertex indices in winding order.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        match self {
            Self::Triangle(v) => v,
            Self::Quad(v) => v,
        }
    }

    /// The same face with reversed winding.
    #[must_use]
    pub fn flipped(&self) -> Self {
        match *self {
            Self::Triangle([a, b, c]) => Self::Triangle([a, c, b]),
            Self::Quad([a, b, c, d]) => Self::Quad([a, d, c, b]),
        }
    }

    /// Directed edges in winding order, closing back to the first vertex.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let v = self.indices();
        (0..v.len()).map(move |i| (v[i], v[(i + 1) % v.len()]))
    }

    /// Fan triangulation from the first vertex.
    #[must_use]
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        match *self {
            Self::Triangle(t) => vec![t],
            Self::Quad([a, b, c, d]) => vec![[a, b, c], [a, c, d]],
        }
    }

    /// Remaps vertex indices, dropping repeated consecutive vertices.
    ///
    /// Returns `None` when fewer than three distinct vertices remain or the
    /// face folds onto itself.
    fn remapped(&self, map: impl Fn(u32) -> u32) -> Option<Self> {
        let mut v: Vec<u32> = self.indices().iter().map(|&i| map(i)).collect();
        v.dedup();
        while v.len() > 1 && v.first() == v.last() {
            v.pop();
        }
        let distinct = v.iter().enumerate().all(|(k, a)| !v[k + 1..].contains(a));
        match v.as_slice() {
            _ if !distinct => None,
            &[a, b, c] => Some(Self::Triangle([a, b, c])),
            &[a, b, c, d] => Some(Self::Quad([a, b, c, d])),
            _ => None,
        }
    }

    pub(crate) fn remap_face(&self, remap: &[u32]) -> Option<Self> {
        self.remapped(|i| remap[i as usize])
    }
}

/// Returns the undirected key of an edge.
#[must_use]
pub fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// An indexed mesh of triangles and quads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3>,
    pub faces: Vec<Face>,
}

impl Mesh {
    #[must_use]
    pub fn new(vertices: Vec<Point3>, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }

    /// Checks that every face index addresses an existing vertex.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::IndexOutOfRange`] for the first offending face.
    pub fn validate(&self) -> Result<(), MeshError> {
        let len = self.vertices.len();
        for (face, f) in self.faces.iter().enumerate() {
            if let Some(&index) = f.indices().iter().find(|&&i| i as usize >= len) {
                return Err(MeshError::IndexOutOfRange { face, index, len });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    #[must_use]
    pub fn point(&self, index: u32) -> Point3 {
        self.vertices[index as usize]
    }

    #[must_use]
    pub fn triangle_points(&self, tri: [u32; 3]) -> [Point3; 3] {
        tri.map(|i| self.point(i))
    }

    /// Concatenates two meshes, offsetting the indices of `other`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn disjoint_union(&self, other: &Self) -> Self {
        let offset = self.vertices.len() as u32;
        let mut vertices = self.vertices.clone();
        vertices.extend_from_slice(&other.vertices);
        let mut faces = self.faces.clone();
        faces.extend(other.faces.iter().map(|f| match *f {
            Face::Triangle(v) => Face::Triangle(v.map(|i| i + offset)),
            Face::Quad(v) => Face::Quad(v.map(|i| i + offset)),
        }));
        Self { vertices, faces }
    }

    /// Splits every quad into two triangles.
    #[must_use]
    pub fn triangulated(&self) -> Self {
        let faces = self
            .faces
            .iter()
            .flat_map(Face::triangles)
            .map(Face::Triangle)
            .collect();
        Self {
            vertices: self.vertices.clone(),
            faces,
        }
    }

    /// Reverses the winding of every face.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            vertices: self.vertices.clone(),
            faces: self.faces.iter().map(Face::flipped).collect(),
        }
    }

    /// Copies the given faces, in the given order, into a compact mesh.
    ///
    /// Only vertices referenced by the selected faces are kept, numbered by
    /// first use.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn extract_faces(&self, faces: &[usize]) -> Self {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut vertices = Vec::new();
        let mut out = Vec::with_capacity(faces.len());
        for &fi in faces {
            let face = self.faces[fi];
            let mut map = |i: u32| {
                let slot = &mut remap[i as usize];
                if *slot == u32::MAX {
                    *slot = vertices.len() as u32;
                    vertices.push(self.vertices[i as usize]);
                }
                *slot
            };
            out.push(match face {
                Face::Triangle(v) => Face::Triangle(v.map(&mut map)),
                Face::Quad(v) => Face::Quad(v.map(&mut map)),
            });
        }
        Self {
            vertices,
            faces: out,
        }
    }

    /// Merges vertices closer than `epsilon` and drops faces that collapse.
    ///
    /// Quads that lose one vertex become triangles. Unreferenced vertices are
    /// removed.
    #[must_use]
    pub fn welded(&self, epsilon: f64) -> Self {
        let (vertices, remap) = VertexWelder::weld_all(&self.vertices, epsilon);
        let faces: Vec<Face> = self
            .faces
            .iter()
            .filter_map(|f| f.remap_face(&remap))
            .collect();
        let all: Vec<usize> = (0..faces.len()).collect();
        Self { vertices, faces }.extract_faces(&all)
    }

    /// Unnormalized face normal; for quads the sum over the fan triangles.
    #[must_use]
    pub fn face_normal(&self, face: &Face) -> Vector3 {
        face.triangles()
            .iter()
            .map(|&t| {
                let [a, b, c] = self.triangle_points(t);
                triangle_normal(&a, &b, &c)
            })
            .sum()
    }

    /// Average of the face's corner positions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn face_centroid(&self, face: &Face) -> Point3 {
        let idx = face.indices();
        let sum: Vector3 = idx.iter().map(|&i| self.point(i).coords).sum();
        Point3::from(sum / idx.len() as f64)
    }

    /// Bounding box of all vertices, or `None` for a mesh without vertices.
    #[must_use]
    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Highest vertex elevation, `-inf` when there are no vertices.
    #[must_use]
    pub fn max_z(&self) -> f64 {
        self.vertices
            .iter()
            .map(|p| p.z)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}
