use crate::error::MeshError;
use crate::math::Aabb;
use crate::mesh::Mesh;

/// Computes the axis-aligned bounding box of a mesh.
pub struct BoundingBox<'a> {
    mesh: &'a Mesh,
}

impl<'a> BoundingBox<'a> {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }

    /// Executes the query, returning the AABB of the vertices used by faces.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Empty`] if the mesh has no faces.
    pub fn execute(&self) -> Result<Aabb, MeshError> {
        let used = self
            .mesh
            .faces
            .iter()
            .flat_map(|f| f.indices().iter())
            .map(|&i| &self.mesh.vertices[i as usize]);
        Aabb::from_points(used).ok_or(MeshError::Empty)
    }
}
