use crate::mesh::Mesh;

/// Computes the volume enclosed by a closed mesh.
///
/// Sums the signed tetrahedra `(1/6) * v0 . (v1 x v2)` over the fan
/// triangles of every face. The sign is positive for outward winding.
pub struct Volume<'a> {
    mesh: &'a Mesh,
}

impl<'a> Volume<'a> {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }

    /// Signed volume; negative when the faces wind inward.
    #[must_use]
    pub fn signed(&self) -> f64 {
        let mut sum = 0.0;
        for face in &self.mesh.faces {
            for tri in face.triangles() {
                let [v0, v1, v2] = self.mesh.triangle_points(tri);
                sum += v0.coords.dot(&v1.coords.cross(&v2.coords));
            }
        }
        sum / 6.0
    }

    /// Executes the query, returning the volume (absolute value).
    #[must_use]
    pub fn execute(&self) -> f64 {
        self.signed().abs()
    }
}
