use crate::error::MeshError;
use crate::math::Point3;
use crate::mesh::{Face, Mesh};

/// Creates an axis-aligned cuboid mesh from two corner points.
///
/// Vertices 0..4 are the bottom ring and 4..8 the top ring, both
/// counter-clockwise seen from above; all six quads wind outward.
pub struct MakeCuboid {
    min_corner: Point3,
    max_corner: Point3,
}

impl MakeCuboid {
    /// Creates a new `MakeCuboid` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidBounds`] unless `min_corner` is strictly
    /// below `max_corner` on every axis.
    pub fn execute(&self) -> Result<Mesh, MeshError> {
        let (lo, hi) = (self.min_corner, self.max_corner);
        if !(lo.x < hi.x && lo.y < hi.y && lo.z < hi.z) {
            return Err(MeshError::InvalidBounds(format!(
                "cuboid corners {lo} and {hi} do not span a volume"
            )));
        }

        let vertices = vec![
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
        ];
        let faces = vec![
            Face::Quad([0, 3, 2, 1]),
            Face::Quad([4, 5, 6, 7]),
            Face::Quad([0, 1, 5, 4]),
            Face::Quad([1, 2, 6, 5]),
            Face::Quad([2, 3, 7, 6]),
            Face::Quad([3, 0, 4, 7]),
        ];
        Ok(Mesh::new(vertices, faces))
    }
}
