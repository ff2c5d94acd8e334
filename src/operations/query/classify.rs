use crate::math::triangle::{ray_triangle, RayHit};
use crate::math::{Point3, Vector3};
use crate::mesh::Mesh;

/// Classification of a point relative to a closed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClassification {
    Inside,
    Outside,
    OnBoundary,
}

/// Classifies a point as inside, outside, or on the boundary of a closed mesh.
///
/// Uses ray casting: shoots a ray from the point and counts triangle
/// crossings. Odd crossings = inside, even = outside. If the ray is
/// degenerate (hits an edge/vertex), retries with alternative directions.
pub struct ClassifyPoint<'a> {
    mesh: &'a Mesh,
}

enum RayCastResult {
    Clear(PointClassification),
    Degenerate,
}

impl<'a> ClassifyPoint<'a> {
    /// Creates a new `ClassifyPoint` query.
    #[must_use]
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }

    /// Executes the classification.
    #[must_use]
    pub fn execute(&self, point: &Point3) -> PointClassification {
        // Slightly tilted so rays do not run along grid lines or cuboid faces.
        let directions = [
            Vector3::new(1.0, 0.017_3, 0.029_1),
            Vector3::new(0.021_3, 1.0, -0.013_7),
            Vector3::new(-0.031_1, 0.015_7, 1.0),
        ];

        for dir in &directions {
            if let RayCastResult::Clear(classification) = self.ray_cast(point, dir) {
                return classification;
            }
        }

        // All directions degenerate, very unlikely
        PointClassification::Outside
    }

    fn ray_cast(&self, point: &Point3, dir: &Vector3) -> RayCastResult {
        let mut crossings = 0u32;
        for face in &self.mesh.faces {
            for tri in face.triangles() {
                match ray_triangle(point, dir, &self.mesh.triangle_points(tri)) {
                    RayHit::Miss => {}
                    RayHit::Hit(_) => crossings += 1,
                    RayHit::Origin => {
                        return RayCastResult::Clear(PointClassification::OnBoundary)
                    }
                    RayHit::Degenerate => return RayCastResult::Degenerate,
                }
            }
        }

        if crossings % 2 == 1 {
            RayCastResult::Clear(PointClassification::Inside)
        } else {
            RayCastResult::Clear(PointClassification::Outside)
        }
    }
}
