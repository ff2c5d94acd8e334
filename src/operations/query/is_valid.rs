use std::collections::{HashMap, HashSet};

use crate::mesh::{edge_key, Mesh};

/// Edge-level diagnostics of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidityReport {
    /// Undirected edges used by exactly one face.
    pub boundary_edges: usize,
    /// Undirected edges used by more than two faces.
    pub non_manifold_edges: usize,
    /// Manifold edges traversed in the same direction by both faces.
    pub inconsistent_edges: usize,
    /// `V - E + F` over referenced vertices.
    pub euler_characteristic: i64,
}

impl ValidityReport {
    /// Closed, manifold and consistently wound.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.boundary_edges == 0 && self.non_manifold_edges == 0 && self.inconsistent_edges == 0
    }
}

/// Validates that a mesh is a closed, consistently oriented surface.
pub struct IsValid<'a> {
    mesh: &'a Mesh,
}

impl<'a> IsValid<'a> {
    /// Creates a new `IsValid` query.
    #[must_use]
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }

    /// Collects edge statistics and the Euler characteristic.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn report(&self) -> ValidityReport {
        let mut directed: HashMap<(u32, u32), usize> = HashMap::new();
        let mut undirected: HashMap<(u32, u32), usize> = HashMap::new();
        let mut used = HashSet::new();
        for face in &self.mesh.faces {
            used.extend(face.indices().iter().copied());
            for (a, b) in face.edges() {
                *directed.entry((a, b)).or_default() += 1;
                *undirected.entry(edge_key(a, b)).or_default() += 1;
            }
        }

        let mut report = ValidityReport::default();
        for (&(a, b), &count) in &undirected {
            match count {
                1 => report.boundary_edges += 1,
                2 => {
                    let forward = directed.get(&(a, b)).copied().unwrap_or(0);
                    if forward != 1 {
                        report.inconsistent_edges += 1;
                    }
                }
                _ => report.non_manifold_edges += 1,
            }
        }
        report.euler_characteristic =
            used.len() as i64 - undirected.len() as i64 + self.mesh.faces.len() as i64;
        report
    }

    /// Executes the validation, returning `true` if the mesh is valid.
    #[must_use]
    pub fn execute(&self) -> bool {
        self.mesh.validate().is_ok() && self.report().is_valid()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::mesh::Face;
    use crate::operations::creation::MakeCuboid;

    fn cube() -> Mesh {
        MakeCuboid::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
            .execute()
            .unwrap()
    }

    #[test]
    fn cube_is_valid() {
        assert!(IsValid::new(&cube()).execute());
        assert!(IsValid::new(&cube().triangulated()).execute());
        assert_eq!(IsValid::new(&cube().triangulated()).report().euler_characteristic, 2);
    }

    #[test]
    fn open_box_has_boundary() {
        let mut mesh = cube();
        mesh.faces.remove(1);
        let report = IsValid::new(&mesh).report();
        assert_eq!(report.boundary_edges, 4);
        assert!(!report.is_valid());
    }

    #[test]
    fn flipped_face_is_inconsistent() {
        let mut mesh = cube();
        mesh.faces[0] = mesh.faces[0].flipped();
        let report = IsValid::new(&mesh).report();
        assert_eq!(report.boundary_edges, 0);
        assert_eq!(report.inconsistent_edges, 4);
    }

    #[test]
    fn out_of_range_index_is_invalid() {
        let mut mesh = cube();
        mesh.faces.push(Face::Triangle([0, 1, 99]));
        assert!(!IsValid::new(&mesh).execute());
    }
}
