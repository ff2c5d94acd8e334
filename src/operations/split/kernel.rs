use crate::error::SplitError;
use crate::mesh::Mesh;

/// Which input a face of a merged mesh came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Solid,
    Surface,
}

/// A disjoint union of a solid and a surface with per-face provenance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedMesh {
    pub mesh: Mesh,
    /// One entry per face of `mesh`.
    pub origins: Vec<Origin>,
}

impl MergedMesh {
    /// Merges `solid` and `surface`; solid faces come first.
    #[must_use]
    pub fn merge(solid: &Mesh, surface: &Mesh) -> Self {
        let mesh = solid.disjoint_union(surface);
        let mut origins = vec![Origin::Solid; solid.faces.len()];
        origins.resize(mesh.faces.len(), Origin::Surface);
        Self { mesh, origins }
    }

    /// Indices of the faces with the given origin.
    pub fn faces_of(&self, origin: Origin) -> impl Iterator<Item = usize> + '_ {
        self.origins
            .iter()
            .enumerate()
            .filter(move |(_, o)| **o == origin)
            .map(|(i, _)| i)
    }
}

/// Computes the arrangement of a closed solid and an open surface.
///
/// Implementations must return a mesh in which the two shells have been
/// re-triangulated along their intersection curves and every piece bounded
/// by those curves is physically disconnected from its neighbours (no
/// shared vertices), with `origins` carried over per face.
pub trait IntersectionKernel: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SplitError::Kernel`] when the arrangement cannot be built.
    fn intersect(&self, merged: &MergedMesh) -> Result<MergedMesh, SplitError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::mesh::Face;

    #[test]
    fn merge_tags_faces() {
        let tri = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![Face::Triangle([0, 1, 2])],
        );
        let merged = MergedMesh::merge(&tri, &tri.disjoint_union(&tri));
        assert_eq!(merged.origins, vec![Origin::Solid, Origin::Surface, Origin::Surface]);
        assert_eq!(merged.faces_of(Origin::Surface).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(merged.mesh.faces[2], Face::Triangle([6, 7, 8]));
    }
}
