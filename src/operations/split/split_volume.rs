use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::error::SplitError;
use crate::math::{DOUBLES_EPSILON, MIN_VOLUME};
use crate::mesh::{Face, FaceAdjacency, Mesh, Solid, VertexWelder};
use crate::operations::query::{ClassifyPoint, PointClassification, Volume};

use super::arrangement::MeshArrangement;
use super::kernel::{IntersectionKernel, MergedMesh, Origin};

/// Splits a closed solid with an open surface into the part above and the
/// part below it.
///
/// The surface must cross every side wall of the solid. After the kernel
/// has cut both shells along the intersection curve, exactly two shell
/// pieces and two surface pieces are expected. The surface piece inside
/// the solid (the cap) closes each shell piece; the piece whose cap faces
/// up is the lower solid.
#[derive(Debug, Clone)]
pub struct SplitVolume<K = MeshArrangement> {
    kernel: K,
    doubles_epsilon: f64,
    min_volume: f64,
}

impl Default for SplitVolume {
    fn default() -> Self {
        Self::new(MeshArrangement::default())
    }
}

impl<K: IntersectionKernel> SplitVolume<K> {
    /// Creates a new `SplitVolume` operation using `kernel`.
    #[must_use]
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            doubles_epsilon: DOUBLES_EPSILON,
            min_volume: MIN_VOLUME,
        }
    }

    /// Sets the distance at which shell and cap vertices are merged.
    #[must_use]
    pub fn with_doubles_epsilon(mut self, doubles_epsilon: f64) -> Self {
        self.doubles_epsilon = doubles_epsilon;
        self
    }

    /// Sets the volume below which a result counts as degenerate.
    #[must_use]
    pub fn with_min_volume(mut self, min_volume: f64) -> Self {
        self.min_volume = min_volume;
        self
    }

    /// Executes the split, returning `(above, below)`.
    ///
    /// The children are labelled `{label}_1` (above) and `{label}_2` (below).
    ///
    /// # Errors
    ///
    /// - [`SplitError::Kernel`] if either mesh has invalid faces, and for
    ///   kernel failures.
    /// - [`SplitError::NonBisectingSurface`] if the arrangement does not
    ///   consist of two shell pieces and two surface pieces, or if the cap
    ///   or the two sides cannot be told apart.
    /// - [`SplitError::DegenerateResult`] if a child encloses less than the
    ///   minimum volume.
    #[instrument(skip_all, fields(solid = %solid.label))]
    pub fn execute(&self, solid: &Solid, surface: &Mesh) -> Result<(Solid, Solid), SplitError> {
        for mesh in [&solid.mesh, surface] {
            mesh.validate().map_err(|e| SplitError::Kernel(e.to_string()))?;
        }
        let shell = if Volume::new(&solid.mesh).signed() < 0.0 {
            solid.mesh.flipped()
        } else {
            solid.mesh.clone()
        };

        let merged = MergedMesh::merge(&shell, surface);
        let arranged = self.kernel.intersect(&merged)?;
        let islands = FaceAdjacency::from_mesh(&arranged.mesh).islands();
        let total = islands.len();
        let (shells, surfaces): (Vec<Vec<usize>>, Vec<Vec<usize>>) = islands
            .into_iter()
            .partition(|island| arranged.origins[island[0]] == Origin::Solid);
        debug!(
            islands = total,
            shells = shells.len(),
            surfaces = surfaces.len(),
            "arrangement islands"
        );
        let non_bisecting = |reason: String| SplitError::NonBisectingSurface {
            islands: total,
            shell: shells.len(),
            surface: surfaces.len(),
            reason,
        };
        if shells.len() != 2 || surfaces.len() != 2 {
            return Err(non_bisecting("expected 2 shell and 2 surface pieces".into()));
        }

        let cap = self.find_cap(&shell, &arranged.mesh, &surfaces).map_err(non_bisecting)?;

        let mut above = None;
        let mut below = None;
        for island in &shells {
            let (mesh, is_below) = self.assemble(&arranged.mesh, island, cap).map_err(non_bisecting)?;
            let slot = if is_below { &mut below } else { &mut above };
            if slot.replace(mesh).is_some() {
                return Err(non_bisecting("both shell pieces lie on the same side of the surface".into()));
            }
        }
        let (Some(above), Some(below)) = (above, below) else {
            return Err(non_bisecting("missing shell piece".into()));
        };

        for mesh in [&above, &below] {
            let volume = Volume::new(mesh).signed();
            if volume < self.min_volume {
                return Err(SplitError::DegenerateResult { volume });
            }
        }

        Ok((
            Solid::new(format!("{}_1", solid.label), above),
            Solid::new(format!("{}_2", solid.label), below),
        ))
    }

    /// Picks the surface island whose largest face lies inside the solid.
    fn find_cap<'i>(&self, shell: &Mesh, arranged: &Mesh, surfaces: &'i [Vec<usize>]) -> Result<&'i [usize], String> {
        let classifier = ClassifyPoint::new(shell);
        let inside: Vec<bool> = surfaces
            .iter()
            .map(|island| {
                let sample = island
                    .iter()
                    .map(|&f| (arranged.face_normal(&arranged.faces[f]).norm(), f))
                    .max_by(|a, b| a.0.total_cmp(&b.0).then(b.1.cmp(&a.1)))
                    .map(|(_, f)| arranged.face_centroid(&arranged.faces[f]));
                sample.is_some_and(|c| classifier.execute(&c) == PointClassification::Inside)
            })
            .collect();
        match inside.as_slice() {
            [true, false] => Ok(&surfaces[0]),
            [false, true] => Ok(&surfaces[1]),
            _ => Err(format!("expected exactly one surface piece inside the solid, inside flags {inside:?}")),
        }
    }

    /// Closes a shell piece with the cap, returning the mesh and whether the
    /// cap is its roof.
    fn assemble(&self, arranged: &Mesh, shell: &[usize], cap: &[usize]) -> Result<(Mesh, bool), String> {
        let mut order = shell.to_vec();
        order.extend_from_slice(cap);
        let extracted = arranged.extract_faces(&order);
        let (vertices, remap) = VertexWelder::weld_all(&extracted.vertices, self.doubles_epsilon);

        let (shell_part, cap_part) = extracted.faces.split_at(shell.len());
        let mut faces: Vec<Face> = shell_part.iter().filter_map(|f| f.remap_face(&remap)).collect();
        let mut cap_faces: Vec<Face> = cap_part.iter().filter_map(|f| f.remap_face(&remap)).collect();

        let directed: HashSet<(u32, u32)> = faces.iter().flat_map(Face::edges).collect();
        let (mut agree, mut oppose) = (0usize, 0usize);
        for (a, b) in cap_faces.iter().flat_map(Face::edges) {
            if directed.contains(&(a, b)) {
                agree += 1;
            } else if directed.contains(&(b, a)) {
                oppose += 1;
            }
        }
        if agree + oppose == 0 {
            return Err("cap does not meet the shell piece".into());
        }
        if agree > oppose {
            cap_faces = cap_faces.iter().map(Face::flipped).collect();
        }

        let first_cap = faces.len();
        faces.extend(cap_faces);
        let closed = Mesh::new(vertices, faces);
        let rise: f64 = closed.faces[first_cap..]
            .iter()
            .map(|f| closed.face_normal(f).z)
            .sum();

        let all: Vec<usize> = (0..closed.faces.len()).collect();
        Ok((closed.extract_faces(&all), rise > 0.0))
    }
}
