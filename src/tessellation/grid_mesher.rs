use serde::Deserialize;

use crate::interpolation::Grid2D;
use crate::mesh::{Face, Mesh};

/// Face type emitted per grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshMode {
    /// Two triangles per cell, split along the (i, j) to (i+1, j+1) diagonal.
    #[default]
    Triangle,
    /// One quad per cell.
    Quad,
}

/// Turns a sampled [`Grid2D`] into an open surface mesh.
///
/// Node `(i, j)` becomes vertex `i * ny + j`. For increasing axes every
/// face normal points up.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridMesher {
    mode: MeshMode,
}

impl GridMesher {
    /// Creates a new `GridMesher` for the given face type.
    #[must_use]
    pub fn new(mode: MeshMode) -> Self {
        Self { mode }
    }

    /// Executes the meshing. Grids narrower than two samples on either axis
    /// yield vertices but no faces.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute(&self, grid: &Grid2D) -> Mesh {
        let (nx, ny) = grid.shape();
        let mut vertices = Vec::with_capacity(nx * ny);
        for i in 0..nx {
            for j in 0..ny {
                vertices.push(grid.node(i, j));
            }
        }

        let index = |i: usize, j: usize| (i * ny + j) as u32;
        let cells = nx.saturating_sub(1) * ny.saturating_sub(1);
        let mut faces = Vec::with_capacity(match self.mode {
            MeshMode::Triangle => 2 * cells,
            MeshMode::Quad => cells,
        });
        for i in 0..nx.saturating_sub(1) {
            for j in 0..ny.saturating_sub(1) {
                let v1 = index(i, j);
                let v2 = index(i + 1, j);
                let v3 = index(i + 1, j + 1);
                let v4 = index(i, j + 1);
                match self.mode {
                    MeshMode::Triangle => {
                        faces.push(Face::Triangle([v1, v2, v3]));
                        faces.push(Face::Triangle([v1, v3, v4]));
                    }
                    MeshMode::Quad => faces.push(Face::Quad([v1, v2, v3, v4])),
                }
            }
        }

        Mesh::new(vertices, faces)
    }
}
