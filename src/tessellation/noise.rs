use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::math::Point3;
use crate::mesh::Mesh;

/// Seeded elevation jitter for a meshed topography.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TopographyNoise {
    pub amplitude: f64,
    pub seed: u64,
    /// Vertices within this (x, y) distance of an anchor keep their elevation.
    pub anchor_radius: f64,
}

impl Default for TopographyNoise {
    fn default() -> Self {
        Self {
            amplitude: 0.1,
            seed: 0,
            anchor_radius: 0.1,
        }
    }
}

/// Perturbs vertex elevations while pinning the surface at anchor points.
///
/// Vertices near an anchor are kept. Vertices below the lowest anchor are
/// lifted to `min_anchor_z + amplitude * u`; all others move by
/// `amplitude * (u1 - u2)`, with `u` uniform in `[0, 1)`.
pub struct ApplyNoise<'a> {
    noise: TopographyNoise,
    anchors: &'a [Point3],
}

impl<'a> ApplyNoise<'a> {
    /// Creates a new `ApplyNoise` operation.
    #[must_use]
    pub fn new(noise: TopographyNoise, anchors: &'a [Point3]) -> Self {
        Self { noise, anchors }
    }

    /// Executes the perturbation on a copy of `mesh`.
    #[must_use]
    pub fn execute(&self, mesh: &Mesh) -> Mesh {
        let mut rng = StdRng::seed_from_u64(self.noise.seed);
        let floor = self
            .anchors
            .iter()
            .map(|a| a.z)
            .fold(f64::INFINITY, f64::min);
        let amplitude = self.noise.amplitude;

        let mut out = mesh.clone();
        for v in &mut out.vertices {
            let pinned = self
                .anchors
                .iter()
                .any(|a| (a.x - v.x).hypot(a.y - v.y) <= self.noise.anchor_radius);
            if pinned {
                continue;
            }
            if v.z < floor {
                v.z = floor + amplitude * rng.random::<f64>();
            } else {
                v.z += amplitude * (rng.random::<f64>() - rng.random::<f64>());
            }
        }
        out
    }
}
