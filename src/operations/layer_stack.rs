use rayon::prelude::*;
use slotmap::SlotMap;
use tracing::{debug, info, instrument};

use crate::error::LayerStackError;
use crate::mesh::{Mesh, Solid, SolidId};
use crate::operations::query::ShellsIntersect;
use crate::operations::split::{IntersectionKernel, MeshArrangement, SplitVolume};

/// What to keep when a surface splits a live solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutMode {
    /// Discard the part above the surface (topography).
    KeepBelowOnly,
    /// Keep both parts (internal contacts).
    #[default]
    SplitBoth,
}

/// A cutting surface together with its [`CutMode`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSurface {
    pub mesh: Mesh,
    pub mode: CutMode,
}

impl LayerSurface {
    #[must_use]
    pub fn new(mesh: Mesh, mode: CutMode) -> Self {
        Self { mesh, mode }
    }
}

/// Decomposes one volume into layers by cutting it with an ordered list of
/// surfaces.
///
/// Surfaces are applied one round at a time. In a round every live solid
/// whose shell crosses the surface is split in parallel; the others pass
/// through. Afterwards the solids are ordered top to bottom by their
/// highest elevation and optionally relabelled in that order.
#[derive(Debug, Clone)]
pub struct BuildLayerStack<K = MeshArrangement> {
    splitter: SplitVolume<K>,
    labels: Option<Vec<String>>,
}

impl Default for BuildLayerStack {
    fn default() -> Self {
        Self::new(MeshArrangement::default())
    }
}

impl<K: IntersectionKernel> BuildLayerStack<K> {
    /// Creates a new `BuildLayerStack` operation splitting with `kernel`.
    #[must_use]
    pub fn new(kernel: K) -> Self {
        Self::with_splitter(SplitVolume::new(kernel))
    }

    /// Creates a new `BuildLayerStack` operation from a configured splitter.
    #[must_use]
    pub fn with_splitter(splitter: SplitVolume<K>) -> Self {
        Self {
            splitter,
            labels: None,
        }
    }

    /// Sets the final labels, top layer first.
    #[must_use]
    pub fn with_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Executes the build, returning the solids ordered top to bottom.
    ///
    /// # Errors
    ///
    /// - [`LayerStackError::InvalidSolid`] or
    ///   [`LayerStackError::InvalidSurface`] if an input mesh has invalid
    ///   faces; all inputs are checked before any split.
    /// - [`LayerStackError::Split`] for the first split that fails; the
    ///   whole build stops there.
    /// - [`LayerStackError::LabelCount`] if labels were given and their
    ///   number differs from the number of resulting solids.
    /// - [`LayerStackError::EmptyLayerStack`] if no solid remains.
    #[instrument(skip_all, fields(surfaces = surfaces.len()))]
    pub fn execute(&self, initial: Solid, surfaces: &[LayerSurface]) -> Result<Vec<Solid>, LayerStackError> {
        initial.mesh.validate().map_err(|source| LayerStackError::InvalidSolid {
            solid: initial.label.clone(),
            source,
        })?;
        for (surface, layer) in surfaces.iter().enumerate() {
            layer
                .mesh
                .validate()
                .map_err(|source| LayerStackError::InvalidSurface { surface, source })?;
        }

        let mut live: SlotMap<SolidId, Solid> = SlotMap::with_key();
        live.insert(initial);

        for (index, surface) in surfaces.iter().enumerate() {
            let candidates: Vec<(SolidId, &Solid)> = live
                .iter()
                .filter(|(_, solid)| ShellsIntersect::new(&solid.mesh, &surface.mesh).execute())
                .collect();
            debug!(surface = index, candidates = candidates.len(), "intersecting solids");

            let children = candidates
                .par_iter()
                .map(|&(id, solid)| {
                    self.splitter
                        .execute(solid, &surface.mesh)
                        .map(|parts| (id, parts))
                        .map_err(|source| LayerStackError::Split {
                            surface: index,
                            solid: solid.label.clone(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let split = children.len();
            for (id, (above, below)) in children {
                live.remove(id);
                if surface.mode == CutMode::SplitBoth {
                    live.insert(above);
                }
                live.insert(below);
            }
            info!(
                surface = index,
                split,
                mode = ?surface.mode,
                live = live.len(),
                "applied surface"
            );
        }

        let mut solids: Vec<Solid> = live.into_iter().map(|(_, solid)| solid).collect();
        if solids.is_empty() {
            return Err(LayerStackError::EmptyLayerStack);
        }
        solids.sort_by(|a, b| b.elevation.total_cmp(&a.elevation));

        match &self.labels {
            None => Ok(solids),
            Some(labels) if labels.len() != solids.len() => Err(LayerStackError::LabelCount {
                solids: solids.len(),
                labels: labels.len(),
            }),
            Some(labels) => Ok(solids
                .into_iter()
                .zip(labels)
                .map(|(solid, label)| solid.relabeled(label.as_str()))
                .collect()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::{MeshError, SplitError};
    use crate::interpolation::Grid2D;
    use crate::math::Point3;
    use crate::mesh::Face;
    use crate::operations::creation::MakeCuboid;
    use crate::operations::query::{IsValid, Volume};
    use crate::tessellation::{GridMesher, MeshMode};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn base() -> Solid {
        let mesh = MakeCuboid::new(p(0.0, 0.0, 0.0), p(10.0, 10.0, 4.0))
            .execute()
            .unwrap();
        Solid::new("base", mesh)
    }

    fn samples(start: f64, n: u32) -> Vec<f64> {
        (0..n).map(|i| start + f64::from(i)).collect()
    }

    fn plane(z: f64, mode: CutMode) -> LayerSurface {
        let grid = Grid2D::from_fn(&samples(-1.3, 13), &samples(-1.7, 13), |_, _| z);
        LayerSurface::new(GridMesher::new(MeshMode::Triangle).execute(&grid), mode)
    }

    /// Plane sampled on integer coordinates, so grid lines lie in the walls.
    fn aligned_plane(z: f64) -> LayerSurface {
        let grid = Grid2D::from_fn(&samples(-1.0, 13), &samples(-1.0, 13), |_, _| z);
        LayerSurface::new(GridMesher::new(MeshMode::Triangle).execute(&grid), CutMode::SplitBoth)
    }

    fn summary(solids: &[Solid]) -> Vec<(String, f64)> {
        solids
            .iter()
            .map(|s| (s.label.clone(), Volume::new(&s.mesh).execute()))
            .collect()
    }

    #[test]
    fn two_planes_make_three_layers() {
        let surfaces = [plane(3.0, CutMode::SplitBoth), plane(1.0, CutMode::SplitBoth)];
        let solids = BuildLayerStack::default()
            .with_labels(["A", "G", "S"])
            .execute(base(), &surfaces)
            .unwrap();

        let labels: Vec<&str> = solids.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["A", "G", "S"]);
        for (solid, expected) in solids.iter().zip([100.0, 200.0, 100.0]) {
            assert_relative_eq!(Volume::new(&solid.mesh).signed(), expected, epsilon = 1e-6);
            let report = IsValid::new(&solid.mesh).report();
            assert!(report.is_valid(), "{}: {report:?}", solid.label);
            assert_eq!(report.euler_characteristic, 2);
        }
    }

    #[test]
    fn grid_lines_on_walls_still_split() {
        let surfaces = [aligned_plane(3.0), aligned_plane(1.0)];
        let solids = BuildLayerStack::default()
            .with_labels(["A", "G", "S"])
            .execute(base(), &surfaces)
            .unwrap();
        for (solid, expected) in solids.iter().zip([100.0, 200.0, 100.0]) {
            assert_relative_eq!(Volume::new(&solid.mesh).signed(), expected, epsilon = 1e-6);
            let report = IsValid::new(&solid.mesh).report();
            assert!(report.is_valid(), "{}: {report:?}", solid.label);
            assert_eq!(report.euler_characteristic, 2);
        }
    }

    #[test]
    fn invalid_surface_is_rejected_up_front() {
        let mut broken = plane(1.0, CutMode::SplitBoth);
        broken.mesh.faces.push(Face::Triangle([0, 1, 10_000]));
        let surfaces = [plane(3.0, CutMode::SplitBoth), broken];
        let err = BuildLayerStack::default().execute(base(), &surfaces).unwrap_err();
        assert!(matches!(
            err,
            LayerStackError::InvalidSurface {
                surface: 1,
                source: MeshError::IndexOutOfRange { .. }
            }
        ));
    }

    #[test]
    fn repeated_builds_agree() {
        let surfaces = [plane(3.0, CutMode::SplitBoth), plane(1.0, CutMode::SplitBoth)];
        let builder = BuildLayerStack::default().with_labels(["A", "G", "S"]);
        let first = builder.execute(base(), &surfaces).unwrap();
        let second = builder.execute(base(), &surfaces).unwrap();
        assert_eq!(summary(&first), summary(&second));
        assert_eq!(first, second);
    }

    #[test]
    fn keep_below_discards_the_top() {
        let surfaces = [plane(3.0, CutMode::KeepBelowOnly)];
        let solids = BuildLayerStack::default().execute(base(), &surfaces).unwrap();
        assert_eq!(solids.len(), 1);
        assert_eq!(solids[0].label, "base_2");
        assert_relative_eq!(Volume::new(&solids[0].mesh).signed(), 300.0, epsilon = 1e-6);
    }

    #[test]
    fn surfaces_that_miss_pass_through() {
        let surfaces = [plane(7.0, CutMode::SplitBoth), plane(2.0, CutMode::SplitBoth)];
        let solids = BuildLayerStack::default().execute(base(), &surfaces).unwrap();
        let labels: Vec<&str> = solids.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["base_1", "base_2"]);
    }

    #[test]
    fn label_count_mismatch() {
        let surfaces = [plane(2.0, CutMode::SplitBoth)];
        let err = BuildLayerStack::default()
            .with_labels(["A", "G", "S"])
            .execute(base(), &surfaces)
            .unwrap_err();
        assert!(matches!(err, LayerStackError::LabelCount { solids: 2, labels: 3 }));
    }

    #[test]
    fn failing_split_names_surface_and_solid() {
        let half = Grid2D::from_fn(&samples(-1.3, 7), &samples(-1.7, 13), |_, _| 1.0);
        let surfaces = [
            plane(3.0, CutMode::SplitBoth),
            LayerSurface::new(GridMesher::new(MeshMode::Quad).execute(&half), CutMode::SplitBoth),
        ];
        let err = BuildLayerStack::default().execute(base(), &surfaces).unwrap_err();
        let LayerStackError::Split { surface, solid, source } = err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(surface, 1);
        assert_eq!(solid, "base_2");
        assert!(matches!(source, SplitError::NonBisectingSurface { .. }));
    }
}
