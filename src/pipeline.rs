use tracing::{debug, info, instrument, warn};

use crate::config::ModelConfig;
use crate::error::{DegenerateKind, InterpolationError, Result};
use crate::geology::{Borehole, ExtractContacts};
use crate::interpolation::{Domain, FitAndSample};
use crate::math::Point3;
use crate::mesh::{Mesh, Solid};
use crate::operations::creation::MakeCuboid;
use crate::operations::layer_stack::{BuildLayerStack, CutMode, LayerSurface};
use crate::operations::split::{IntersectionKernel, MeshArrangement, SplitVolume};
use crate::tessellation::{ApplyNoise, GridMesher};

/// One finished layer: its unit label and closed, outward-wound mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSolid {
    pub label: String,
    pub mesh: Mesh,
}

/// Result of [`BuildGeologicalModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeologicalModel {
    /// Layers from top to bottom.
    pub layers: Vec<LayerSolid>,
    /// Boundaries that could not be interpolated and were left out.
    pub skipped: Vec<String>,
}

/// Builds the layer model of a site from its boreholes.
///
/// The model extents are the borehole extents grown by the configured
/// padding. A topography surface through the borehole tops removes
/// everything above the ground from a base cuboid; each configured contact
/// surface then splits the solids it crosses. Layers are labelled from
/// `layer_order` unless a contact surface had to be skipped.
#[derive(Debug, Clone)]
pub struct BuildGeologicalModel<'a, K = MeshArrangement> {
    boreholes: &'a [Borehole],
    config: ModelConfig,
    kernel: K,
}

impl<'a> BuildGeologicalModel<'a> {
    /// Creates a new `BuildGeologicalModel` operation with default settings.
    #[must_use]
    pub fn new(boreholes: &'a [Borehole]) -> Self {
        Self {
            boreholes,
            config: ModelConfig::default(),
            kernel: MeshArrangement::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.kernel = self.kernel.with_weld_epsilon(config.weld_epsilon);
        self.config = config;
        self
    }
}

impl<'a, K: IntersectionKernel + Clone> BuildGeologicalModel<'a, K> {
    /// Replaces the intersection kernel.
    #[must_use]
    pub fn with_kernel<L: IntersectionKernel + Clone>(self, kernel: L) -> BuildGeologicalModel<'a, L> {
        BuildGeologicalModel {
            boreholes: self.boreholes,
            config: self.config,
            kernel,
        }
    }

    /// Executes the build.
    ///
    /// # Errors
    ///
    /// - Configuration errors from [`ModelConfig::validate`].
    /// - [`InterpolationError`] if there are no boreholes or the topography
    ///   cannot be fitted. Contact surfaces that cannot be fitted are
    ///   skipped instead.
    /// - Layer stack errors, including the first failed split.
    #[instrument(skip_all, fields(boreholes = self.boreholes.len()))]
    pub fn execute(&self) -> Result<GeologicalModel> {
        let config = &self.config;
        config.validate()?;

        let (domain, zmin, zmax) = self.extents()?;
        let inset = &config.base_inset;
        let lo = Point3::new(domain.xmin + inset.x.0, domain.ymin + inset.y.0, zmin + inset.z.0);
        let hi = Point3::new(domain.xmax - inset.x.1, domain.ymax - inset.y.1, zmax - inset.z.1);
        let base = MakeCuboid::new(lo, hi).execute()?;

        let mesher = GridMesher::new(config.mesh_mode);
        let surface_through = |points: &[Point3]| {
            FitAndSample::new(points)
                .with_domain(domain)
                .with_steps(config.grid_x, config.grid_y)
                .execute()
                .map(|grid| mesher.execute(&grid))
        };

        let tops: Vec<Point3> = self.boreholes.iter().map(Borehole::top_point).collect();
        let mut topography = surface_through(&tops)?;
        if let Some(noise) = config.topography_noise {
            topography = ApplyNoise::new(noise, &tops).execute(&topography);
        }
        let mut surfaces = vec![LayerSurface::new(topography, CutMode::KeepBelowOnly)];

        let mut skipped = Vec::new();
        for contact in &config.contact_surfaces {
            let mut set = ExtractContacts::new(contact.above.clone(), contact.below.iter().cloned())
                .execute(self.boreholes);
            set.extend(contact.extra());
            match surface_through(&set.points) {
                Ok(mesh) => {
                    debug!(boundary = %set.boundary, points = set.len(), "contact surface");
                    surfaces.push(LayerSurface::new(mesh, CutMode::SplitBoth));
                }
                Err(err) => {
                    warn!(boundary = %set.boundary, points = set.len(), error = %err, "skipping contact surface");
                    skipped.push(set.boundary);
                }
            }
        }

        let splitter = SplitVolume::new(self.kernel.clone())
            .with_doubles_epsilon(config.doubles_epsilon)
            .with_min_volume(config.min_volume);
        let mut builder = BuildLayerStack::with_splitter(splitter);
        if skipped.is_empty() {
            builder = builder.with_labels(config.layer_order.iter().cloned());
        } else {
            warn!(skipped = skipped.len(), "keeping provisional layer labels");
        }
        let solids = builder.execute(Solid::new("base", base), &surfaces)?;
        info!(layers = solids.len(), "geological model built");

        Ok(GeologicalModel {
            layers: solids
                .into_iter()
                .map(|s| LayerSolid {
                    label: s.label,
                    mesh: s.mesh,
                })
                .collect(),
            skipped,
        })
    }

    /// Padded (x, y) window and padded elevation range of the boreholes.
    fn extents(&self) -> Result<(Domain, f64, f64)> {
        let tops: Vec<Point3> = self.boreholes.iter().map(Borehole::top_point).collect();
        let domain = Domain::bounding(&tops).ok_or(InterpolationError::DegenerateInput {
            kind: DegenerateKind::Empty,
        })?;
        let padding = &self.config.padding;
        let zmin = self
            .boreholes
            .iter()
            .map(|bh| bh.bottom_elevation().unwrap_or(bh.top))
            .fold(f64::INFINITY, f64::min);
        let zmax = tops.iter().map(|p| p.z).fold(f64::NEG_INFINITY, f64::max);
        Ok((
            domain.padded(padding.x, padding.y),
            zmin - padding.z.0,
            zmax + padding.z.1,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;
    use tracing_subscriber::EnvFilter;

    use super::*;
    use crate::config::ContactSurfaceConfig;
    use crate::error::GeostrataError;
    use crate::operations::query::{IsValid, Volume};

    /// Flat ground at 10, fill `A` down to 8, gravel `G` down to a contact
    /// dipping with x (`5 + 0.1 x`), sand `S` down to 1.
    fn site() -> Vec<Borehole> {
        [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0), (5.0, 5.0)]
            .iter()
            .enumerate()
            .map(|(k, &(x, y))| {
                Borehole::new(
                    format!("BH{k}"),
                    x,
                    y,
                    10.0,
                    [("A", 2.0), ("G", 5.0 - 0.1 * x), ("S", 9.0)],
                )
                .unwrap()
            })
            .collect()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn three_layer_site() {
        init_tracing();
        let boreholes = site();
        let model = BuildGeologicalModel::new(&boreholes).execute().unwrap();

        assert!(model.skipped.is_empty());
        let labels: Vec<&str> = model.layers.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, ["A", "G", "S"]);

        // Base footprint is [-1, 11]^2, base floor at -1. The unit sampling
        // grid starts at -2, so grid lines run along every side wall.
        for (layer, expected) in model.layers.iter().zip([288.0, 360.0, 936.0]) {
            assert_relative_eq!(Volume::new(&layer.mesh).signed(), expected, epsilon = 1e-3);
            let report = IsValid::new(&layer.mesh).report();
            assert!(report.is_valid(), "{}: {report:?}", layer.label);
            assert_eq!(report.euler_characteristic, 2);
        }
    }

    #[test]
    fn missing_contact_keeps_provisional_labels() {
        init_tracing();
        let boreholes = site();
        let config = ModelConfig {
            contact_surfaces: vec![
                ContactSurfaceConfig::new("X", ["S"]),
                ContactSurfaceConfig::new("A", ["S", "G"]),
            ],
            ..ModelConfig::default()
        };
        let model = BuildGeologicalModel::new(&boreholes)
            .with_config(config)
            .execute()
            .unwrap();

        assert_eq!(model.skipped, ["X->{S}"]);
        let labels: Vec<&str> = model.layers.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, ["base_2_1", "base_2_2"]);
        assert_relative_eq!(Volume::new(&model.layers[0].mesh).signed(), 288.0, epsilon = 1e-3);
    }

    #[test]
    fn no_boreholes() {
        let err = BuildGeologicalModel::new(&[]).execute().unwrap_err();
        assert!(matches!(
            err,
            GeostrataError::Interpolation(InterpolationError::DegenerateInput {
                kind: DegenerateKind::Empty
            })
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let boreholes = site();
        let config = ModelConfig {
            grid_x: 0.0,
            ..ModelConfig::default()
        };
        let err = BuildGeologicalModel::new(&boreholes)
            .with_config(config)
            .execute()
            .unwrap_err();
        assert!(matches!(err, GeostrataError::Config(_)));
    }
}
