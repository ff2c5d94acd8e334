use std::io::Read;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::math::{Point3, DOUBLES_EPSILON, MIN_VOLUME, WELD_EPSILON};
use crate::tessellation::{MeshMode, TopographyNoise};

/// Per-axis `(low, high)` distances.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Margins {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: (f64, f64),
}

impl Margins {
    #[must_use]
    pub fn new(x: (f64, f64), y: (f64, f64), z: (f64, f64)) -> Self {
        Self { x, y, z }
    }

    fn values(&self) -> [f64; 6] {
        [self.x.0, self.x.1, self.y.0, self.y.1, self.z.0, self.z.1]
    }
}

/// One internal boundary: where `above` rests on any unit of `below`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContactSurfaceConfig {
    pub above: String,
    pub below: Vec<String>,
    /// Additional `[x, y, z]` points the surface must pass through.
    #[serde(default)]
    pub extra_points: Vec<[f64; 3]>,
}

impl ContactSurfaceConfig {
    #[must_use]
    pub fn new<S: Into<String>>(above: impl Into<String>, below: impl IntoIterator<Item = S>) -> Self {
        Self {
            above: above.into(),
            below: below.into_iter().map(Into::into).collect(),
            extra_points: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extra_points(mut self, points: impl IntoIterator<Item = [f64; 3]>) -> Self {
        self.extra_points.extend(points);
        self
    }

    /// Extra points as [`Point3`].
    pub fn extra(&self) -> impl Iterator<Item = Point3> + '_ {
        self.extra_points.iter().map(|&[x, y, z]| Point3::new(x, y, z))
    }
}

/// Settings for [`BuildGeologicalModel`](crate::pipeline::BuildGeologicalModel).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Interpolation grid spacing along x.
    pub grid_x: f64,
    /// Interpolation grid spacing along y.
    pub grid_y: f64,
    pub mesh_mode: MeshMode,
    /// Added around the borehole extents. The z margins apply below the
    /// deepest borehole base and above the highest top.
    pub padding: Margins,
    /// Taken off the padded extents to get the base cuboid; negative values
    /// enlarge it.
    pub base_inset: Margins,
    pub weld_epsilon: f64,
    pub doubles_epsilon: f64,
    pub min_volume: f64,
    /// Final layer labels, top layer first.
    pub layer_order: Vec<String>,
    /// Internal boundaries, applied in this order after the topography.
    pub contact_surfaces: Vec<ContactSurfaceConfig>,
    pub topography_noise: Option<TopographyNoise>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            grid_x: 1.0,
            grid_y: 1.0,
            mesh_mode: MeshMode::Triangle,
            padding: Margins::new((2.0, 3.0), (2.0, 3.0), (1.0, 1.0)),
            base_inset: Margins::new((1.0, 2.0), (1.0, 2.0), (-1.0, -2.0)),
            weld_epsilon: WELD_EPSILON,
            doubles_epsilon: DOUBLES_EPSILON,
            min_volume: MIN_VOLUME,
            layer_order: ["A", "G", "S"].map(String::from).to_vec(),
            contact_surfaces: vec![
                ContactSurfaceConfig::new("G", ["S"]),
                ContactSurfaceConfig::new("A", ["S", "G"]),
            ],
            topography_noise: None,
        }
    }
}

impl ModelConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] if [`validate`](Self::validate) fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Same as [`from_json_str`](Self::from_json_str).
    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// The high-side xy inset must exceed the grid step: sampling stops
    /// short of the padded maximum by up to one step, and every surface has
    /// to reach past the base cuboid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        for (name, step) in [("grid_x", self.grid_x), ("grid_y", self.grid_y)] {
            if !(step.is_finite() && step > 0.0) {
                return invalid(format!("{name} must be positive, got {step}"));
            }
        }
        for (name, eps) in [
            ("weld_epsilon", self.weld_epsilon),
            ("doubles_epsilon", self.doubles_epsilon),
            ("min_volume", self.min_volume),
        ] {
            if !(eps.is_finite() && eps >= 0.0) {
                return invalid(format!("{name} must be non-negative, got {eps}"));
            }
        }
        if self.padding.values().iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
            return invalid(format!("padding must be non-negative, got {:?}", self.padding));
        }
        if self.base_inset.values().iter().any(|v| !v.is_finite()) {
            return invalid(format!("base_inset must be finite, got {:?}", self.base_inset));
        }
        let (ix, iy) = (self.base_inset.x, self.base_inset.y);
        if ix.0 < 0.0 || iy.0 < 0.0 || ix.1 <= self.grid_x || iy.1 <= self.grid_y {
            return invalid(format!(
                "base_inset x/y {ix:?} {iy:?} leaves the base outside the sampled surfaces"
            ));
        }
        if self.layer_order.is_empty() {
            return invalid("layer_order is empty".into());
        }
        for (k, contact) in self.contact_surfaces.iter().enumerate() {
            if contact.above.is_empty() || contact.below.is_empty() {
                return invalid(format!("contact surface {k} needs an upper unit and at least one lower unit"));
            }
        }
        if let Some(noise) = &self.topography_noise {
            if !(noise.amplitude.is_finite() && noise.amplitude >= 0.0) {
                return invalid(format!("noise amplitude must be non-negative, got {}", noise.amplitude));
            }
        }
        Ok(())
    }
}
