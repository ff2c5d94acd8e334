use serde::Deserialize;

use crate::error::BoreholeError;
use crate::math::Point3;

/// One logged interval: a geological unit and the depth of its base below
/// the borehole top.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub unit: String,
    pub bottom_depth: f64,
}

/// A vertical borehole log, intervals ordered from top to bottom.
///
/// Deserializes from the survey record layout
/// `{"Name", "x", "y", "OK", "Layerdata": {"Hauptgruppen": [..], "UKs": [..]}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BoreholeRecord")]
pub struct Borehole {
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Elevation of the top of the borehole ("OK").
    pub top: f64,
    pub layers: Vec<Layer>,
}

#[derive(Deserialize)]
struct BoreholeRecord {
    #[serde(rename = "Name")]
    name: String,
    x: f64,
    y: f64,
    #[serde(rename = "OK")]
    top: f64,
    #[serde(rename = "Layerdata")]
    layer_data: LayerData,
}

#[derive(Deserialize)]
struct LayerData {
    #[serde(rename = "Hauptgruppen")]
    units: Vec<String>,
    #[serde(rename = "UKs")]
    bottom_depths: Vec<f64>,
}

impl TryFrom<BoreholeRecord> for Borehole {
    type Error = BoreholeError;

    fn try_from(record: BoreholeRecord) -> Result<Self, Self::Error> {
        let LayerData {
            units,
            bottom_depths,
        } = record.layer_data;
        if units.len() != bottom_depths.len() {
            return Err(BoreholeError::LayerCountMismatch {
                name: record.name,
                units: units.len(),
                depths: bottom_depths.len(),
            });
        }
        Self::new(
            record.name,
            record.x,
            record.y,
            record.top,
            units.into_iter().zip(bottom_depths),
        )
    }
}

impl Borehole {
    /// Creates a borehole from `(unit, bottom depth)` pairs, top to bottom.
    ///
    /// # Errors
    ///
    /// Returns [`BoreholeError::NonMonotonicDepth`] if a bottom depth lies
    /// above the previous one or is not finite.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        x: f64,
        y: f64,
        top: f64,
        layers: impl IntoIterator<Item = (S, f64)>,
    ) -> Result<Self, BoreholeError> {
        let name = name.into();
        let layers: Vec<Layer> = layers
            .into_iter()
            .map(|(unit, bottom_depth)| Layer {
                unit: unit.into(),
                bottom_depth,
            })
            .collect();

        let mut previous = f64::NEG_INFINITY;
        for (index, layer) in layers.iter().enumerate() {
            if !layer.bottom_depth.is_finite() || layer.bottom_depth < previous {
                return Err(BoreholeError::NonMonotonicDepth {
                    name,
                    index,
                    depth: layer.bottom_depth,
                });
            }
            previous = layer.bottom_depth;
        }

        Ok(Self {
            name,
            x,
            y,
            top,
            layers,
        })
    }

    /// The collar point `(x, y, top)`.
    #[must_use]
    pub fn top_point(&self) -> Point3 {
        Point3::new(self.x, self.y, self.top)
    }

    /// Elevation of the base of the deepest logged interval.
    #[must_use]
    pub fn bottom_elevation(&self) -> Option<f64> {
        self.layers.last().map(|l| self.top - l.bottom_depth)
    }

    /// Index of the deepest interval of `unit`.
    #[must_use]
    pub fn last_index_of(&self, unit: &str) -> Option<usize> {
        self.layers.iter().rposition(|l| l.unit == unit)
    }
}
