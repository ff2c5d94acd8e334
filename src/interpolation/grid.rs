use nalgebra::DMatrix;

use crate::error::InterpolationError;
use crate::math::Point3;

/// Rectangular sampling window `[xmin, xmax] x [ymin, ymax]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Domain {
    #[must_use]
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// The (x, y) bounding box of `points`, or `None` if there are none.
    #[must_use]
    pub fn bounding(points: &[Point3]) -> Option<Self> {
        let first = points.first()?;
        Some(points.iter().fold(
            Self::new(first.x, first.x, first.y, first.y),
            |d, p| Self::new(d.xmin.min(p.x), d.xmax.max(p.x), d.ymin.min(p.y), d.ymax.max(p.y)),
        ))
    }

    /// Grows the window by the given margins on each side.
    #[must_use]
    pub fn padded(&self, x: (f64, f64), y: (f64, f64)) -> Self {
        Self::new(self.xmin - x.0, self.xmax + x.1, self.ymin - y.0, self.ymax + y.1)
    }

    /// # Errors
    ///
    /// Returns [`InterpolationError::InvalidGrid`] for inverted or non-finite bounds.
    pub fn validate(&self) -> Result<(), InterpolationError> {
        let finite = [self.xmin, self.xmax, self.ymin, self.ymax]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.xmax < self.xmin || self.ymax < self.ymin {
            return Err(InterpolationError::InvalidGrid(format!(
                "domain [{}, {}] x [{}, {}] is not a valid window",
                self.xmin, self.xmax, self.ymin, self.ymax
            )));
        }
        Ok(())
    }
}

/// Samples of a height field on a regular grid.
///
/// All three matrices have shape `(nx, ny)`: `x[(i, j)] = x_i`,
/// `y[(i, j)] = y_j`, `z[(i, j)] = f(x_i, y_j)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D {
    pub x: DMatrix<f64>,
    pub y: DMatrix<f64>,
    pub z: DMatrix<f64>,
}

impl Grid2D {
    /// Evaluates `f` on the tensor product of the axis samples.
    pub fn from_fn(xs: &[f64], ys: &[f64], f: impl Fn(f64, f64) -> f64) -> Self {
        let (nx, ny) = (xs.len(), ys.len());
        Self {
            x: DMatrix::from_fn(nx, ny, |i, _| xs[i]),
            y: DMatrix::from_fn(nx, ny, |_, j| ys[j]),
            z: DMatrix::from_fn(nx, ny, |i, j| f(xs[i], ys[j])),
        }
    }

    /// Number of samples along x and y.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.z.shape()
    }

    #[must_use]
    pub fn node(&self, i: usize, j: usize) -> Point3 {
        Point3::new(self.x[(i, j)], self.y[(i, j)], self.z[(i, j)])
    }
}

/// Samples `min, min + step, ...` strictly below `max`; a zero-width axis gives one sample.
///
/// # Errors
///
/// Returns [`InterpolationError::InvalidGrid`] for a non-positive or
/// non-finite step or an inverted range.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn axis_samples(min: f64, max: f64, step: f64) -> Result<Vec<f64>, InterpolationError> {
    if !(step.is_finite() && step > 0.0) {
        return Err(InterpolationError::InvalidGrid(format!(
            "step {step} must be positive and finite"
        )));
    }
    if !(min.is_finite() && max.is_finite()) || max < min {
        return Err(InterpolationError::InvalidGrid(format!(
            "axis range [{min}, {max}] is inverted or not finite"
        )));
    }
    let count = (((max - min) / step).ceil() as usize).max(1);
    Ok((0..count).map(|i| min + i as f64 * step).collect())
}
