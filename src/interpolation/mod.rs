pub mod grid;
pub mod rbf;

pub use grid::{axis_samples, Domain, Grid2D};
pub use rbf::{Drift, RbfInterpolator};

use tracing::debug;

use crate::error::{DegenerateKind, InterpolationError};
use crate::math::Point3;

/// Fits a surface through scattered points and samples it on a grid.
#[derive(Debug, Clone)]
pub struct FitAndSample<'a> {
    points: &'a [Point3],
    domain: Option<Domain>,
    step_x: f64,
    step_y: f64,
}

impl<'a> FitAndSample<'a> {
    /// Creates a new `FitAndSample` operation with unit grid steps over the
    /// bounding box of `points`.
    #[must_use]
    pub fn new(points: &'a [Point3]) -> Self {
        Self {
            points,
            domain: None,
            step_x: 1.0,
            step_y: 1.0,
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    #[must_use]
    pub fn with_steps(mut self, step_x: f64, step_y: f64) -> Self {
        self.step_x = step_x;
        self.step_y = step_y;
        self
    }

    /// Executes the fit and samples the surface.
    ///
    /// # Errors
    ///
    /// Returns [`InterpolationError::DegenerateInput`] if the points cannot be
    /// fitted and [`InterpolationError::InvalidGrid`] for bad steps or domain.
    pub fn execute(&self) -> Result<Grid2D, InterpolationError> {
        let domain = match self.domain {
            Some(d) => d,
            None => Domain::bounding(self.points).ok_or(InterpolationError::DegenerateInput {
                kind: DegenerateKind::Empty,
            })?,
        };
        domain.validate()?;
        let xs = axis_samples(domain.xmin, domain.xmax, self.step_x)?;
        let ys = axis_samples(domain.ymin, domain.ymax, self.step_y)?;

        let rbf = RbfInterpolator::fit(self.points)?;
        debug!(
            sites = rbf.len(),
            drift = ?rbf.drift(),
            nx = xs.len(),
            ny = ys.len(),
            "sampling interpolated surface"
        );
        Ok(Grid2D::from_fn(&xs, &ys, |x, y| rbf.evaluate(x, y)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn samples_over_default_domain() {
        let pts = [p(0.0, 0.0, 1.0), p(4.0, 0.0, 2.0), p(0.0, 3.0, 1.5), p(4.0, 3.0, 2.5)];
        let grid = FitAndSample::new(&pts).execute().unwrap();
        assert_eq!(grid.shape(), (4, 3));
        assert_relative_eq!(grid.z[(0, 0)], 1.0, epsilon = 1e-6);
        assert_eq!(grid.x[(3, 0)], 3.0);
        assert_eq!(grid.y[(0, 2)], 2.0);
    }

    #[test]
    fn grid_hits_input_points() {
        let pts = [p(0.0, 0.0, 4.0), p(10.0, 0.0, 2.0), p(0.0, 10.0, 3.0), p(5.0, 5.0, 3.5)];
        let grid = FitAndSample::new(&pts)
            .with_domain(Domain::new(-5.0, 15.0, -5.0, 15.0))
            .with_steps(5.0, 5.0)
            .execute()
            .unwrap();
        assert_eq!(grid.shape(), (4, 4));
        // Node (2, 2) sits on (5, 5).
        assert_relative_eq!(grid.z[(2, 2)], 3.5, epsilon = 1e-6);
        assert_relative_eq!(grid.z[(1, 1)], 4.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_points_are_degenerate() {
        let err = FitAndSample::new(&[]).execute().unwrap_err();
        assert!(matches!(
            err,
            InterpolationError::DegenerateInput {
                kind: DegenerateKind::Empty
            }
        ));
    }

    #[test]
    fn invalid_step() {
        let pts = [p(0.0, 0.0, 1.0)];
        let err = FitAndSample::new(&pts)
            .with_domain(Domain::new(0.0, 1.0, 0.0, 1.0))
            .with_steps(0.0, 1.0)
            .execute()
            .unwrap_err();
        assert!(matches!(err, InterpolationError::InvalidGrid(_)));
    }
}
