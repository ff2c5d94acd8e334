use nalgebra::{DMatrix, DVector};

use crate::error::{DegenerateKind, InterpolationError};
use crate::math::predicates::all_collinear;
use crate::math::{Point2, Point3};

/// Points closer than this in (x, y) are the same data site.
const COINCIDENT: f64 = 1e-9;

/// Polynomial trend appended to the radial part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drift {
    /// A single constant term.
    Constant,
    /// Terms `1, x, y`, the minimum that makes the cubic kernel well-posed.
    Linear,
}

impl Drift {
    fn terms(self) -> usize {
        match self {
            Self::Constant => 1,
            Self::Linear => 3,
        }
    }
}

/// A fitted interpolant `z = f(x, y)` with kernel `phi(r) = r^3`.
///
/// Fitting uses every point (no neighbourhood restriction) and no
/// smoothing, so `evaluate` reproduces the input elevations.
#[derive(Debug, Clone)]
pub struct RbfInterpolator {
    centers: Vec<Point2>,
    weights: DVector<f64>,
    coefficients: DVector<f64>,
    drift: Drift,
    shift: Point2,
    scale: f64,
}

fn cubic(r: f64) -> f64 {
    r * r * r
}

impl RbfInterpolator {
    /// Fits the interpolant through `points`.
    ///
    /// # Errors
    ///
    /// Returns [`InterpolationError::DegenerateInput`] for an empty input, for
    /// two points at the same (x, y) with different elevations, or when the
    /// linear system is singular.
    pub fn fit(points: &[Point3]) -> Result<Self, InterpolationError> {
        let sites = deduplicate(points)?;
        if sites.is_empty() {
            return Err(InterpolationError::DegenerateInput {
                kind: DegenerateKind::Empty,
            });
        }

        let centers: Vec<Point2> = sites.iter().map(|p| Point2::new(p.x, p.y)).collect();
        let (shift, scale) = normalization(&centers);
        let drift = if centers.len() >= 3 && !all_collinear(&centers) {
            Drift::Linear
        } else {
            Drift::Constant
        };

        let n = centers.len();
        let m = drift.terms();
        let mut a = DMatrix::<f64>::zeros(n + m, n + m);
        let mut b = DVector::<f64>::zeros(n + m);
        for i in 0..n {
            for j in 0..n {
                a[(i, j)] = cubic((centers[i] - centers[j]).norm());
            }
            let basis = drift_basis(drift, &centers[i], &shift, scale);
            for (k, value) in basis.iter().take(m).enumerate() {
                a[(i, n + k)] = *value;
                a[(n + k, i)] = *value;
            }
            b[i] = sites[i].z;
        }

        let solution = a
            .lu()
            .solve(&b)
            .filter(|s| s.iter().all(|v| v.is_finite()))
            .ok_or(InterpolationError::DegenerateInput {
                kind: DegenerateKind::Singular,
            })?;

        Ok(Self {
            weights: solution.rows(0, n).into_owned(),
            coefficients: solution.rows(n, m).into_owned(),
            centers,
            drift,
            shift,
            scale,
        })
    }

    /// Evaluates the interpolant at `(x, y)`.
    #[must_use]
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let q = Point2::new(x, y);
        let radial: f64 = self
            .centers
            .iter()
            .zip(self.weights.iter())
            .map(|(c, w)| w * cubic((q - c).norm()))
            .sum();
        let basis = drift_basis(self.drift, &q, &self.shift, self.scale);
        let trend: f64 = self
            .coefficients
            .iter()
            .zip(basis.iter())
            .map(|(c, t)| c * t)
            .sum();
        radial + trend
    }

    #[must_use]
    pub fn drift(&self) -> Drift {
        self.drift
    }

    /// Number of distinct data sites after de-duplication.
    #[must_use]
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}

fn drift_basis(drift: Drift, p: &Point2, shift: &Point2, scale: f64) -> [f64; 3] {
    match drift {
        Drift::Constant => [1.0, 0.0, 0.0],
        Drift::Linear => [1.0, (p.x - shift.x) / scale, (p.y - shift.y) / scale],
    }
}

/// Centre of the bounding box and its largest half-extent.
fn normalization(centers: &[Point2]) -> (Point2, f64) {
    let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for c in centers {
        min = min.inf(c);
        max = max.sup(c);
    }
    let shift = nalgebra::center(&min, &max);
    let half = (max - min) / 2.0;
    let scale = half.x.max(half.y);
    (shift, if scale > 0.0 { scale } else { 1.0 })
}

fn deduplicate(points: &[Point3]) -> Result<Vec<Point3>, InterpolationError> {
    let mut sites: Vec<Point3> = Vec::with_capacity(points.len());
    for p in points {
        let twin = sites
            .iter()
            .find(|s| (s.x - p.x).hypot(s.y - p.y) <= COINCIDENT);
        match twin {
            Some(s) if (s.z - p.z).abs() <= COINCIDENT => {}
            Some(_) => {
                return Err(InterpolationError::DegenerateInput {
                    kind: DegenerateKind::Contradictory,
                })
            }
            None => sites.push(*p),
        }
    }
    Ok(sites)
}
