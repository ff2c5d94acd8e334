use robust::{Coord, Coord3D};

use super::{Point2, Point3};

/// Sign of an orientation determinant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

impl Sign {
    fn of(value: f64) -> Self {
        if value > 0.0 {
            Self::Positive
        } else if value < 0.0 {
            Self::Negative
        } else {
            Self::Zero
        }
    }

    /// Returns `true` if `self` and `other` are non-zero and differ.
    #[must_use]
    pub fn opposes(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Positive, Self::Negative) | (Self::Negative, Self::Positive)
        )
    }
}

fn coord3(p: &Point3) -> Coord3D<f64> {
    Coord3D {
        x: p.x,
        y: p.y,
        z: p.z,
    }
}

fn coord2(p: &Point2) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

/// Side of `d` relative to the plane through `a`, `b`, `c`.
///
/// `Positive` when `d` lies below the plane as seen from the side where
/// `a`, `b`, `c` appear counter-clockwise, matching Shewchuk's convention.
#[must_use]
pub fn orient3d(a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> Sign {
    Sign::of(robust::orient3d(coord3(a), coord3(b), coord3(c), coord3(d)))
}

/// Orientation of the triangle `a`, `b`, `c` in the plane.
///
/// `Positive` for counter-clockwise, `Zero` for collinear points.
#[must_use]
pub fn orient2d(a: &Point2, b: &Point2, c: &Point2) -> Sign {
    Sign::of(robust::orient2d(coord2(a), coord2(b), coord2(c)))
}

/// Returns `true` if every point lies on one line (or fewer than three distinct points exist).
#[must_use]
pub fn all_collinear(points: &[Point2]) -> bool {
    let Some(first) = points.first() else {
        return true;
    };
    let Some(second) = points.iter().find(|p| *p != first) else {
        return true;
    };
    points
        .iter()
        .all(|p| orient2d(first, second, p) == Sign::Zero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn orient3d_sides() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        let above = orient3d(&a, &b, &c, &p(0.2, 0.2, 1.0));
        let below = orient3d(&a, &b, &c, &p(0.2, 0.2, -1.0));
        assert_ne!(above, Sign::Zero);
        assert!(above.opposes(below));
        assert_eq!(orient3d(&a, &b, &c, &p(5.0, -3.0, 0.0)), Sign::Zero);
    }

    #[test]
    fn orient2d_ccw() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert_eq!(orient2d(&a, &b, &Point2::new(0.0, 1.0)), Sign::Positive);
        assert_eq!(orient2d(&a, &b, &Point2::new(0.0, -1.0)), Sign::Negative);
        assert_eq!(orient2d(&a, &b, &Point2::new(7.0, 0.0)), Sign::Zero);
    }

    #[test]
    fn collinear_detection() {
        let line: Vec<Point2> = (0..5).map(|i| Point2::new(f64::from(i), 2.0 * f64::from(i))).collect();
        assert!(all_collinear(&line));
        assert!(all_collinear(&[Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)]));
        assert!(!all_collinear(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ]));
    }

    #[test]
    fn zero_never_opposes() {
        assert!(!Sign::Zero.opposes(Sign::Positive));
        assert!(!Sign::Positive.opposes(Sign::Positive));
    }
}
