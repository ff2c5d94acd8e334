use super::{Point3, TOLERANCE};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// An inverted box that contains nothing; growing it by a point yields that point.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box containing all `points`, or `None` if there are none.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut aabb = Self::empty();
        for p in points {
            aabb.grow(p);
        }
        (!aabb.is_empty()).then_some(aabb)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn grow(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Checks if two boxes overlap, touching boxes included.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x + TOLERANCE
            && self.max.x >= other.min.x - TOLERANCE
            && self.min.y <= other.max.y + TOLERANCE
            && self.max.y >= other.min.y - TOLERANCE
            && self.min.z <= other.max.z + TOLERANCE
            && self.max.z >= other.min.z - TOLERANCE
    }

    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Index of the axis along which the box is widest.
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        let d = self.max - self.min;
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn from_points_bounds() {
        let pts = [p(1.0, -2.0, 3.0), p(-1.0, 4.0, 0.0), p(0.5, 0.0, 5.0)];
        let aabb = Aabb::from_points(&pts).unwrap();
        assert_eq!(aabb.min, p(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, p(1.0, 4.0, 5.0));
        assert_eq!(aabb.longest_axis(), 1);
        assert_eq!(aabb.center(), p(0.0, 1.0, 2.5));
    }

    #[test]
    fn no_points_no_box() {
        assert!(Aabb::from_points(&[]).is_none());
        assert!(Aabb::empty().is_empty());
    }

    #[test]
    fn overlap_and_touch() {
        let a = Aabb::from_points(&[p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)]).unwrap();
        let b = Aabb::from_points(&[p(1.0, 0.5, 0.5), p(2.0, 2.0, 2.0)]).unwrap();
        let c = Aabb::from_points(&[p(3.0, 3.0, 3.0), p(4.0, 4.0, 4.0)]).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        let u = a.union(&c);
        assert_eq!(u.min, p(0.0, 0.0, 0.0));
        assert_eq!(u.max, p(4.0, 4.0, 4.0));
    }
}
