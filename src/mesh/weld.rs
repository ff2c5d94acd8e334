use std::collections::HashMap;

use crate::math::Point3;

/// Spatial-hash vertex pool that merges points closer than `epsilon`.
///
/// The first point inserted in a cluster becomes its representative, so the
/// result depends only on insertion order.
#[derive(Debug, Clone)]
pub struct VertexWelder {
    epsilon: f64,
    cells: HashMap<(i64, i64, i64), Vec<u32>>,
    points: Vec<Point3>,
}

impl VertexWelder {
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.max(f64::MIN_POSITIVE),
            cells: HashMap::new(),
            points: Vec::new(),
        }
    }

    /// Welds a whole point list, returning the representatives and the old-to-new index map.
    #[must_use]
    pub fn weld_all(points: &[Point3], epsilon: f64) -> (Vec<Point3>, Vec<u32>) {
        let mut welder = Self::new(epsilon);
        let remap = points.iter().map(|p| welder.insert(p)).collect();
        (welder.into_points(), remap)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell(&self, p: &Point3) -> (i64, i64, i64) {
        (
            (p.x / self.epsilon).floor() as i64,
            (p.y / self.epsilon).floor() as i64,
            (p.z / self.epsilon).floor() as i64,
        )
    }

    /// Returns the index of an existing point within `epsilon`, or adds `p`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn insert(&mut self, p: &Point3) -> u32 {
        let (cx, cy, cz) = self.cell(p);
        let mut best: Option<(f64, u32)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &i in bucket {
                        let d = (self.points[i as usize] - p).norm();
                        if d <= self.epsilon && best.map_or(true, |(bd, bi)| d < bd || (d == bd && i < bi)) {
                            best = Some((d, i));
                        }
                    }
                }
            }
        }
        if let Some((_, i)) = best {
            return i;
        }
        let index = self.points.len() as u32;
        self.points.push(*p);
        self.cells.entry((cx, cy, cz)).or_default().push(index);
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn into_points(self) -> Vec<Point3> {
        self.points
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
    fn merges_within_epsilon() {
        let mut w = VertexWelder::new(1e-6);
        let a = w.insert(&p(1.0, 2.0, 3.0));
        let b = w.insert(&p(1.0 + 4e-7, 2.0, 3.0 - 4e-7));
        let c = w.insert(&p(1.0 + 5e-6, 2.0, 3.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(w.len(), 2);
        assert_eq!(w.points()[0], p(1.0, 2.0, 3.0));
    }

    #[test]
    fn merges_across_cell_boundary() {
        let mut w = VertexWelder::new(1e-3);
        let a = w.insert(&p(0.000_999_9, 0.0, 0.0));
        let b = w.insert(&p(0.001_000_1, 0.0, 0.0));
        assert_eq!(a, b);
    }

    #[test]
    fn weld_all_maps_every_input() {
        let pts = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 0.0, 1e-9)];
        let (reps, remap) = VertexWelder::weld_all(&pts, 1e-6);
        assert_eq!(reps.len(), 2);
        assert_eq!(remap, vec![0, 1, 0]);
    }
}
