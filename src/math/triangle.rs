use super::predicates::{orient3d, Sign};
use super::{Point3, Vector3, TOLERANCE};

/// A triangle whose corners carry the vertex ids they came from.
///
/// The ids only serve to order edges canonically, so that two triangles
/// sharing an edge compute bitwise-identical crossing points on it.
#[derive(Debug, Clone, Copy)]
pub struct IndexedTriangle {
    pub ids: [u32; 3],
    pub points: [Point3; 3],
}

impl IndexedTriangle {
    #[must_use]
    pub fn new(ids: [u32; 3], points: [Point3; 3]) -> Self {
        Self { ids, points }
    }

    /// Unnormalized normal, `(b - a) x (c - a)`.
    #[must_use]
    pub fn normal(&self) -> Vector3 {
        triangle_normal(&self.points[0], &self.points[1], &self.points[2])
    }
}

/// Unnormalized normal of the triangle `a`, `b`, `c`; its length is twice the area.
#[must_use]
pub fn triangle_normal(a: &Point3, b: &Point3, c: &Point3) -> Vector3 {
    (b - a).cross(&(c - a))
}

/// Computes the segment along which two triangles cross.
///
/// Side tests use exact predicates. A corner lying exactly in the other
/// triangle's plane is resolved by a fixed symbolic perturbation: corners
/// of `t` move against the normal of `u`, corners of `u` move along the
/// normal of `t`. With `t` from an outward-wound shell and `u` from an
/// upward-facing surface, the shell sinks below the surface and the surface
/// backs out of the shell. So coplanar pairs and vertex touches yield
/// nothing, while an edge of `u` lying in the plane of `t` yields that edge,
/// clipped to `t`, when the third corner of `u` lies behind `t`.
///
/// Crossing points at corners in the other plane are those corners
/// exactly; all other points are computed in floating point.
#[must_use]
pub fn intersect_triangles(t: &IndexedTriangle, u: &IndexedTriangle) -> Option<(Point3, Point3)> {
    let t_sides = sides_of(&t.points, &u.points);
    let t_moved = perturbed(t_sides, Sign::Positive);
    if separated(&t_moved) {
        return None;
    }
    let u_sides = sides_of(&u.points, &t.points);
    let u_moved = perturbed(u_sides, Sign::Negative);
    if separated(&u_moved) {
        return None;
    }

    let t_points = plane_crossings(t, &t_sides, &t_moved, u);
    let u_points = plane_crossings(u, &u_sides, &u_moved, t);
    if t_points.len() < 2 || u_points.len() < 2 {
        return None;
    }

    let dir = t.normal().cross(&u.normal());
    if dir.norm_squared() <= TOLERANCE * TOLERANCE {
        return None;
    }

    let (t_lo, t_hi) = interval_along(&t_points, &dir);
    let (u_lo, u_hi) = interval_along(&u_points, &dir);
    let lo = if t_lo.0 >= u_lo.0 { t_lo } else { u_lo };
    let hi = if t_hi.0 <= u_hi.0 { t_hi } else { u_hi };
    if hi.0 <= lo.0 || (hi.1 - lo.1).norm() <= TOLERANCE {
        return None;
    }
    Some((lo.1, hi.1))
}

fn sides_of(points: &[Point3; 3], plane: &[Point3; 3]) -> [Sign; 3] {
    points.map(|p| orient3d(&plane[0], &plane[1], &plane[2], &p))
}

/// Puts corners lying in the plane on the `on_plane` side.
fn perturbed(sides: [Sign; 3], on_plane: Sign) -> [Sign; 3] {
    sides.map(|s| if s == Sign::Zero { on_plane } else { s })
}

/// A triangle crosses a plane only if it has corners on both sides.
fn separated(sides: &[Sign; 3]) -> bool {
    !(sides.contains(&Sign::Positive) && sides.contains(&Sign::Negative))
}

/// Points where the boundary of `tri` meets the plane of `other`.
///
/// `sides` are the exact sides of the corners, `moved` the perturbed ones.
fn plane_crossings(
    tri: &IndexedTriangle,
    sides: &[Sign; 3],
    moved: &[Sign; 3],
    other: &IndexedTriangle,
) -> Vec<Point3> {
    let mut points = Vec::with_capacity(2);
    for i in 0..3 {
        let j = (i + 1) % 3;
        if !moved[i].opposes(moved[j]) {
            continue;
        }
        points.push(if sides[i] == Sign::Zero {
            tri.points[i]
        } else if sides[j] == Sign::Zero {
            tri.points[j]
        } else {
            edge_plane_point(tri, i, j, other)
        });
    }
    points
}

fn edge_plane_point(tri: &IndexedTriangle, i: usize, j: usize, other: &IndexedTriangle) -> Point3 {
    let (i, j) = if tri.ids[i] <= tri.ids[j] { (i, j) } else { (j, i) };
    let (p, q) = (tri.points[i], tri.points[j]);
    let n = other.normal();
    let origin = other.points[0];
    let dp = n.dot(&(p - origin));
    let dq = n.dot(&(q - origin));
    let denom = dp - dq;
    let s = if denom == 0.0 {
        0.5
    } else {
        (dp / denom).clamp(0.0, 1.0)
    };
    p + (q - p) * s
}

fn interval_along(points: &[Point3], dir: &Vector3) -> ((f64, Point3), (f64, Point3)) {
    let mut lo = (f64::INFINITY, points[0]);
    let mut hi = (f64::NEG_INFINITY, points[0]);
    for p in points {
        let s = dir.dot(&p.coords);
        if s < lo.0 {
            lo = (s, *p);
        }
        if s > hi.0 {
            hi = (s, *p);
        }
    }
    (lo, hi)
}

/// Result of casting a ray against a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayHit {
    Miss,
    /// Proper crossing at ray parameter `t > 0`.
    Hit(f64),
    /// The ray starts on the triangle.
    Origin,
    /// The ray grazes an edge or vertex.
    Degenerate,
}

/// Möller–Trumbore ray/triangle test.
#[must_use]
pub fn ray_triangle(origin: &Point3, dir: &Vector3, tri: &[Point3; 3]) -> RayHit {
    let edge_tol = TOLERANCE * 100.0;
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let h = dir.cross(&e2);
    let det = e1.dot(&h);
    if det.abs() < TOLERANCE * TOLERANCE {
        return RayHit::Miss;
    }
    let inv = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(&h) * inv;
    if u < -edge_tol || u > 1.0 + edge_tol {
        return RayHit::Miss;
    }
    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv;
    if v < -edge_tol || u + v > 1.0 + edge_tol {
        return RayHit::Miss;
    }
    let t = e2.dot(&q) * inv;
    if t.abs() < edge_tol {
        return RayHit::Origin;
    }
    if t < 0.0 {
        return RayHit::Miss;
    }
    if u < edge_tol || v < edge_tol || u + v > 1.0 - edge_tol {
        return RayHit::Degenerate;
    }
    RayHit::Hit(t)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn tri(ids: [u32; 3], points: [Point3; 3]) -> IndexedTriangle {
        IndexedTriangle::new(ids, points)
    }

    #[test]
    fn crossing_triangles_give_segment() {
        let flat = tri([0, 1, 2], [p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(0.0, 4.0, 0.0)]);
        let wall = tri([3, 4, 5], [p(1.0, -1.0, -1.0), p(1.0, 5.0, -1.0), p(1.0, 1.0, 3.0)]);
        let (a, b) = intersect_triangles(&flat, &wall).unwrap();
        for q in [a, b] {
            assert_relative_eq!(q.x, 1.0, epsilon = 1e-12);
            assert_relative_eq!(q.z, 0.0, epsilon = 1e-12);
        }
        let (lo, hi) = if a.y < b.y { (a, b) } else { (b, a) };
        // Wall meets z=0 for y in [-0.5, 4]; flat triangle at x=1 spans y in [0, 3].
        assert_relative_eq!(lo.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(hi.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn disjoint_and_coplanar_pairs() {
        let a = tri([0, 1, 2], [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)]);
        let above = tri([3, 4, 5], [p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(0.0, 1.0, 2.0)]);
        let coplanar = tri([3, 4, 5], [p(0.2, 0.2, 0.0), p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0)]);
        assert!(intersect_triangles(&a, &above).is_none());
        assert!(intersect_triangles(&a, &coplanar).is_none());
    }

    #[test]
    fn vertex_touch_is_no_segment() {
        let a = tri([0, 1, 2], [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)]);
        let b = tri([3, 4, 5], [p(0.0, 0.0, 0.0), p(-1.0, 0.0, 1.0), p(0.0, -1.0, 1.0)]);
        assert!(intersect_triangles(&a, &b).is_none());
    }

    #[test]
    fn edge_resting_on_the_normal_side_is_no_segment() {
        let a = tri([0, 1, 2], [p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(0.0, 4.0, 0.0)]);
        let b = tri([3, 4, 5], [p(1.0, 1.0, 0.0), p(1.0, 3.0, 0.0), p(1.0, 2.0, 2.0)]);
        assert!(intersect_triangles(&a, &b).is_none());
    }

    #[test]
    fn edge_in_plane_with_corner_behind_is_clipped_edge() {
        let a = tri([0, 1, 2], [p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(0.0, 4.0, 0.0)]);
        // Edge (1, 0.5)-(1, 5) lies in z = 0; the third corner is below, behind `a`.
        let b = tri([3, 4, 5], [p(1.0, 0.5, 0.0), p(1.0, 5.0, 0.0), p(1.0, 2.0, -2.0)]);
        let (q0, q1) = intersect_triangles(&a, &b).unwrap();
        let (lo, hi) = if q0.y < q1.y { (q0, q1) } else { (q1, q0) };
        // The edge starts exactly at its own corner and is clipped where it leaves `a`.
        assert_eq!(lo, p(1.0, 0.5, 0.0));
        assert_relative_eq!(hi.y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(hi.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn shell_corners_in_the_plane_sink_below_it() {
        // Wall whose top edge lies in the plane of `flat`: touching from below.
        let flat = tri([0, 1, 2], [p(-1.0, -1.0, 4.0), p(5.0, -1.0, 4.0), p(-1.0, 5.0, 4.0)]);
        let wall = tri([3, 4, 5], [p(0.0, 0.0, 0.0), p(0.0, 0.0, 4.0), p(0.0, 3.0, 4.0)]);
        assert!(intersect_triangles(&wall, &flat).is_none());
        // The same wall standing on the plane counts as crossing it.
        let standing = tri([3, 4, 5], [p(0.0, 0.0, 8.0), p(0.0, 0.0, 4.0), p(0.0, 3.0, 4.0)]);
        assert!(intersect_triangles(&standing, &flat).is_some());
    }

    #[test]
    fn shared_edge_points_match_exactly() {
        // Two triangles sharing edge (1, 2) listed in opposite directions.
        let left = tri([0, 1, 2], [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.3), p(1.0, 2.0, 1.7)]);
        let right = tri([2, 1, 3], [p(1.0, 2.0, 1.7), p(2.0, 0.0, 0.3), p(3.0, 2.0, 0.9)]);
        let plane = tri(
            [10, 11, 12],
            [p(-5.0, -5.0, 1.0), p(10.0, -5.0, 1.0), p(-5.0, 10.0, 1.0)],
        );
        let (a0, a1) = intersect_triangles(&left, &plane).unwrap();
        let (b0, b1) = intersect_triangles(&right, &plane).unwrap();
        let shared = [a0, a1]
            .into_iter()
            .filter(|q| *q == b0 || *q == b1)
            .count();
        assert_eq!(shared, 1);
    }

    #[test]
    fn ray_hits_and_misses() {
        let t = [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0)];
        let up = Vector3::new(0.0, 0.0, 1.0);
        assert_eq!(ray_triangle(&p(0.5, 0.5, -1.0), &up, &t), RayHit::Hit(1.0));
        assert_eq!(ray_triangle(&p(0.5, 0.5, 1.0), &up, &t), RayHit::Miss);
        assert_eq!(ray_triangle(&p(3.0, 3.0, -1.0), &up, &t), RayHit::Miss);
        assert_eq!(ray_triangle(&p(1.0, 0.0, -1.0), &up, &t), RayHit::Degenerate);
        assert_eq!(ray_triangle(&p(0.5, 0.5, 0.0), &up, &t), RayHit::Origin);
    }
}
