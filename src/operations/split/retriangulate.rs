use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};
use tracing::warn;

use crate::error::SplitError;
use crate::math::triangle::triangle_normal;
use crate::math::Point3;
use crate::mesh::edge_key;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// A triangle to re-triangulate, with every point already resolved to a
/// global vertex id.
#[derive(Debug, Clone, Default)]
pub(super) struct CutTriangle {
    pub corners: [u32; 3],
    /// Points lying on edge `i`, from `corners[i]` to `corners[(i + 1) % 3]`, in any order.
    pub edge_points: [Vec<u32>; 3],
    pub interior: Vec<u32>,
    pub segments: Vec<[u32; 2]>,
}

#[derive(Debug, Clone, Default)]
pub(super) struct Retriangulation {
    pub triangles: Vec<[u32; 3]>,
    /// Inner constraint edges, as undirected keys.
    pub cut_edges: Vec<(u32, u32)>,
}

/// Re-triangulates `cut` with a constrained Delaunay triangulation in the
/// triangle's dominant projection plane.
///
/// The boundary loop (corners plus on-edge points) and the segments are
/// constraints; faces outside the loop are dropped by parity flood fill.
/// Output triangles keep the winding of the source triangle.
pub(super) fn retriangulate(
    vertices: &[Point3],
    cut: &CutTriangle,
) -> Result<Retriangulation, SplitError> {
    let [a, b, c] = cut.corners.map(|i| vertices[i as usize]);
    let normal = triangle_normal(&a, &b, &c);
    if normal.norm_squared() == 0.0 {
        warn!(corners = ?cut.corners, "degenerate triangle left uncut");
        return Ok(Retriangulation {
            triangles: vec![cut.corners],
            cut_edges: Vec::new(),
        });
    }

    let (u_axis, v_axis) = projection_axes(&normal);
    let project = |id: u32| {
        let p = vertices[id as usize];
        SpadePoint2::new(p[u_axis], p[v_axis])
    };

    let boundary = boundary_loop(vertices, cut);
    let mut cdt = Cdt::new();
    let mut handles: HashMap<u32, FixedVertexHandle> = HashMap::new();
    let mut ids: HashMap<usize, u32> = HashMap::new();
    let mut insert = |cdt: &mut Cdt, id: u32| -> Result<FixedVertexHandle, SplitError> {
        let h = cdt
            .insert(project(id))
            .map_err(|e: InsertionError| SplitError::Kernel(format!("CDT insert: {e}")))?;
        ids.entry(h.index()).or_insert(id);
        handles.insert(id, h);
        Ok(h)
    };

    let mut loop_handles = Vec::with_capacity(boundary.len());
    for &id in &boundary {
        loop_handles.push(insert(&mut cdt, id)?);
    }
    for &id in &cut.interior {
        insert(&mut cdt, id)?;
    }

    for i in 0..loop_handles.len() {
        let from = loop_handles[i];
        let to = loop_handles[(i + 1) % loop_handles.len()];
        if from != to {
            cdt.add_constraint(from, to);
        }
    }
    let boundary_edges: HashSet<(usize, usize)> = constraint_pairs(&cdt).collect();

    let mut along_boundary = Vec::new();
    for &[p, q] in &cut.segments {
        let (Some(&from), Some(&to)) = (handles.get(&p), handles.get(&q)) else {
            continue;
        };
        if from == to {
            continue;
        }
        let pair = index_key(from.index(), to.index());
        if boundary_edges.contains(&pair) {
            along_boundary.push(pair);
        } else if cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        } else {
            warn!(from = p, to = q, "intersection segment crosses an existing constraint, skipped");
        }
    }

    let interior = classify_interior_faces(&cdt, &boundary_edges);
    let mut triangles = Vec::new();
    for face in cdt.inner_faces() {
        if !interior.contains(&face.fix().index()) {
            continue;
        }
        let [i, j, k] = face.vertices().map(|v| ids[&v.fix().index()]);
        if i == j || j == k || k == i {
            continue;
        }
        let [p, q, r] = [i, j, k].map(|id| vertices[id as usize]);
        if triangle_normal(&p, &q, &r).dot(&normal) < 0.0 {
            triangles.push([i, k, j]);
        } else {
            triangles.push([i, j, k]);
        }
    }

    // Segments running along the boundary loop separate pieces as well.
    let cut_edges: Vec<(u32, u32)> = constraint_pairs(&cdt)
        .filter(|pair| !boundary_edges.contains(pair))
        .chain(along_boundary)
        .map(|(h0, h1)| edge_key(ids[&h0], ids[&h1]))
        .collect();

    Ok(Retriangulation {
        triangles,
        cut_edges,
    })
}

/// Drops the coordinate along which the normal is largest.
fn projection_axes(normal: &crate::math::Vector3) -> (usize, usize) {
    let n = normal.abs();
    if n.z >= n.x && n.z >= n.y {
        (0, 1)
    } else if n.y >= n.x {
        (2, 0)
    } else {
        (1, 2)
    }
}

/// Corners interleaved with the on-edge points sorted along each edge.
fn boundary_loop(vertices: &[Point3], cut: &CutTriangle) -> Vec<u32> {
    let mut boundary = Vec::with_capacity(3 + cut.edge_points.iter().map(Vec::len).sum::<usize>());
    for i in 0..3 {
        let start = vertices[cut.corners[i] as usize];
        let dir = vertices[cut.corners[(i + 1) % 3] as usize] - start;
        let mut on_edge: Vec<(f64, u32)> = cut.edge_points[i]
            .iter()
            .map(|&id| ((vertices[id as usize] - start).dot(&dir), id))
            .collect();
        on_edge.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
        on_edge.dedup_by_key(|x| x.1);
        boundary.push(cut.corners[i]);
        boundary.extend(on_edge.into_iter().map(|(_, id)| id));
    }
    boundary
}

fn constraint_pairs(cdt: &Cdt) -> impl Iterator<Item = (usize, usize)> + '_ {
    cdt.undirected_edges()
        .filter(|e| cdt.is_constraint_edge(e.fix()))
        .map(|e| {
            let [v0, v1] = e.vertices();
            index_key(v0.fix().index(), v1.fix().index())
        })
}

fn index_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Classifies which inner faces of the CDT are inside the boundary loop using flood-fill.
///
/// Starts from faces adjacent to the outer (infinite) face at depth 0. Each time
/// a boundary edge is crossed, depth increments; inner constraints are
/// crossed freely. Odd depth = interior.
fn classify_interior_faces(cdt: &Cdt, boundary: &HashSet<(usize, usize)>) -> HashSet<usize> {
    let is_boundary = |[v0, v1]: [usize; 2]| boundary.contains(&index_key(v0, v1));

    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() == outer_fix {
            if let Some(inner) = edge.rev().face().as_inner() {
                let idx = inner.fix().index();
                if depth_map.contains_key(&idx) {
                    continue;
                }
                let depth = u32::from(is_boundary(edge.vertices().map(|v| v.fix().index())));
                depth_map.insert(idx, depth);
                if depth % 2 == 1 {
                    interior.insert(idx);
                }
                queue.push_back((inner.fix(), depth));
            }
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            if let Some(neighbor) = edge.rev().face().as_inner() {
                let n_idx = neighbor.fix().index();
                if depth_map.contains_key(&n_idx) {
                    continue;
                }
                let new_depth =
                    depth + u32::from(is_boundary(edge.vertices().map(|v| v.fix().index())));
                depth_map.insert(n_idx, new_depth);
                if new_depth % 2 == 1 {
                    interior.insert(n_idx);
                }
                queue.push_back((neighbor.fix(), new_depth));
            }
        }
    }

    interior
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn area(vertices: &[Point3], t: &[u32; 3]) -> f64 {
        let [a, b, c] = t.map(|i| vertices[i as usize]);
        triangle_normal(&a, &b, &c).norm() / 2.0
    }

    /// Right triangle in the z = 0 plane cut by x = 1 from (1, 0) to (1, 3).
    fn vertical_cut() -> (Vec<Point3>, CutTriangle) {
        let vertices = vec![p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(0.0, 4.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 3.0, 0.0)];
        let cut = CutTriangle {
            corners: [0, 1, 2],
            edge_points: [vec![3], vec![4], vec![]],
            interior: vec![],
            segments: vec![[3, 4]],
        };
        (vertices, cut)
    }

    #[test]
    fn cut_across_triangle() {
        let (vertices, cut) = vertical_cut();
        let r = retriangulate(&vertices, &cut).unwrap();
        let total: f64 = r.triangles.iter().map(|t| area(&vertices, t)).sum();
        assert_relative_eq!(total, 8.0, epsilon = 1e-12);
        assert_eq!(r.cut_edges, vec![(3, 4)]);
        for t in &r.triangles {
            let [a, b, c] = t.map(|i| vertices[i as usize]);
            assert!(triangle_normal(&a, &b, &c).z > 0.0);
        }
        // No triangle straddles the cut.
        for t in &r.triangles {
            let left = t.iter().any(|&i| vertices[i as usize].x < 1.0);
            let right = t.iter().any(|&i| vertices[i as usize].x > 1.0);
            assert!(!(left && right));
        }
    }

    #[test]
    fn winding_follows_source() {
        let (vertices, mut cut) = vertical_cut();
        cut.corners = [0, 2, 1];
        cut.edge_points = [vec![], vec![4], vec![3]];
        let r = retriangulate(&vertices, &cut).unwrap();
        for t in &r.triangles {
            let [a, b, c] = t.map(|i| vertices[i as usize]);
            assert!(triangle_normal(&a, &b, &c).z < 0.0);
        }
    }

    #[test]
    fn segment_along_an_edge_is_a_cut_edge() {
        let (vertices, mut cut) = vertical_cut();
        // Edge 0 runs from corner 0 through point 3 to corner 1.
        cut.edge_points = [vec![3], vec![], vec![]];
        cut.segments = vec![[0, 3]];
        let r = retriangulate(&vertices, &cut).unwrap();
        assert_eq!(r.cut_edges, vec![(0, 3)]);
        let total: f64 = r.triangles.iter().map(|t| area(&vertices, t)).sum();
        assert_relative_eq!(total, 8.0, epsilon = 1e-12);
    }

    #[test]
    fn interior_polyline() {
        // Vertical triangle in the x = 2 plane with a bent cut through an interior point.
        let vertices = vec![
            p(2.0, 0.0, 0.0),
            p(2.0, 6.0, 0.0),
            p(2.0, 0.0, 6.0),
            p(2.0, 0.0, 2.0),
            p(2.0, 1.5, 2.2),
            p(2.0, 3.9, 2.1),
        ];
        let cut = CutTriangle {
            corners: [0, 1, 2],
            edge_points: [vec![], vec![5], vec![3]],
            interior: vec![4],
            segments: vec![[3, 4], [4, 5]],
        };
        let r = retriangulate(&vertices, &cut).unwrap();
        let total: f64 = r.triangles.iter().map(|t| area(&vertices, t)).sum();
        assert_relative_eq!(total, 18.0, epsilon = 1e-9);
        let mut cuts = r.cut_edges.clone();
        cuts.sort_unstable();
        assert_eq!(cuts, vec![(3, 4), (4, 5)]);
    }
}
