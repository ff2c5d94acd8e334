use std::ops::ControlFlow;

use crate::math::triangle::{intersect_triangles, IndexedTriangle};
use crate::math::Aabb;
use crate::mesh::{Bvh, Mesh};

/// Tests whether a cutting surface crosses a closed shell.
///
/// Broad phase is BVH against BVH; candidate pairs are confirmed with
/// [`intersect_triangles`], the shell triangle first. Coincidences are
/// resolved the same way the arrangement resolves them: a surface edge
/// lying in a wall counts when the surface continues into the shell, and a
/// shell touching the surface from below does not count.
pub struct ShellsIntersect<'a> {
    a: &'a Mesh,
    b: &'a Mesh,
}

impl<'a> ShellsIntersect<'a> {
    /// Creates a new `ShellsIntersect` query of the outward-wound shell `a`
    /// against the surface `b`.
    #[must_use]
    pub fn new(a: &'a Mesh, b: &'a Mesh) -> Self {
        Self { a, b }
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self) -> bool {
        let (Some(box_a), Some(box_b)) = (self.a.aabb(), self.b.aabb()) else {
            return false;
        };
        if !box_a.overlaps(&box_b) {
            return false;
        }

        let (tris_a, bvh_a) = triangle_tree(self.a);
        let (tris_b, bvh_b) = triangle_tree(self.b);
        bvh_a
            .for_each_overlap(&bvh_b, |i, j| {
                if intersect_triangles(&tris_a[i], &tris_b[j]).is_some() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .is_break()
    }
}

fn triangle_tree(mesh: &Mesh) -> (Vec<IndexedTriangle>, Bvh) {
    let tris: Vec<IndexedTriangle> = mesh
        .faces
        .iter()
        .flat_map(|f| f.triangles())
        .map(|t| IndexedTriangle::new(t, mesh.triangle_points(t)))
        .collect();
    let boxes = tris
        .iter()
        .map(|t| Aabb::from_points(&t.points).unwrap_or_else(Aabb::empty))
        .collect();
    (tris, Bvh::build(boxes))
}
