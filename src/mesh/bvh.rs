use std::ops::ControlFlow;

use crate::math::Aabb;

const LEAF_SIZE: usize = 4;

#[derive(Debug, Clone)]
enum BvhNode {
    Leaf {
        aabb: Aabb,
        items: Vec<usize>,
    },
    Internal {
        aabb: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn aabb(&self) -> &Aabb {
        match self {
            Self::Leaf { aabb, .. } | Self::Internal { aabb, .. } => aabb,
        }
    }
}

/// An AABB tree over item boxes; item `i` is the box at index `i` of the build input.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Option<BvhNode>,
    boxes: Vec<Aabb>,
}

impl Bvh {
    #[must_use]
    pub fn build(boxes: Vec<Aabb>) -> Self {
        let mut items: Vec<usize> = (0..boxes.len()).collect();
        let root = (!items.is_empty()).then(|| build_node(&boxes, &mut items));
        Self { root, boxes }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Bounds of everything in the tree.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.root.as_ref().map(|r| *r.aabb())
    }

    /// Appends every item whose box overlaps `query` to `out`.
    pub fn query(&self, query: &Aabb, out: &mut Vec<usize>) {
        let Some(root) = &self.root else {
            return;
        };
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !node.aabb().overlaps(query) {
                continue;
            }
            match node {
                BvhNode::Leaf { items, .. } => {
                    out.extend(items.iter().copied().filter(|&i| self.boxes[i].overlaps(query)));
                }
                BvhNode::Internal { left, right, .. } => {
                    stack.push(right.as_ref());
                    stack.push(left.as_ref());
                }
            }
        }
    }

    /// Visits every pair `(a, b)` of items from `self` and `other` whose boxes overlap.
    ///
    /// Traversal stops as soon as `visit` breaks.
    pub fn for_each_overlap<B>(
        &self,
        other: &Self,
        mut visit: impl FnMut(usize, usize) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        let (Some(a), Some(b)) = (&self.root, &other.root) else {
            return ControlFlow::Continue(());
        };
        let mut stack = vec![(a, b)];
        while let Some((x, y)) = stack.pop() {
            if !x.aabb().overlaps(y.aabb()) {
                continue;
            }
            match (x, y) {
                (BvhNode::Leaf { items: xs, .. }, BvhNode::Leaf { items: ys, .. }) => {
                    for &i in xs {
                        for &j in ys {
                            if self.boxes[i].overlaps(&other.boxes[j]) {
                                visit(i, j)?;
                            }
                        }
                    }
                }
                (BvhNode::Leaf { .. }, BvhNode::Internal { left, right, .. }) => {
                    stack.push((x, right.as_ref()));
                    stack.push((x, left.as_ref()));
                }
                (BvhNode::Internal { left, right, .. }, _) => {
                    stack.push((right.as_ref(), y));
                    stack.push((left.as_ref(), y));
                }
            }
        }
        ControlFlow::Continue(())
    }
}

fn build_node(boxes: &[Aabb], items: &mut [usize]) -> BvhNode {
    let aabb = items
        .iter()
        .fold(Aabb::empty(), |acc, &i| acc.union(&boxes[i]));
    if items.len() <= LEAF_SIZE {
        return BvhNode::Leaf {
            aabb,
            items: items.to_vec(),
        };
    }

    let mut centers = Aabb::empty();
    for &i in items.iter() {
        centers.grow(&boxes[i].center());
    }
    let axis = centers.longest_axis();
    items.sort_by(|&a, &b| {
        boxes[a].center()[axis]
            .total_cmp(&boxes[b].center()[axis])
            .then(a.cmp(&b))
    });

    let mid = items.len() / 2;
    let (left, right) = items.split_at_mut(mid);
    BvhNode::Internal {
        aabb,
        left: Box::new(build_node(boxes, left)),
        right: Box::new(build_node(boxes, right)),
    }
}
