use foundation::bounds::Aabb3;
use foundation::math::precision::stable_total_cmp_f64;

use super::{Ray, ray_aabb_entry};
use crate::entity::EntityId;

/// Bounding volume hierarchy over per-entity boxes, used as the picking broadphase.
///
/// Items are stored in one flat array reordered during the build; leaves
/// reference contiguous ranges of it.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
    items: Vec<Item>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Item {
    pub entity: EntityId,
    pub bounds: Aabb3,
}

/// A broadphase candidate with its box entry distance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Candidate {
    pub entity: EntityId,
    pub t_enter: f64,
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Aabb3,
    kind: NodeKind,
}

#[derive(Debug, Copy, Clone)]
enum NodeKind {
    Leaf { start: usize, len: usize },
    Branch { left: usize, right: usize },
}

const LEAF_MAX: usize = 4;

impl Bvh {
    pub fn build(items: Vec<Item>) -> Self {
        let mut items: Vec<Item> = items.into_iter().filter(|i| !i.bounds.is_empty()).collect();
        let mut nodes = Vec::new();
        if !items.is_empty() {
            let len = items.len();
            build_range(&mut nodes, &mut items, 0, len);
        }
        Self { nodes, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items whose boxes the ray enters within `[0, t_max]`.
    ///
    /// Sorted by entry distance, then entity index, so a narrow phase can stop
    /// once a confirmed hit is closer than the next entry.
    pub fn query_ray(&self, ray: &Ray, t_max: f64) -> Vec<Candidate> {
        let mut out = Vec::new();
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if ray_aabb_entry(ray, &node.bounds, 0.0, t_max).is_none() {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, len } => {
                    for item in &self.items[start..start + len] {
                        if let Some(t_enter) = ray_aabb_entry(ray, &item.bounds, 0.0, t_max) {
                            out.push(Candidate {
                                entity: item.entity,
                                t_enter,
                            });
                        }
                    }
                }
                NodeKind::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        out.sort_by(|a, b| {
            stable_total_cmp_f64(a.t_enter, b.t_enter)
                .then_with(|| a.entity.index().cmp(&b.entity.index()))
        });
        out
    }
}

fn build_range(nodes: &mut Vec<Node>, items: &mut [Item], start: usize, len: usize) -> usize {
    let range = &mut items[start..start + len];
    let bounds = range
        .iter()
        .skip(1)
        .fold(range[0].bounds, |acc, item| acc.union(&item.bounds));

    let idx = nodes.len();
    if len <= LEAF_MAX {
        nodes.push(Node {
            bounds,
            kind: NodeKind::Leaf { start, len },
        });
        return idx;
    }

    let axis = longest_axis(&bounds);
    range.sort_by(|a, b| {
        stable_total_cmp_f64(mid(&a.bounds, axis), mid(&b.bounds, axis))
            .then_with(|| a.entity.index().cmp(&b.entity.index()))
    });

    nodes.push(Node {
        bounds,
        kind: NodeKind::Leaf { start, len: 0 },
    });
    let half = len / 2;
    let left = build_range(nodes, items, start, half);
    let right = build_range(nodes, items, start + half, len - half);
    nodes[idx].kind = NodeKind::Branch { left, right };
    idx
}

fn mid(b: &Aabb3, axis: usize) -> f64 {
    (b.min[axis] + b.max[axis]) * 0.5
}

/// Ties prefer X, then Y.
fn longest_axis(b: &Aabb3) -> usize {
    let e = [b.max[0] - b.min[0], b.max[1] - b.min[1], b.max[2] - b.min[2]];
    if e[0] >= e[1] && e[0] >= e[2] {
        0
    } else if e[1] >= e[2] {
        1
    } else {
        2
    }
}
