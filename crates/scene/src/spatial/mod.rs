pub mod bvh;

pub use bvh::*;

use foundation::bounds::Aabb3;
use foundation::math::Vec3;

/// Half-line `origin + t·dir`, `t ≥ 0`. `dir` need not be unit length.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir.scale(t)
    }
}

/// Slab test. Returns the entry parameter clamped to `t_min`, or `None` on a miss.
pub fn ray_aabb_entry(ray: &Ray, aabb: &Aabb3, t_min: f64, t_max: f64) -> Option<f64> {
    let o = ray.origin.as_array();
    let d = ray.dir.as_array();
    let (mut lo, mut hi) = (t_min, t_max);
    for axis in 0..3 {
        if d[axis].abs() < 1e-12 {
            if o[axis] < aabb.min[axis] || o[axis] > aabb.max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d[axis];
        let a = (aabb.min[axis] - o[axis]) * inv;
        let b = (aabb.max[axis] - o[axis]) * inv;
        lo = lo.max(a.min(b));
        hi = hi.min(a.max(b));
        if hi < lo {
            return None;
        }
    }
    Some(lo)
}
