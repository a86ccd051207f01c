use foundation::bounds::Aabb3;
use foundation::math::Vec3;

use super::Transform;

/// Local-space bounds of an entity's geometry.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ComponentBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl ComponentBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let aabb = Aabb3::from_points(points.into_iter().copied());
        (!aabb.is_empty()).then(|| Self::from_aabb(&aabb))
    }

    pub fn from_aabb(aabb: &Aabb3) -> Self {
        Self {
            min: Vec3::new(aabb.min[0], aabb.min[1], aabb.min[2]),
            max: Vec3::new(aabb.max[0], aabb.max[1], aabb.max[2]),
        }
    }

    pub fn to_aabb(&self) -> Aabb3 {
        Aabb3::new(self.min.as_array(), self.max.as_array())
    }

    pub fn contains(&self, point: Vec3) -> bool {
        (0..3).all(|axis| {
            let p = point.as_array()[axis];
            p >= self.min.as_array()[axis] && p <= self.max.as_array()[axis]
        })
    }

    /// Bounds after placing the box with `t`. Negative scales swap extents.
    pub fn transformed(&self, t: &Transform) -> Self {
        let a = t.apply(self.min);
        let b = t.apply(self.max);
        Self {
            min: Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }
}
