use crate::math::{Vec2, Vec3};

/// Axis-aligned bounding boxes.
///
/// `empty()` boxes have inverted infinite extents so that the first
/// `extend` call snaps them to the point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY; 2],
            max: [f64::NEG_INFINITY; 2],
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.min[0] <= self.max[0] && self.min[1] <= self.max[1])
    }

    /// Non-finite points are ignored.
    pub fn extend(&mut self, p: Vec2) {
        if !p.is_finite() {
            return;
        }
        self.min[0] = self.min[0].min(p.x);
        self.min[1] = self.min[1].min(p.y);
        self.max[0] = self.max[0].max(p.x);
        self.max[1] = self.max[1].max(p.y);
    }

    pub fn union(&self, other: &Self) -> Self {
        Aabb2::new(
            [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        )
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max[0] - self.min[0]
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max[1] - self.min[1]
        }
    }

    pub fn center(&self) -> Vec2 {
        if self.is_empty() {
            return Vec2::ZERO;
        }
        Vec2::new(
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        )
    }
}

impl Aabb3 {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Aabb3 { min, max }
    }

    pub fn empty() -> Self {
        Aabb3 {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut out = Self::empty();
        for p in points {
            out.extend(p);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        !(self.min[0] <= self.max[0] && self.min[1] <= self.max[1] && self.min[2] <= self.max[2])
    }

    /// Non-finite points are ignored.
    pub fn extend(&mut self, p: Vec3) {
        if !p.is_finite() {
            return;
        }
        let a = p.as_array();
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(a[axis]);
            self.max[axis] = self.max[axis].max(a[axis]);
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        Aabb3::new(
            [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        )
    }

    pub fn intersects(&self, other: &Self) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    pub fn xy(&self) -> Aabb2 {
        Aabb2::new([self.min[0], self.min[1]], [self.max[0], self.max[1]])
    }
}
