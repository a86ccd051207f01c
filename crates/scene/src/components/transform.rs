use foundation::math::Vec3;

/// Affine placement: per-axis scale followed by a translation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            scale: Vec3::ONE,
        }
    }

    /// Uniform scale about the origin, then a translation.
    pub fn scale_then_translate(scale: f64, position: Vec3) -> Self {
        Self {
            position,
            scale: Vec3::splat(scale),
        }
    }

    pub fn apply(&self, p: Vec3) -> Vec3 {
        p.mul_elem(self.scale) + self.position
    }

    /// Maps a world-space point back into local space.
    ///
    /// Returns `None` when any scale axis is zero or non-finite.
    pub fn inverse_apply(&self, p: Vec3) -> Option<Vec3> {
        let inv = self.inverse_scale()?;
        Some((p - self.position).mul_elem(inv))
    }

    /// Maps a world-space direction into local space without renormalizing,
    /// so ray parameters are shared between both spaces.
    pub fn inverse_apply_dir(&self, d: Vec3) -> Option<Vec3> {
        Some(d.mul_elem(self.inverse_scale()?))
    }

    /// `self ∘ inner`: applies `inner` first.
    pub fn compose(&self, inner: &Transform) -> Transform {
        Transform {
            position: self.apply(inner.position),
            scale: self.scale.mul_elem(inner.scale),
        }
    }

    fn inverse_scale(&self) -> Option<Vec3> {
        let s = self.scale;
        if [s.x, s.y, s.z].iter().any(|v| *v == 0.0 || !v.is_finite()) {
            return None;
        }
        Some(Vec3::new(1.0 / s.x, 1.0 / s.y, 1.0 / s.z))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
