//! Scalar tweens for animated transitions (e.g. the map scale on drill-down).

/// Easing curves mapping linear progress `t ∈ [0, 1]` to eased progress.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    CubicOut,
    QuadInOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicOut => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) * 0.5
                }
            }
        }
    }
}

/// Time-based interpolation between two values.
///
/// Retargeting mid-flight starts the new segment from the current value, so
/// consecutive retargets never jump.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tween {
    from: f64,
    to: f64,
    duration_s: f64,
    elapsed_s: f64,
    easing: Easing,
}

impl Tween {
    /// A settled tween resting at `value`.
    pub fn settled(value: f64) -> Self {
        Self {
            from: value,
            to: value,
            duration_s: 0.0,
            elapsed_s: 0.0,
            easing: Easing::default(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn retarget(&mut self, to: f64, duration_s: f64) {
        self.from = self.value();
        self.to = to;
        self.duration_s = duration_s.max(0.0);
        self.elapsed_s = 0.0;
    }

    /// Jumps straight to `value` with no animation.
    pub fn snap(&mut self, value: f64) {
        *self = Self::settled(value).with_easing(self.easing);
    }

    pub fn advance(&mut self, dt_s: f64) {
        if dt_s.is_finite() && dt_s > 0.0 {
            self.elapsed_s = (self.elapsed_s + dt_s).min(self.duration_s);
        }
    }

    pub fn value(&self) -> f64 {
        if self.is_settled() {
            return self.to;
        }
        let t = self.elapsed_s / self.duration_s;
        self.from + (self.to - self.from) * self.easing.apply(t)
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn is_settled(&self) -> bool {
        self.duration_s <= 0.0 || self.elapsed_s >= self.duration_s
    }
}
