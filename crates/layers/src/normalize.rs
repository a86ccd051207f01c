//! Fit-to-viewport scale for the map root.
//!
//! The scale factor `s` satisfies `w·s ≤ W·(1−m)` and `h·s ≤ H·(1−m)` for the
//! top-face bounds `w × h`, the viewport `W × H` (world units at the map
//! plane) and the margin `m`. Changes animate through a tween; raw geometry is
//! never touched, only the root transform.

use foundation::bounds::{Aabb2, Aabb3};
use foundation::math::Vec3;
use runtime::tween::{Easing, Tween};
use scene::components::Transform;

use crate::layer::Animated;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Uniform scale fitting `bounds` into `viewport` with a fractional `margin`.
///
/// Empty or fully degenerate bounds yield 1.0. A zero dimension is ignored
/// when the other one is non-zero.
pub fn compute_scale(bounds: &Aabb2, viewport: ViewportSize, margin: f64) -> f64 {
    if bounds.is_empty() {
        return 1.0;
    }
    let keep = 1.0 - margin.clamp(0.0, 0.999);
    let fit = |extent: f64, available: f64| {
        (extent > 0.0 && extent.is_finite() && available > 0.0).then(|| available * keep / extent)
    };
    match (
        fit(bounds.width(), viewport.width),
        fit(bounds.height(), viewport.height),
    ) {
        (Some(sx), Some(sy)) => sx.min(sy),
        (Some(s), None) | (None, Some(s)) => s,
        (None, None) => 1.0,
    }
}

/// Root transform scaling by `scale` and moving the bounds' xy center to the origin.
pub fn root_transform(bounds: &Aabb3, scale: f64) -> Transform {
    let center = if bounds.is_empty() {
        Vec3::ZERO
    } else {
        bounds.xy().center().extend(0.0)
    };
    Transform::scale_then_translate(scale, -center.scale(scale))
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FitSettings {
    pub margin: f64,
    pub duration_s: f64,
    pub easing: Easing,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            margin: 0.1,
            duration_s: 0.8,
            easing: Easing::CubicOut,
        }
    }
}

/// Animated fit of the map root.
///
/// The first fit of the normalizer's lifetime snaps to its target; every
/// later fit (rebuild on drill-down, resize) animates from the current scale.
#[derive(Debug, Clone)]
pub struct ScaleNormalizer {
    settings: FitSettings,
    bounds: Aabb3,
    tween: Tween,
    fitted: bool,
}

impl ScaleNormalizer {
    pub fn new(settings: FitSettings) -> Self {
        Self {
            settings,
            bounds: Aabb3::empty(),
            tween: Tween::settled(1.0).with_easing(settings.easing),
            fitted: false,
        }
    }

    pub fn settings(&self) -> FitSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: FitSettings) {
        self.settings = settings;
        self.tween = self.tween.with_easing(settings.easing);
    }

    /// Swaps in the bounds of a new map. The scale keeps animating from its
    /// current value on the next fit.
    pub fn reset(&mut self, bounds: Aabb3) {
        self.bounds = bounds;
    }

    /// Retargets for the current bounds and `viewport`. Returns the target scale.
    ///
    /// Only the first fit over non-empty bounds snaps.
    pub fn fit(&mut self, viewport: ViewportSize) -> f64 {
        let target = compute_scale(&self.bounds.xy(), viewport, self.settings.margin);
        if self.fitted {
            self.tween.retarget(target, self.settings.duration_s);
        } else {
            self.tween.snap(target);
            self.fitted = !self.bounds.is_empty();
        }
        target
    }

    pub fn advance(&mut self, dt_s: f64) {
        self.tween.advance(dt_s);
    }

    pub fn scale(&self) -> f64 {
        self.tween.value()
    }

    pub fn target_scale(&self) -> f64 {
        self.tween.target()
    }

    pub fn is_settled(&self) -> bool {
        self.tween.is_settled()
    }

    pub fn root_transform(&self) -> Transform {
        root_transform(&self.bounds, self.scale())
    }
}

impl Animated for ScaleNormalizer {
    fn advance(&mut self, dt_s: f64) {
        ScaleNormalizer::advance(self, dt_s);
    }
}
