use foundation::color::Color;
use foundation::math::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::extrude::RegionLabelAnchor;
use crate::layer::Animated;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightSettings {
    pub count: usize,
    pub seed: u64,
    /// Midpoint lift as a fraction of the chord length.
    pub lift_ratio: f64,
    /// Arc-length fraction travelled per second.
    pub speed: f64,
    /// Segments of the arc-length table.
    pub samples: usize,
    pub color: Color,
}

impl Default for FlightSettings {
    fn default() -> Self {
        Self {
            count: 8,
            seed: 0x5eed,
            lift_ratio: 0.3,
            speed: 0.25,
            samples: 32,
            color: Color::from_rgb8(0xfb, 0xbf, 0x24),
        }
    }
}

/// Quadratic Bézier with an arc-length lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcCurve {
    pub start: Vec3,
    pub control: Vec3,
    pub end: Vec3,
    /// Cumulative length at `i / (len - 1)` of the curve parameter.
    lengths: Vec<f64>,
}

impl ArcCurve {
    /// Curve from `start` to `end` whose control point sits above the chord
    /// midpoint by `lift_ratio` times the chord length.
    pub fn lifted(start: Vec3, end: Vec3, lift_ratio: f64, samples: usize) -> Self {
        let chord = start.distance(end);
        let control = start.lerp(end, 0.5) + Vec3::Z.scale(chord * lift_ratio);
        let mut curve = Self {
            start,
            control,
            end,
            lengths: Vec::new(),
        };
        curve.lengths = curve.build_table(samples.max(1));
        curve
    }

    fn build_table(&self, segments: usize) -> Vec<f64> {
        let mut lengths = Vec::with_capacity(segments + 1);
        let mut total = 0.0;
        let mut prev = self.start;
        lengths.push(0.0);
        for i in 1..=segments {
            let p = self.point(i as f64 / segments as f64);
            total += prev.distance(p);
            lengths.push(total);
            prev = p;
        }
        lengths
    }

    /// Point at curve parameter `s ∈ [0, 1]`.
    pub fn point(&self, s: f64) -> Vec3 {
        let a = self.start.lerp(self.control, s);
        let b = self.control.lerp(self.end, s);
        a.lerp(b, s)
    }

    pub fn length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Curve parameter at arc-length fraction `u ∈ [0, 1]`.
    pub fn param_at(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        let total = self.length();
        let segments = self.lengths.len().saturating_sub(1);
        if !(total > 0.0) || segments == 0 {
            return u;
        }
        let target = u * total;
        let i = self
            .lengths
            .partition_point(|&l| l <= target)
            .clamp(1, segments);
        let (l0, l1) = (self.lengths[i - 1], self.lengths[i]);
        let frac = if l1 > l0 { (target - l0) / (l1 - l0) } else { 0.0 };
        ((i - 1) as f64 + frac) / segments as f64
    }

    /// Point at arc-length fraction `u`.
    pub fn point_at_arc(&self, u: f64) -> Vec3 {
        self.point(self.param_at(u))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightPath {
    pub from: i64,
    pub to: i64,
    pub curve: ArcCurve,
    /// Arc-length fraction of the traveling point, in `[0, 1)`.
    pub u: f64,
}

impl FlightPath {
    pub fn head(&self) -> Vec3 {
        self.curve.point_at_arc(self.u)
    }
}

/// Picks `count` index pairs with one end in the first half of `n` anchors
/// and the other end in the second half. Fewer than two anchors give none.
pub fn pick_pairs(n: usize, count: usize, rng: &mut SmallRng) -> Vec<(usize, usize)> {
    if n < 2 {
        return Vec::new();
    }
    let half = n / 2;
    (0..count)
        .map(|_| (rng.random_range(0..half), rng.random_range(half..n)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightPaths {
    settings: FlightSettings,
    anchors: Vec<RegionLabelAnchor>,
    paths: Vec<FlightPath>,
}

impl FlightPaths {
    pub fn new(settings: FlightSettings) -> Self {
        Self {
            settings,
            anchors: Vec::new(),
            paths: Vec::new(),
        }
    }

    /// Rebuilds the paths. The same anchors and seed give the same paths.
    pub fn populate(&mut self, anchors: &[RegionLabelAnchor]) {
        self.anchors = anchors.to_vec();
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let mut rng = SmallRng::seed_from_u64(self.settings.seed);
        let s = &self.settings;
        let anchors = &self.anchors;
        self.paths = pick_pairs(anchors.len(), s.count, &mut rng)
            .into_iter()
            .enumerate()
            .map(|(k, (i, j))| FlightPath {
                from: anchors[i].adcode,
                to: anchors[j].adcode,
                curve: ArcCurve::lifted(
                    anchors[i].position,
                    anchors[j].position,
                    s.lift_ratio,
                    s.samples,
                ),
                u: k as f64 / s.count.max(1) as f64,
            })
            .collect();
    }

    pub fn settings(&self) -> &FlightSettings {
        &self.settings
    }

    /// Speed and color apply in place; pair and curve parameters rebuild the
    /// paths over the current anchors.
    pub fn set_settings(&mut self, settings: FlightSettings) {
        let old = &self.settings;
        let relayout = old.count != settings.count
            || old.seed != settings.seed
            || old.lift_ratio != settings.lift_ratio
            || old.samples != settings.samples;
        self.settings = settings;
        if relayout {
            self.rebuild();
        }
    }

    pub fn paths(&self) -> &[FlightPath] {
        &self.paths
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
        self.paths.clear();
    }
}

impl Animated for FlightPaths {
    fn advance(&mut self, dt_s: f64) {
        if !dt_s.is_finite() || dt_s <= 0.0 {
            return;
        }
        let step = self.settings.speed * dt_s;
        for p in &mut self.paths {
            let u = (p.u + step).rem_euclid(1.0);
            p.u = if u < 1.0 { u } else { 0.0 };
        }
    }
}
