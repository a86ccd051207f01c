use foundation::color::Color;
use foundation::math::Vec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::layer::Animated;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarSettings {
    /// Root-local center of the sweep disc.
    pub position: Vec3,
    pub radius: f64,
    pub color: Color,
    /// Radians per unit of phase.
    pub speed: f64,
}

impl Default for RadarSettings {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 120.0,
            color: Color::from_rgb8(0x38, 0xbd, 0xf8),
            speed: 1.0,
        }
    }
}

/// Radar planes driven by one shared phase.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarSweep {
    planes: Vec<RadarSettings>,
    phase: f64,
}

impl RadarSweep {
    pub fn new(planes: Vec<RadarSettings>) -> Self {
        Self { planes, phase: 0.0 }
    }

    pub fn planes(&self) -> &[RadarSettings] {
        &self.planes
    }

    pub fn set_planes(&mut self, planes: Vec<RadarSettings>) {
        self.planes = planes;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Sweep angle of plane `i` in `[0, 2π)`.
    pub fn angle(&self, i: usize) -> Option<f64> {
        self.planes.get(i).map(|p| sweep_angle(self.phase, p.speed))
    }
}

pub fn sweep_angle(phase: f64, speed: f64) -> f64 {
    let a = (phase * speed).rem_euclid(TAU);
    if a.is_finite() { a } else { 0.0 }
}

impl Animated for RadarSweep {
    fn advance(&mut self, dt_s: f64) {
        if dt_s.is_finite() && dt_s > 0.0 {
            self.phase += dt_s;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RadarSettings, RadarSweep, sweep_angle};
    use crate::layer::Animated;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn angle_wraps_into_one_turn() {
        assert!((sweep_angle(TAU + 1.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((sweep_angle(-1.0, 1.0) - (TAU - 1.0)).abs() < 1e-12);
        assert_eq!(sweep_angle(f64::INFINITY, 1.0), 0.0);
    }

    #[test]
    fn planes_share_the_phase() {
        let mut radar = RadarSweep::new(vec![
            RadarSettings::default(),
            RadarSettings {
                speed: 2.0,
                ..RadarSettings::default()
            },
        ]);
        radar.advance(PI / 2.0);
        let a0 = radar.angle(0).expect("plane 0");
        let a1 = radar.angle(1).expect("plane 1");
        assert!((a0 - PI / 2.0).abs() < 1e-12);
        assert!((a1 - PI).abs() < 1e-12);
        assert_eq!(radar.angle(2), None);
    }
}
