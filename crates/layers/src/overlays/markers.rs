use foundation::color::Color;
use foundation::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::extrude::RegionLabelAnchor;
use crate::layer::Animated;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSettings {
    pub enabled: bool,
    /// Scale at which a pulse restarts from 1.
    pub max_scale: f64,
    /// Scale units per second.
    pub speed: f64,
    /// Ring radius at scale 1, in root-local units.
    pub radius: f64,
    pub color: Color,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_scale: 2.0,
            speed: 1.0,
            radius: 1.5,
            color: Color::from_rgb8(0x5f, 0xd3, 0xf3),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub adcode: i64,
    pub position: Vec3,
    pub scale: f64,
}

/// Opacity of a pulse: 1 at scale 1, fading to 0 at `max_scale`.
pub fn pulse_opacity(scale: f64, max_scale: f64) -> f64 {
    if max_scale <= 1.0 {
        return 1.0;
    }
    ((max_scale - scale) / (max_scale - 1.0)).clamp(0.0, 1.0)
}

/// One pulsing ring per label anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct PulsingMarkers {
    settings: MarkerSettings,
    markers: Vec<Marker>,
}

impl PulsingMarkers {
    pub fn new(settings: MarkerSettings) -> Self {
        Self {
            settings,
            markers: Vec::new(),
        }
    }

    pub fn populate(&mut self, anchors: &[RegionLabelAnchor]) {
        self.markers = anchors
            .iter()
            .map(|a| Marker {
                adcode: a.adcode,
                position: a.position,
                scale: 1.0,
            })
            .collect();
    }

    pub fn settings(&self) -> &MarkerSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: MarkerSettings) {
        self.settings = settings;
        let max = self.settings.max_scale;
        for m in &mut self.markers {
            if m.scale >= max {
                m.scale = 1.0;
            }
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn opacity(&self, marker: &Marker) -> f64 {
        pulse_opacity(marker.scale, self.settings.max_scale)
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }
}

impl Animated for PulsingMarkers {
    fn advance(&mut self, dt_s: f64) {
        if !dt_s.is_finite() || dt_s <= 0.0 {
            return;
        }
        let step = self.settings.speed * dt_s;
        let max = self.settings.max_scale;
        for m in &mut self.markers {
            m.scale += step;
            if m.scale >= max {
                m.scale = 1.0;
            }
        }
    }
}
