//! Line helpers for inspecting the camera and lights.

use foundation::color::Color;
use foundation::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::PerspectiveCamera;
use crate::lights::Light;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugToggles {
    pub frustum: bool,
    pub axes: bool,
    pub lights: bool,
}

impl DebugToggles {
    pub fn any(&self) -> bool {
        self.frustum || self.axes || self.lights
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebugLines {
    pub segments: Vec<[Vec3; 2]>,
    pub color: Color,
}

pub fn frustum_lines(camera: &PerspectiveCamera) -> DebugLines {
    let c = camera.frustum_corners();
    let mut segments = Vec::with_capacity(12);
    for i in 0..4 {
        let j = (i + 1) % 4;
        segments.push([c[i], c[j]]);
        segments.push([c[i + 4], c[j + 4]]);
        segments.push([c[i], c[i + 4]]);
    }
    DebugLines {
        segments,
        color: Color::from_rgb8(0xff, 0xd1, 0x66),
    }
}

/// X, Y and Z axes from the origin, each `length` long.
pub fn axes_lines(length: f64) -> [DebugLines; 3] {
    let axis = |dir: Vec3, color: Color| DebugLines {
        segments: vec![[Vec3::ZERO, dir.scale(length)]],
        color,
    };
    [
        axis(Vec3::new(1.0, 0.0, 0.0), Color::from_rgb8(0xef, 0x44, 0x44)),
        axis(Vec3::new(0.0, 1.0, 0.0), Color::from_rgb8(0x22, 0xc5, 0x5e)),
        axis(Vec3::new(0.0, 0.0, 1.0), Color::from_rgb8(0x3b, 0x82, 0xf6)),
    ]
}

/// A small cross at every positioned light.
pub fn light_markers(lights: &[Light], size: f64) -> DebugLines {
    let mut segments = Vec::new();
    for p in lights.iter().filter_map(Light::position) {
        for d in [
            Vec3::new(size, 0.0, 0.0),
            Vec3::new(0.0, size, 0.0),
            Vec3::new(0.0, 0.0, size),
        ] {
            segments.push([p - d, p + d]);
        }
    }
    DebugLines {
        segments,
        color: Color::WHITE,
    }
}

#[cfg(test)]
mod tests {
    use super::{axes_lines, frustum_lines, light_markers};
    use crate::camera::PerspectiveCamera;
    use crate::lights::LightSettings;

    #[test]
    fn frustum_has_twelve_edges() {
        let cam = PerspectiveCamera::new(320.0, 240.0, 0.2);
        assert_eq!(frustum_lines(&cam).segments.len(), 12);
    }

    #[test]
    fn only_point_lights_get_markers() {
        let lights = LightSettings::default().lights();
        assert_eq!(light_markers(&lights, 5.0).segments.len(), 3);
        assert_eq!(axes_lines(10.0)[2].segments[0][1].z, 10.0);
    }
}
