use foundation::color::Color;
use foundation::math::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f32,
    },
    Directional {
        color: Color,
        intensity: f32,
        /// Unit vector the light travels along.
        direction: Vec3,
    },
    Point {
        color: Color,
        intensity: f32,
        position: Vec3,
        range: f32,
    },
}

impl Light {
    pub fn intensity(&self) -> f32 {
        match *self {
            Light::Ambient { intensity, .. }
            | Light::Directional { intensity, .. }
            | Light::Point { intensity, .. } => intensity,
        }
    }

    pub fn position(&self) -> Option<Vec3> {
        match *self {
            Light::Point { position, .. } => Some(position),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLightSettings {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub range: f32,
}

impl Default for PointLightSettings {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::new(0.0, 0.0, 400.0),
            range: 2_000.0,
        }
    }
}

/// Scene lighting. `intensity` scales every light and can change per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub intensity: f32,
    pub ambient_color: Color,
    pub ambient: f32,
    pub directional_color: Color,
    pub directional: f32,
    pub direction: Vec3,
    pub points: Vec<PointLightSettings>,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            ambient_color: Color::WHITE,
            ambient: 0.6,
            directional_color: Color::WHITE,
            directional: 0.8,
            direction: Vec3::new(-0.3, 0.5, -1.0),
            points: vec![PointLightSettings::default()],
        }
    }
}

impl LightSettings {
    pub fn lights(&self) -> Vec<Light> {
        let k = self.intensity.max(0.0);
        let mut out = vec![
            Light::Ambient {
                color: self.ambient_color,
                intensity: self.ambient * k,
            },
            Light::Directional {
                color: self.directional_color,
                intensity: self.directional * k,
                direction: self.direction.normalized().unwrap_or(Vec3::new(0.0, 0.0, -1.0)),
            },
        ];
        out.extend(self.points.iter().map(|p| Light::Point {
            color: p.color,
            intensity: p.intensity * k,
            position: p.position,
            range: p.range,
        }));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{Light, LightSettings};
    use foundation::math::Vec3;

    #[test]
    fn master_intensity_scales_every_light() {
        let settings = LightSettings {
            intensity: 0.5,
            ..LightSettings::default()
        };
        let lights = settings.lights();
        assert_eq!(lights.len(), 3);
        assert_eq!(lights[0].intensity(), 0.3);
        assert_eq!(lights[1].intensity(), 0.4);
        assert_eq!(lights[2].intensity(), 0.5);
    }

    #[test]
    fn zero_direction_falls_back_to_straight_down() {
        let settings = LightSettings {
            direction: Vec3::ZERO,
            points: Vec::new(),
            ..LightSettings::default()
        };
        let lights = settings.lights();
        assert!(matches!(
            lights[1],
            Light::Directional { direction, .. } if direction == Vec3::new(0.0, 0.0, -1.0)
        ));
    }
}
