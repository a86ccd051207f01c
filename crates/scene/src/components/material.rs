use foundation::color::Color;

/// Surface appearance of an entity.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Material {
    /// Flat color. Top faces use this and are recolored by the metric pass.
    Solid { color: Color, opacity: f32 },
    /// Vertical gradient from `bottom` at z=0 to `top` at the extrusion depth.
    VerticalGradient {
        bottom: Color,
        top: Color,
        opacity: f32,
    },
    /// Screen-space line.
    Line { color: Color, width_px: f32 },
}

impl Material {
    pub fn solid(color: Color) -> Self {
        Material::Solid {
            color,
            opacity: 1.0,
        }
    }

    /// The primary color of the material (the top color for gradients).
    pub fn color(&self) -> Color {
        match *self {
            Material::Solid { color, .. } | Material::Line { color, .. } => color,
            Material::VerticalGradient { top, .. } => top,
        }
    }

    /// Replaces the color of a solid material. Other materials are left alone.
    pub fn set_solid_color(&mut self, new_color: Color, new_opacity: f32) -> bool {
        match self {
            Material::Solid { color, opacity } => {
                *color = new_color;
                *opacity = new_opacity;
                true
            }
            _ => false,
        }
    }
}
