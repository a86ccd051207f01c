use compute::analysis::Period;
use foundation::color::Color;
use foundation::math::LonLat;
use layers::extrude::ExtrudeStyle;
use layers::normalize::FitSettings;
use layers::overlays::OverlaySettings;
use layers::symbology::{ColorMode, Palette};
use render::debug::DebugToggles;
use render::lights::LightSettings;
use runtime::tween::Easing;
use serde::{Deserialize, Serialize};

use crate::navigation::LevelScales;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionEasing {
    Linear,
    #[default]
    CubicOut,
    QuadInOut,
}

impl From<TransitionEasing> for Easing {
    fn from(e: TransitionEasing) -> Self {
        match e {
            TransitionEasing::Linear => Easing::Linear,
            TransitionEasing::CubicOut => Easing::CubicOut,
            TransitionEasing::QuadInOut => Easing::QuadInOut,
        }
    }
}

/// Everything a map instance can be tuned with.
///
/// Colors, lights, debug toggles and overlay parameters are hot-swappable
/// through [`crate::MapView::set_config`]; `depth` and `with_bottom` apply
/// on the next build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub base_fill: Color,
    pub hover: Color,
    pub side_bottom: Color,
    pub side_top: Color,
    pub edge_color: Color,
    pub edge_width_px: f32,
    pub depth: f64,
    pub with_bottom: bool,

    pub palette: Palette,
    pub color_mode: ColorMode,
    pub initial_period: Period,
    /// Appended to tooltip values, e.g. `"t"` or `"%"`.
    pub value_unit: Option<String>,

    pub fit_margin: f64,
    pub transition_s: f64,
    pub easing: TransitionEasing,

    pub root_center: LonLat,
    pub level_scales: LevelScales,
    pub camera_tilt_deg: f64,
    pub max_frame_dt_s: f64,

    pub lights: LightSettings,
    pub debug: DebugToggles,
    pub overlays: OverlaySettings,
}

impl Default for MapConfig {
    fn default() -> Self {
        let style = ExtrudeStyle::default();
        let fit = FitSettings::default();
        Self {
            base_fill: style.fill,
            hover: Color::from_rgb8(0xf5, 0x9e, 0x0b),
            side_bottom: style.side_bottom,
            side_top: style.side_top,
            edge_color: style.edge_color,
            edge_width_px: style.edge_width_px,
            depth: style.depth,
            with_bottom: style.with_bottom,
            palette: Palette::default(),
            color_mode: ColorMode::default(),
            initial_period: Period::Year(2020),
            value_unit: None,
            fit_margin: fit.margin,
            transition_s: fit.duration_s,
            easing: TransitionEasing::default(),
            root_center: LonLat::new(104.0, 35.5),
            level_scales: LevelScales::default(),
            camera_tilt_deg: 30.0,
            max_frame_dt_s: 0.1,
            lights: LightSettings::default(),
            debug: DebugToggles::default(),
            overlays: OverlaySettings::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Json { reason: String },
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json { reason } => write!(f, "config JSON error: {reason}"),
            ConfigError::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl MapConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = serde_json::from_str(payload).map_err(|e| ConfigError::Json {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };
        if !(self.depth.is_finite() && self.depth > 0.0) {
            return invalid("depth", "must be a positive number");
        }
        if !(0.0..1.0).contains(&self.fit_margin) {
            return invalid("fit_margin", "must be in [0, 1)");
        }
        if !(self.transition_s.is_finite() && self.transition_s >= 0.0) {
            return invalid("transition_s", "must be a non-negative number");
        }
        if !(self.max_frame_dt_s.is_finite() && self.max_frame_dt_s > 0.0) {
            return invalid("max_frame_dt_s", "must be a positive number");
        }
        if !self.level_scales.is_valid() {
            return invalid("level_scales", "every scale must be positive");
        }
        if !self.root_center.is_finite() {
            return invalid("root_center", "must be finite");
        }
        self.validate_overlays()
    }

    fn validate_overlays(&self) -> Result<(), ConfigError> {
        let non_negative = |field: &'static str, v: f64| -> Result<(), ConfigError> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a non-negative number, got {v}"),
                })
            }
        };
        let o = &self.overlays;
        if !(o.markers.max_scale.is_finite() && o.markers.max_scale > 1.0) {
            return Err(ConfigError::Invalid {
                field: "overlays.markers.max_scale",
                reason: "must be greater than 1".to_string(),
            });
        }
        non_negative("overlays.markers.speed", o.markers.speed)?;
        non_negative("overlays.markers.radius", o.markers.radius)?;
        non_negative("overlays.flights.speed", o.flights.speed)?;
        non_negative("overlays.flights.lift_ratio", o.flights.lift_ratio)?;
        for radar in &o.radars {
            non_negative("overlays.radars.radius", radar.radius)?;
            if !(radar.speed.is_finite() && radar.position.is_finite()) {
                return Err(ConfigError::Invalid {
                    field: "overlays.radars",
                    reason: "position and speed must be finite".to_string(),
                });
            }
        }
        non_negative("overlays.models.speed", o.models.speed)?;
        non_negative("overlays.models.stagger_s", o.models.stagger_s)?;
        non_negative("overlays.models.scale", o.models.scale)?;
        Ok(())
    }

    pub fn extrude_style(&self) -> ExtrudeStyle {
        ExtrudeStyle {
            depth: self.depth,
            fill: self.base_fill,
            side_bottom: self.side_bottom,
            side_top: self.side_top,
            edge_color: self.edge_color,
            edge_width_px: self.edge_width_px,
            with_bottom: self.with_bottom,
        }
    }

    pub fn fit_settings(&self) -> FitSettings {
        FitSettings {
            margin: self.fit_margin,
            duration_s: self.transition_s,
            easing: self.easing.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MapConfig, TransitionEasing};
    use foundation::color::Color;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_take_defaults() {
        let config = MapConfig::from_json_str(r##"{"hover": "#ff0000", "easing": "linear"}"##)
            .expect("config");
        assert_eq!(config.hover, Color::from_rgb8(255, 0, 0));
        assert_eq!(config.easing, TransitionEasing::Linear);
        assert_eq!(config.depth, MapConfig::default().depth);
    }

    #[test]
    fn out_of_range_margin_is_rejected() {
        let err = MapConfig::from_json_str(r#"{"fit_margin": 1.5}"#).expect_err("invalid");
        assert!(matches!(err, ConfigError::Invalid { field: "fit_margin", .. }));
    }

    #[test]
    fn bad_color_is_a_json_error() {
        let err = MapConfig::from_json_str(r#"{"hover": "orange"}"#).expect_err("invalid");
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = MapConfig {
            value_unit: Some("t".into()),
            ..MapConfig::default()
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let back = MapConfig::from_json_str(&json).expect("parse");
        assert_eq!(back, config);
    }

    fn rejected_field(config: MapConfig) -> &'static str {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected an invalid field, got {other:?}"),
        }
    }

    #[test]
    fn overlay_parameters_are_validated() {
        let mut c = MapConfig::default();
        c.overlays.markers.speed = -1.0;
        assert_eq!(rejected_field(c), "overlays.markers.speed");

        let mut c = MapConfig::default();
        c.overlays.markers.max_scale = 1.0;
        assert_eq!(rejected_field(c), "overlays.markers.max_scale");

        let mut c = MapConfig::default();
        c.overlays.markers.radius = f64::NAN;
        assert_eq!(rejected_field(c), "overlays.markers.radius");

        let mut c = MapConfig::default();
        c.overlays.flights.speed = -0.25;
        assert_eq!(rejected_field(c), "overlays.flights.speed");

        let mut c = MapConfig::default();
        c.overlays.flights.speed = f64::INFINITY;
        assert_eq!(rejected_field(c), "overlays.flights.speed");

        let mut c = MapConfig::default();
        c.overlays.radars = vec![layers::overlays::RadarSettings {
            radius: f64::INFINITY,
            ..Default::default()
        }];
        assert_eq!(rejected_field(c), "overlays.radars.radius");

        let mut c = MapConfig::default();
        c.overlays.models.stagger_s = -2.0;
        assert_eq!(rejected_field(c), "overlays.models.stagger_s");
    }

    #[test]
    fn negative_marker_speed_in_json_is_rejected() {
        let err = MapConfig::from_json_str(r#"{"overlays": {"markers": {"speed": -1}}}"#)
            .expect_err("invalid");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "overlays.markers.speed",
                ..
            }
        ));
    }
}
