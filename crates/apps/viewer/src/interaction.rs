//! Hover state machine and tooltip text.

use foundation::color::Color;
use scene::World;
use scene::regions::{RegionRecord, RegionRegistry};
use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    Hovering { adcode: i64 },
}

impl HoverState {
    pub fn adcode(self) -> Option<i64> {
        match self {
            HoverState::Idle => None,
            HoverState::Hovering { adcode } => Some(adcode),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub name: String,
    pub text: String,
    pub x_px: f64,
    pub y_px: f64,
}

/// Pointer and hover bookkeeping of one map.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    state: HoverState,
    pointer: Option<[f64; 2]>,
    tooltip: Option<Tooltip>,
}

impl Interaction {
    pub fn state(&self) -> HoverState {
        self.state
    }

    pub fn pointer(&self) -> Option<[f64; 2]> {
        self.pointer
    }

    pub fn set_pointer(&mut self, pointer: Option<[f64; 2]>) {
        self.pointer = pointer;
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    /// Moves the hover to `target`. Returns whether the hovered region changed.
    ///
    /// The previous region is restored to its latest base color before the
    /// new one is painted, so at most one region shows the hover color.
    pub fn hover(
        &mut self,
        world: &mut World,
        regions: &RegionRegistry,
        target: Option<i64>,
        hover_color: Color,
        unit: Option<&str>,
    ) -> bool {
        let target = target.filter(|a| regions.get(*a).is_some());
        let changed = self.state.adcode() != target;
        if changed {
            if let Some(prev) = self.state.adcode().and_then(|a| regions.get(a)) {
                paint(world, prev, prev.base_color);
            }
            self.state = match target.and_then(|a| regions.get(a)) {
                Some(next) => {
                    paint(world, next, hover_color);
                    HoverState::Hovering {
                        adcode: next.adcode(),
                    }
                }
                None => HoverState::Idle,
            };
        }
        self.tooltip = match (self.state.adcode().and_then(|a| regions.get(a)), self.pointer) {
            (Some(record), Some([x, y])) => Some(Tooltip {
                name: record.properties.name.clone(),
                text: tooltip_text(record, unit),
                x_px: x,
                y_px: y,
            }),
            _ => None,
        };
        changed
    }

    /// Forgets the hover without touching materials, for a disposed map.
    pub fn reset(&mut self) {
        self.state = HoverState::Idle;
        self.tooltip = None;
    }

    /// Repaints the hovered region, e.g. after the hover color changed.
    pub fn repaint(&self, world: &mut World, regions: &RegionRegistry, hover_color: Color) {
        if let Some(record) = self.state.adcode().and_then(|a| regions.get(a)) {
            paint(world, record, hover_color);
        }
    }
}

fn paint(world: &mut World, record: &RegionRecord, color: Color) {
    for entity in &record.top_faces {
        if let Some(material) = world.material_mut(*entity) {
            material.set_solid_color(color, 1.0);
        }
    }
}

fn tooltip_text(record: &RegionRecord, unit: Option<&str>) -> String {
    match record.value {
        Some(v) => format_value(v, unit),
        None => "no data".to_string(),
    }
}

/// Up to two decimals with trailing zeros trimmed, `,` thousands separators
/// and an optional unit suffix.
pub fn format_value(value: f64, unit: Option<&str>) -> String {
    if !value.is_finite() {
        return "no data".to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut out = String::new();
    if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    let digits = int_part.len();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    if let Some(unit) = unit.filter(|u| !u.is_empty()) {
        out.push(' ');
        out.push_str(unit);
    }
    out
}
