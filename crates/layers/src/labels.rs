use foundation::color::Color;
use foundation::math::Vec3;
use std::collections::HashSet;

use crate::extrude::RegionLabelAnchor;
use crate::layer::{Layer, LayerId};

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font_size_px: f32,
    pub color: Color,
    pub halo_color: Color,
    pub halo_width_px: f32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size_px: 12.0,
            color: Color::WHITE,
            halo_color: Color::from_rgb8(0x10, 0x14, 0x1c),
            halo_width_px: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelsConfig {
    pub style: LabelStyle,
    pub max_labels: usize,
    pub max_text_len: usize,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            style: LabelStyle::default(),
            max_labels: 1_000,
            max_text_len: 64,
        }
    }
}

/// A region name waiting to be placed on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    pub adcode: i64,
    pub text: String,
    /// Root-local position; projected through the current root transform.
    pub position: Vec3,
    pub priority: f32,
}

/// Region name labels of the current map.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelsLayer {
    id: LayerId,
    pub config: LabelsConfig,
    anchors: Vec<LabelAnchor>,
}

impl LabelsLayer {
    pub fn new(id: u64, config: LabelsConfig) -> Self {
        Self {
            id: LayerId(id),
            config,
            anchors: Vec::new(),
        }
    }

    /// Replaces the anchors with those of a fresh build.
    ///
    /// Blank or overlong names are dropped. Earlier anchors win ties, so the
    /// build order decides which of two overlapping labels survives.
    pub fn set_anchors(&mut self, anchors: &[RegionLabelAnchor]) {
        let max_text_len = self.config.max_text_len;
        self.anchors = anchors
            .iter()
            .filter_map(|a| {
                let text = a.name.trim();
                if text.is_empty() || text.chars().count() > max_text_len {
                    return None;
                }
                Some(LabelAnchor {
                    adcode: a.adcode,
                    text: text.to_string(),
                    position: a.position,
                    priority: 1.0,
                })
            })
            .collect();
        self.anchors.truncate(self.config.max_labels);
    }

    pub fn anchors(&self) -> &[LabelAnchor] {
        &self.anchors
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
    }
}

impl Layer for LabelsLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        "labels"
    }
}

/// Maps a root-local point to screen pixels, `None` when off the view.
pub trait LabelProjector {
    fn project(&self, local: Vec3) -> Option<[f32; 2]>;
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelLayoutConfig {
    pub viewport_px: [f32; 2],
    pub cell_px: f32,
    pub padding_px: f32,
    pub max_labels: usize,
}

impl Default for LabelLayoutConfig {
    fn default() -> Self {
        Self {
            viewport_px: [1.0, 1.0],
            cell_px: 24.0,
            padding_px: 2.0,
            max_labels: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel2D {
    pub adcode: i64,
    pub text: String,
    pub screen_pos_px: [f32; 2],
    pub size_px: [f32; 2],
    pub style: LabelStyle,
}

/// Greedy screen-space placement on an occupancy grid.
///
/// Labels are visited by descending priority (stable); a label is dropped
/// when its padded box touches an occupied cell or lies fully off screen.
pub fn layout_labels_2d<P: LabelProjector>(
    labels: &[LabelAnchor],
    style: &LabelStyle,
    projector: &P,
    config: LabelLayoutConfig,
) -> Vec<PlacedLabel2D> {
    let mut order: Vec<&LabelAnchor> = labels.iter().collect();
    order.sort_by(|a, b| b.priority.total_cmp(&a.priority));

    let mut out = Vec::new();
    let mut occupied: HashSet<(i32, i32)> = HashSet::new();
    let cell_px = config.cell_px.max(1.0);

    for label in order {
        if out.len() >= config.max_labels {
            break;
        }
        let Some(screen) = projector.project(label.position) else {
            continue;
        };
        if !screen[0].is_finite() || !screen[1].is_finite() {
            continue;
        }

        let size = estimate_text_size(&label.text, style);
        let half = [
            size[0] * 0.5 + config.padding_px,
            size[1] * 0.5 + config.padding_px,
        ];
        if screen[0] + half[0] < 0.0
            || screen[1] + half[1] < 0.0
            || screen[0] - half[0] > config.viewport_px[0]
            || screen[1] - half[1] > config.viewport_px[1]
        {
            continue;
        }
        if !try_place(&mut occupied, screen, half, cell_px) {
            continue;
        }

        out.push(PlacedLabel2D {
            adcode: label.adcode,
            text: label.text.clone(),
            screen_pos_px: screen,
            size_px: size,
            style: style.clone(),
        });
    }
    out
}

fn estimate_text_size(text: &str, style: &LabelStyle) -> [f32; 2] {
    // CJK glyphs are roughly square; latin ones about 0.6 em wide.
    let width: f32 = text
        .chars()
        .map(|c| if c.is_ascii() { 0.6 } else { 1.0 })
        .sum::<f32>()
        .max(0.6);
    [width * style.font_size_px, style.font_size_px]
}

fn try_place(
    occupied: &mut HashSet<(i32, i32)>,
    screen: [f32; 2],
    half: [f32; 2],
    cell_px: f32,
) -> bool {
    let cells = |lo: f32, hi: f32| ((lo / cell_px).floor() as i32)..=((hi / cell_px).floor() as i32);
    let xs = cells(screen[0] - half[0], screen[0] + half[0]);
    let ys = cells(screen[1] - half[1], screen[1] + half[1]);

    for cy in ys.clone() {
        for cx in xs.clone() {
            if occupied.contains(&(cx, cy)) {
                return false;
            }
        }
    }
    for cy in ys {
        for cx in xs.clone() {
            occupied.insert((cx, cy));
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat;

    impl LabelProjector for Flat {
        fn project(&self, local: Vec3) -> Option<[f32; 2]> {
            (local.z >= 0.0).then_some([local.x as f32, local.y as f32])
        }
    }

    fn anchor(adcode: i64, name: &str, x: f64, y: f64) -> RegionLabelAnchor {
        RegionLabelAnchor {
            adcode,
            name: name.to_string(),
            position: Vec3::new(x, y, 1.0),
        }
    }

    fn layout(layer: &LabelsLayer) -> Vec<PlacedLabel2D> {
        layout_labels_2d(
            layer.anchors(),
            &layer.config.style,
            &Flat,
            LabelLayoutConfig {
                viewport_px: [200.0, 200.0],
                ..LabelLayoutConfig::default()
            },
        )
    }

    #[test]
    fn blank_names_are_not_labelled() {
        let mut layer = LabelsLayer::new(1, LabelsConfig::default());
        layer.set_anchors(&[anchor(1, "  ", 10.0, 10.0), anchor(2, " Beta ", 50.0, 50.0)]);
        assert_eq!(layer.anchors().len(), 1);
        assert_eq!(layer.anchors()[0].text, "Beta");
    }

    #[test]
    fn overlapping_labels_keep_the_first() {
        let mut layer = LabelsLayer::new(1, LabelsConfig::default());
        layer.set_anchors(&[
            anchor(1, "Alpha", 100.0, 100.0),
            anchor(2, "Beta", 102.0, 101.0),
            anchor(3, "Gamma", 20.0, 20.0),
        ]);
        let placed: Vec<i64> = layout(&layer).iter().map(|p| p.adcode).collect();
        assert_eq!(placed, vec![1, 3]);
    }

    #[test]
    fn off_screen_labels_are_dropped() {
        let mut layer = LabelsLayer::new(1, LabelsConfig::default());
        layer.set_anchors(&[anchor(1, "Far", 5_000.0, 10.0), anchor(2, "Near", 60.0, 60.0)]);
        let placed = layout(&layer);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].text, "Near");
    }

    #[test]
    fn wide_glyphs_take_more_room() {
        let style = LabelStyle::default();
        let latin = estimate_text_size("ab", &style);
        let cjk = estimate_text_size("北京", &style);
        assert!(cjk[0] > latin[0]);
    }
}
