//! Metric-to-color mapping and the recolor pass.

use compute::analysis::{Period, TemporalAnalysis, ValueRange};
use foundation::color::{Color, Hsl};
use formats::time_series::MetricSeries;
use scene::World;
use scene::regions::RegionRegistry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Quartile buckets over a fixed four-step blue palette.
    Discrete,
    /// Hue sweep from blue (min) to red (max).
    #[default]
    Continuous,
}

/// Colors used by the metric mapping.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub no_data: Color,
    /// Lightest to most saturated.
    pub buckets: [Color; 4],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            no_data: Color::from_rgb8(0x2a, 0x2f, 0x3a),
            buckets: [
                Color::from_rgb8(0xc6, 0xdb, 0xef),
                Color::from_rgb8(0x6b, 0xae, 0xd6),
                Color::from_rgb8(0x21, 0x71, 0xb5),
                Color::from_rgb8(0x08, 0x30, 0x6b),
            ],
        }
    }
}

/// Hue `240·(1−t)`, saturation `0.70 + 0.20·t`, lightness `0.45 + 0.10·t`.
pub fn continuous_color(t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    Color::from_hsl(Hsl {
        h: 240.0 * (1.0 - t),
        s: 0.70 + 0.20 * t,
        l: 0.45 + 0.10 * t,
    })
}

/// Quartile index of `t`: `[0, .25) → 0`, …, `[.75, 1] → 3`.
pub fn discrete_bucket(t: f64) -> usize {
    ((t.clamp(0.0, 1.0) * 4.0).floor() as usize).min(3)
}

/// Color for one region. Missing values, non-finite values and an empty
/// range all give the no-data color.
pub fn color_for(
    value: Option<f64>,
    range: Option<ValueRange>,
    mode: ColorMode,
    palette: &Palette,
) -> Color {
    let (Some(v), Some(range)) = (value.filter(|v| v.is_finite()), range) else {
        return palette.no_data;
    };
    let t = range.normalize(v);
    match mode {
        ColorMode::Continuous => continuous_color(t),
        ColorMode::Discrete => palette.buckets[discrete_bucket(t)],
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct RecolorReport {
    pub with_data: usize,
    pub no_data: usize,
    pub range: Option<ValueRange>,
}

/// The metric selection a recolor pass applies.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Selection {
    pub period: Period,
    pub mode: ColorMode,
}

/// Recolors every region's top faces for `selection` in one pass.
///
/// The range is taken over regions with a value for the period. The hovered
/// region (if any) only gets its stored base color updated so its displayed
/// hover color stays until unhover.
pub fn recolor(
    world: &mut World,
    regions: &mut RegionRegistry,
    series: &MetricSeries,
    selection: Selection,
    palette: &Palette,
    hovered: Option<i64>,
) -> RecolorReport {
    for record in regions.iter_mut() {
        record.value = TemporalAnalysis::value(series, record.adcode(), selection.period);
    }
    let range = ValueRange::from_values(regions.iter().filter_map(|r| r.value));

    let mut report = RecolorReport {
        range,
        ..RecolorReport::default()
    };
    for record in regions.iter_mut() {
        let color = color_for(record.value, range, selection.mode, palette);
        record.base_color = color;
        if record.value.is_some() {
            report.with_data += 1;
        } else {
            report.no_data += 1;
        }
        if hovered == Some(record.adcode()) {
            continue;
        }
        for entity in &record.top_faces {
            if let Some(material) = world.material_mut(*entity) {
                material.set_solid_color(color, 1.0);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::{
        ColorMode, Palette, Selection, color_for, continuous_color, discrete_bucket, recolor,
    };
    use compute::analysis::{Period, ValueRange};
    use formats::time_series::{MetricSeries, YearSeries};
    use foundation::color::Color;
    use foundation::math::Vec3;
    use proptest::prelude::*;
    use scene::World;
    use scene::components::{GeometryRole, Material, RegionProperties};
    use scene::regions::RegionRegistry;

    #[test]
    fn continuous_endpoints_are_blue_and_red() {
        assert!((continuous_color(0.0).to_hsl().h - 240.0).abs() < 0.5);
        let red = continuous_color(1.0).to_hsl().h;
        assert!(red < 0.5 || red > 359.5, "hue {red}");
    }

    #[test]
    fn buckets_are_quartiles() {
        assert_eq!(discrete_bucket(0.0), 0);
        assert_eq!(discrete_bucket(0.249), 0);
        assert_eq!(discrete_bucket(0.25), 1);
        assert_eq!(discrete_bucket(0.74), 2);
        assert_eq!(discrete_bucket(1.0), 3);
    }

    #[test]
    fn missing_values_use_no_data() {
        let p = Palette::default();
        let r = ValueRange::from_values([0.0, 1.0]);
        assert_eq!(color_for(None, r, ColorMode::Continuous, &p), p.no_data);
        assert_eq!(color_for(Some(f64::NAN), r, ColorMode::Discrete, &p), p.no_data);
        assert_eq!(color_for(Some(1.0), None, ColorMode::Discrete, &p), p.no_data);
    }

    fn two_regions() -> (World, RegionRegistry, MetricSeries) {
        let mut world = World::new();
        let mut regions = RegionRegistry::new();
        let mut series = MetricSeries::new();
        for (adcode, avg) in [(1, 100.0), (2, 300.0)] {
            regions.upsert(RegionProperties::new(adcode, "r"), Vec3::ZERO, Color::BLACK);
            let top = world.spawn();
            world.set_material(top, Material::solid(Color::BLACK));
            regions.attach(adcode, top, GeometryRole::TopFace);
            series.set_year(
                adcode,
                2020,
                YearSeries {
                    average: Some(avg),
                    ..YearSeries::default()
                },
            );
        }
        (world, regions, series)
    }

    #[test]
    fn discrete_pass_puts_extremes_in_outer_buckets() {
        let (mut world, mut regions, series) = two_regions();
        let palette = Palette::default();
        let selection = Selection {
            period: Period::Year(2020),
            mode: ColorMode::Discrete,
        };
        let report = recolor(&mut world, &mut regions, &series, selection, &palette, None);
        assert_eq!(report.with_data, 2);

        let a = regions.get(1).expect("a");
        let b = regions.get(2).expect("b");
        assert_eq!(a.base_color, palette.buckets[0]);
        assert_eq!(b.base_color, palette.buckets[3]);
        let shown = world.material(b.top_faces[0]).map(Material::color);
        assert_eq!(shown, Some(palette.buckets[3]));
    }

    #[test]
    fn empty_period_is_all_no_data() {
        let (mut world, mut regions, series) = two_regions();
        let palette = Palette::default();
        let selection = Selection {
            period: Period::Year(1999),
            mode: ColorMode::Continuous,
        };
        let report = recolor(&mut world, &mut regions, &series, selection, &palette, None);
        assert_eq!(report.range, None);
        assert!(regions.iter().all(|r| r.base_color == palette.no_data));
    }

    #[test]
    fn hovered_region_keeps_displayed_color() {
        let (mut world, mut regions, series) = two_regions();
        let hover = Color::WHITE;
        let top = regions.get(2).expect("b").top_faces[0];
        world.material_mut(top).expect("material").set_solid_color(hover, 1.0);

        let selection = Selection {
            period: Period::Year(2020),
            mode: ColorMode::Discrete,
        };
        let palette = Palette::default();
        recolor(&mut world, &mut regions, &series, selection, &palette, Some(2));
        assert_eq!(world.material(top).map(Material::color), Some(hover));
        assert_eq!(regions.get(2).map(|r| r.base_color), Some(palette.buckets[3]));
    }

    proptest! {
        #[test]
        fn continuous_hue_does_not_increase(a in 0.0f64..1.0, b in 0.0f64..1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let h_lo = continuous_color(lo).to_hsl().h;
            let h_hi = continuous_color(hi).to_hsl().h;
            // Hue 0 may read back as ~360 after the f32 round trip.
            let norm = |h: f64| if h > 300.0 { 0.0 } else { h };
            prop_assert!(norm(h_hi) <= norm(h_lo) + 0.5);
        }
    }
}
