use compute::analysis::Period;
use formats::time_series::MetricSeries;
use layers::symbology::{ColorMode, Palette};
use pretty_assertions::assert_eq;
use render::RecordingBackend;
use viewer::{MapConfig, MapEvent, MapView};

const TWO_SQUARES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"adcode": 1, "name": "A", "level": "province"},
            "geometry": {"type": "Polygon", "coordinates": [[[100,30],[101,30],[101,31],[100,31],[100,30]]]}
        },
        {
            "type": "Feature",
            "properties": {"adcode": 2, "name": "B", "level": "province"},
            "geometry": {"type": "Polygon", "coordinates": [[[102,30],[103,30],[103,31],[102,31],[102,30]]]}
        }
    ]
}"#;

const CITY_OF_B: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"adcode": 201, "name": "B1", "level": "city", "parent": 2},
            "geometry": {"type": "Polygon", "coordinates": [[[102.2,30.2],[102.5,30.2],[102.5,30.5],[102.2,30.5],[102.2,30.2]]]}
        }
    ]
}"#;

const SERIES: &str = r#"[
    {"adcode": 1, "data": {"2020": {"average": 100, "1": 90}}},
    {"adcode": 2, "data": {"2020": {"average": 300, "1": 310}}}
]"#;

fn view() -> MapView<RecordingBackend> {
    let config = MapConfig {
        transition_s: 0.5,
        ..MapConfig::default()
    };
    let mut view = MapView::new(config, 800.0, 600.0, RecordingBackend::new(8));
    view.load_boundaries_json(TWO_SQUARES).expect("geojson");
    view.drain_events();
    view
}

fn top_color(view: &MapView<RecordingBackend>, adcode: i64) -> foundation::color::Color {
    let record = view.regions().get(adcode).expect("region");
    view.world()
        .material(record.top_faces[0])
        .expect("material")
        .color()
}

#[test]
fn discrete_mode_puts_extremes_in_first_and_last_bucket() {
    let mut view = view();
    view.set_series(MetricSeries::from_json_str(SERIES).expect("series"));
    view.select_period(Period::Year(2020));
    view.set_color_mode(ColorMode::Discrete);

    let palette = Palette::default();
    assert_eq!(top_color(&view, 1), palette.buckets[0]);
    assert_eq!(top_color(&view, 2), palette.buckets[3]);
    assert_eq!(view.regions().get(2).and_then(|r| r.value), Some(300.0));
}

#[test]
fn regions_without_a_series_show_the_base_fill() {
    let view = view();
    let fill = view.config().base_fill;
    assert_eq!(top_color(&view, 1), fill);
    assert_eq!(top_color(&view, 2), fill);
}

#[test]
fn double_click_on_a_region_emits_one_drill_down() {
    let mut view = view();
    let [x, y] = view.screen_position_of(2).expect("on screen");
    assert_eq!(view.double_click(x, y), Some(2));

    let drills: Vec<_> = view
        .drain_events()
        .into_iter()
        .filter_map(|e| match e.payload {
            MapEvent::DrillDown { properties } => Some(properties.adcode),
            _ => None,
        })
        .collect();
    assert_eq!(drills, vec![2]);
}

#[test]
fn double_click_on_empty_space_does_nothing() {
    let mut view = view();
    assert_eq!(view.double_click(1.0, 1.0), None);
    assert!(view.drain_events().is_empty());
}

#[test]
fn resize_refits_scale_without_touching_geometry() {
    let mut view = view();
    let before_scale = view.target_scale();
    let entity = view.regions().get(1).expect("region").top_faces[0];
    let before_geometry = view.world().geometry_of(entity).cloned();

    view.resize(1600.0, 300.0);
    assert_ne!(view.target_scale(), before_scale);
    assert_eq!(view.world().geometry_of(entity).cloned(), before_geometry);

    for _ in 0..60 {
        view.frame(1.0 / 60.0);
    }
    assert!((view.scale() - view.target_scale()).abs() < 1e-9);
    assert_eq!(view.backend().size_px, [1600, 300]);
}

#[test]
fn hover_survives_a_recolor_and_restores_the_new_color() {
    let mut view = view();
    view.set_series(MetricSeries::from_json_str(SERIES).expect("series"));
    let hover = view.config().hover;

    let [x, y] = view.screen_position_of(1).expect("on screen");
    view.pointer_move(x, y);
    assert_eq!(view.hover_state().adcode(), Some(1));
    assert_eq!(top_color(&view, 1), hover);
    let tooltip = view.tooltip().expect("tooltip");
    assert_eq!(tooltip.name, "A");
    assert_eq!(tooltip.text, "100");

    view.set_color_mode(ColorMode::Discrete);
    assert_eq!(top_color(&view, 1), hover);

    view.pointer_leave();
    assert_eq!(view.hover_state().adcode(), None);
    assert_eq!(top_color(&view, 1), Palette::default().buckets[0]);

    let changes = view
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e.payload, MapEvent::HoverChanged { .. }))
        .count();
    assert_eq!(changes, 2);
}

#[test]
fn rebuilding_replaces_the_previous_map() {
    let mut view = view();
    let entities = view.world().len();
    view.load_boundaries_json(TWO_SQUARES).expect("geojson");
    assert_eq!(view.world().len(), entities);
    assert_eq!(view.regions().len(), 2);
}

#[test]
fn drill_down_animates_to_the_new_scale() {
    let mut view = view();
    for _ in 0..60 {
        view.frame(1.0 / 60.0);
    }
    let province_scale = view.scale();

    let b = view.regions().get(2).expect("region").properties.clone();
    view.push_region(b);
    view.load_boundaries_json(CITY_OF_B).expect("geojson");
    assert_ne!(view.target_scale(), province_scale);
    assert_eq!(view.scale(), province_scale);

    view.frame(1.0 / 60.0);
    assert_ne!(view.scale(), view.target_scale());

    for _ in 0..60 {
        view.frame(1.0 / 60.0);
    }
    assert!((view.scale() - view.target_scale()).abs() < 1e-9);
    assert_eq!(view.navigation().depth(), 1);
}
