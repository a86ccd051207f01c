//! `choro`: offline checks for boundary datasets, metric series and models.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use compute::analysis::Period;
use formats::geojson::BoundaryCollection;
use formats::model::ModelAsset;
use formats::model_codec::{encode_model, is_compressed, load_model_bytes};
use formats::time_series::MetricSeries;
use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use layers::symbology::ColorMode;
use render::RecordingBackend;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use viewer::{MapConfig, MapView};

#[derive(Parser)]
#[command(name = "choro", about = "Choropleth map dataset tools")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a boundary GeoJSON file.
    Inspect { geojson: PathBuf },
    /// Print every region's metric value and fill color for a period.
    Colors {
        geojson: PathBuf,
        series: PathBuf,
        /// `YYYY` for the yearly average or `YYYY-MM` for one month.
        #[arg(long)]
        period: Period,
        #[arg(long, value_enum, default_value_t = Mode::Continuous)]
        mode: Mode,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Report the region under a screen point of a headless view.
    Pick {
        geojson: PathBuf,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Convert a JSON model into the compressed binary format.
    PackModel { input: PathBuf, output: PathBuf },
    /// Convert a model (JSON or compressed) back to JSON.
    UnpackModel { input: PathBuf, output: PathBuf },
}

#[derive(Copy, Clone, ValueEnum)]
enum Mode {
    Discrete,
    Continuous,
}

impl From<Mode> for ColorMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Discrete => ColorMode::Discrete,
            Mode::Continuous => ColorMode::Continuous,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), String> {
    let out = match args.command {
        Command::Inspect { geojson } => {
            let collection = read_boundaries(&geojson)?;
            to_json(&inspect(&collection))?
        }
        Command::Colors {
            geojson,
            series,
            period,
            mode,
            config,
        } => {
            let config = read_config(config.as_deref())?;
            let collection = read_boundaries(&geojson)?;
            let text = read_text(&series)?;
            let series =
                MetricSeries::from_json_str(&text).map_err(|e| format!("{series:?}: {e}"))?;
            to_json(&colors(config, &collection, series, period, mode.into()))?
        }
        Command::Pick {
            geojson,
            x,
            y,
            width,
            height,
            config,
        } => {
            let config = read_config(config.as_deref())?;
            let collection = read_boundaries(&geojson)?;
            to_json(&pick(config, &collection, [width, height], [x, y]))?
        }
        Command::PackModel { input, output } => {
            let bytes = fs::read(&input).map_err(|e| format!("read {input:?}: {e}"))?;
            let asset =
                ModelAsset::from_json_slice(&bytes).map_err(|e| format!("{input:?}: {e}"))?;
            let packed = encode_model(&asset).map_err(|e| format!("encode: {e}"))?;
            fs::write(&output, &packed).map_err(|e| format!("write {output:?}: {e}"))?;
            info!(
                model = %asset.name,
                json_bytes = bytes.len(),
                packed_bytes = packed.len(),
                "model packed"
            );
            return Ok(());
        }
        Command::UnpackModel { input, output } => {
            let bytes = fs::read(&input).map_err(|e| format!("read {input:?}: {e}"))?;
            debug!(compressed = is_compressed(&bytes), "reading model");
            let asset = load_model_bytes(&bytes).map_err(|e| format!("{input:?}: {e}"))?;
            let json = asset.to_json_vec().map_err(|e| format!("json: {e}"))?;
            fs::write(&output, json).map_err(|e| format!("write {output:?}: {e}"))?;
            info!(model = %asset.name, meshes = asset.meshes.len(), "model unpacked");
            return Ok(());
        }
    };
    println!("{out}");
    Ok(())
}

fn read_text(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))
}

fn read_boundaries(path: &Path) -> Result<BoundaryCollection, String> {
    let text = read_text(path)?;
    BoundaryCollection::from_geojson_str(&text).map_err(|e| format!("{path:?}: {e}"))
}

fn read_config(path: Option<&Path>) -> Result<MapConfig, String> {
    match path {
        None => Ok(MapConfig::default()),
        Some(path) => {
            let text = read_text(path)?;
            MapConfig::from_json_str(&text).map_err(|e| format!("{path:?}: {e}"))
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("json: {e}"))
}

#[derive(Debug, Serialize)]
struct InspectReport {
    features: usize,
    polygons: usize,
    rings: usize,
    bounds: Option<[f64; 4]>,
    regions: Vec<RegionSummary>,
    skipped: Vec<SkippedSummary>,
}

#[derive(Debug, Serialize)]
struct RegionSummary {
    adcode: i64,
    name: String,
    level: &'static str,
    polygons: usize,
}

#[derive(Debug, Serialize)]
struct SkippedSummary {
    index: usize,
    reason: String,
}

fn inspect(collection: &BoundaryCollection) -> InspectReport {
    let mut bounds = Aabb2::empty();
    let mut polygons = 0;
    let mut rings = 0;
    let mut regions = Vec::with_capacity(collection.features.len());
    for feature in &collection.features {
        polygons += feature.polygons.len();
        for polygon in &feature.polygons {
            rings += polygon.len();
            for p in polygon.iter().flatten() {
                bounds.extend(Vec2::new(p.lon, p.lat));
            }
        }
        regions.push(RegionSummary {
            adcode: feature.properties.adcode,
            name: feature.properties.name.clone(),
            level: feature.properties.level.as_str(),
            polygons: feature.polygons.len(),
        });
    }
    InspectReport {
        features: collection.features.len(),
        polygons,
        rings,
        bounds: (!bounds.is_empty())
            .then(|| [bounds.min[0], bounds.min[1], bounds.max[0], bounds.max[1]]),
        regions,
        skipped: collection
            .skipped
            .iter()
            .map(|s| SkippedSummary {
                index: s.index,
                reason: s.reason.clone(),
            })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
struct RegionColor {
    adcode: i64,
    name: String,
    value: Option<f64>,
    color: String,
}

/// Runs the full recolor pass on a headless view and reads the top faces back.
fn colors(
    config: MapConfig,
    collection: &BoundaryCollection,
    series: MetricSeries,
    period: Period,
    mode: ColorMode,
) -> Vec<RegionColor> {
    let mut view = MapView::new(config, 800.0, 600.0, RecordingBackend::new(1));
    view.load_boundaries(collection);
    view.set_series(series);
    view.select_period(period);
    view.set_color_mode(mode);

    let mut out: Vec<RegionColor> = view
        .regions()
        .iter()
        .map(|r| RegionColor {
            adcode: r.adcode(),
            name: r.properties.name.clone(),
            value: r.value,
            color: r.base_color.to_hex(),
        })
        .collect();
    out.sort_by_key(|r| r.adcode);
    out
}

#[derive(Debug, Serialize)]
struct PickReport {
    x: f64,
    y: f64,
    scale: f64,
    hit: Option<serde_json::Value>,
}

fn pick(
    config: MapConfig,
    collection: &BoundaryCollection,
    size_px: [f64; 2],
    at: [f64; 2],
) -> PickReport {
    let mut view = MapView::new(config, size_px[0], size_px[1], RecordingBackend::new(1));
    view.load_boundaries(collection);
    let hit = view
        .pick(at[0], at[1])
        .and_then(|adcode| view.regions().get(adcode))
        .and_then(|r| serde_json::to_value(&r.properties).ok());
    PickReport {
        x: at[0],
        y: at[1],
        scale: view.scale(),
        hit,
    }
}

#[cfg(test)]
mod tests {
    use super::{colors, inspect, pick};
    use compute::analysis::Period;
    use formats::geojson::BoundaryCollection;
    use formats::time_series::MetricSeries;
    use layers::symbology::{ColorMode, Palette};
    use pretty_assertions::assert_eq;
    use viewer::{MapConfig, MapView};

    const TWO_SQUARES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"adcode": 1, "name": "A"},
             "geometry": {"type": "Polygon", "coordinates": [[[100,30],[101,30],[101,31],[100,31],[100,30]]]}},
            {"type": "Feature", "properties": {"adcode": 2, "name": "B", "level": "city"},
             "geometry": {"type": "Polygon", "coordinates": [[[102,30],[103,30],[103,31],[102,31],[102,30]]]}},
            {"type": "Feature", "properties": {"adcode": 3}, "geometry": {"type": "Point", "coordinates": [0, 0]}}
        ]
    }"#;

    fn collection() -> BoundaryCollection {
        BoundaryCollection::from_geojson_str(TWO_SQUARES).expect("geojson")
    }

    #[test]
    fn inspect_counts_rings_and_bounds() {
        let report = inspect(&collection());
        assert_eq!(report.features, 2);
        assert_eq!(report.polygons, 2);
        assert_eq!(report.rings, 2);
        assert_eq!(report.bounds, Some([100.0, 30.0, 103.0, 31.0]));
        assert_eq!(report.regions[1].level, "city");
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn colors_follow_the_discrete_buckets() {
        let series = MetricSeries::from_json_str(
            r#"[{"adcode": 1, "data": {"2021": {"3": 5}}}, {"adcode": 2, "data": {"2021": {"3": 9}}}]"#,
        )
        .expect("series");
        let period = Period::month(2021, 3).expect("month");
        let rows = colors(
            MapConfig::default(),
            &collection(),
            series,
            period,
            ColorMode::Discrete,
        );
        let palette = Palette::default();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, Some(5.0));
        assert_eq!(rows[0].color, palette.buckets[0].to_hex());
        assert_eq!(rows[1].color, palette.buckets[3].to_hex());
    }

    #[test]
    fn pick_reports_the_region_properties() {
        let config = MapConfig::default();
        let view_probe = {
            let backend = render::RecordingBackend::new(1);
            let mut view = MapView::new(config.clone(), 800.0, 600.0, backend);
            view.load_boundaries(&collection());
            view.screen_position_of(1).expect("on screen")
        };
        let report = pick(config, &collection(), [800.0, 600.0], view_probe);
        let hit = report.hit.expect("hit");
        assert_eq!(hit["adcode"], 1);
        assert_eq!(hit["name"], "A");
    }
}
