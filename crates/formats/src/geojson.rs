//! Lenient GeoJSON boundary parsing.
//!
//! Only the outer document shape is strict: anything that is not a
//! `FeatureCollection` is an error. Individual malformed features are skipped
//! and reported; malformed coordinates become NaN points so the geometry
//! builder drops just the affected polygon.

use foundation::math::LonLat;
use scene::components::{AdminLevel, RegionProperties};
use serde_json::{Map, Value};

/// Polygon rings: ring 0 is the outer boundary, the rest are holes.
pub type PolygonRings = Vec<Vec<LonLat>>;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub properties: RegionProperties,
    pub polygons: Vec<PolygonRings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFeature {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryCollection {
    pub features: Vec<BoundaryFeature>,
    pub skipped: Vec<SkippedFeature>,
}

#[derive(Debug)]
pub enum GeoJsonError {
    Json { reason: String },
    NotAFeatureCollection,
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::Json { reason } => write!(f, "JSON parse error: {reason}"),
            GeoJsonError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {}

impl BoundaryCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value = serde_json::from_str(payload).map_err(|e| GeoJsonError::Json {
            reason: e.to_string(),
        })?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, GeoJsonError> {
        let obj = value.as_object().ok_or(GeoJsonError::NotAFeatureCollection)?;
        if obj.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            return Err(GeoJsonError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(Value::as_array)
            .ok_or(GeoJsonError::NotAFeatureCollection)?;

        let mut out = BoundaryCollection::default();
        for (index, feat) in features_val.iter().enumerate() {
            match parse_feature(feat) {
                Ok(feature) => out.features.push(feature),
                Err(reason) => out.skipped.push(SkippedFeature { index, reason }),
            }
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn find(&self, adcode: i64) -> Option<&BoundaryFeature> {
        self.features.iter().find(|f| f.properties.adcode == adcode)
    }
}

fn parse_feature(value: &Value) -> Result<BoundaryFeature, String> {
    let obj = value.as_object().ok_or("feature must be an object")?;
    if obj.get("type").and_then(Value::as_str) != Some("Feature") {
        return Err("feature type must be \"Feature\"".to_string());
    }
    let empty = Map::new();
    let props = obj
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let properties = parse_properties(props)?;

    let geometry = obj
        .get("geometry")
        .and_then(Value::as_object)
        .ok_or("feature missing geometry")?;
    let coords = geometry
        .get("coordinates")
        .ok_or("geometry missing coordinates")?;
    let polygons = match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => vec![parse_polygon(coords)?],
        Some("MultiPolygon") => coords
            .as_array()
            .ok_or("MultiPolygon coordinates must be an array")?
            .iter()
            .map(parse_polygon)
            .collect::<Result<_, _>>()?,
        Some(other) => return Err(format!("unsupported geometry type: {other}")),
        None => return Err("geometry missing type".to_string()),
    };

    Ok(BoundaryFeature {
        properties,
        polygons,
    })
}

const KNOWN_KEYS: [&str; 7] = [
    "adcode",
    "name",
    "level",
    "centroid",
    "center",
    "parent",
    "childrenNum",
];

fn parse_properties(props: &Map<String, Value>) -> Result<RegionProperties, String> {
    let adcode = props
        .get("adcode")
        .and_then(integer)
        .ok_or("missing or non-numeric adcode")?;
    let name = props
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut out = RegionProperties::new(adcode, name);
    out.level = AdminLevel::parse_lenient(props.get("level").and_then(Value::as_str));
    out.centroid = props.get("centroid").and_then(lon_lat);
    out.center = props.get("center").and_then(lon_lat);
    out.parent = props.get("parent").and_then(|p| match p {
        Value::Object(o) => o.get("adcode").and_then(integer),
        other => integer(other),
    });
    out.children_num = props
        .get("childrenNum")
        .and_then(integer)
        .and_then(|n| u32::try_from(n).ok());
    out.extra = props
        .iter()
        .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(out)
}

/// Integer from a JSON number (integral floats included) or a numeric string.
pub(crate) fn integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lon_lat(v: &Value) -> Option<LonLat> {
    let arr = v.as_array()?;
    let p = LonLat::new(arr.first()?.as_f64()?, arr.get(1)?.as_f64()?);
    p.is_finite().then_some(p)
}

fn parse_polygon(coords: &Value) -> Result<PolygonRings, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array")?;
    rings
        .iter()
        .map(|ring| -> Result<Vec<LonLat>, String> {
            let pts = ring.as_array().ok_or("ring must be an array")?;
            Ok(pts.iter().map(lon_lat_or_nan).collect())
        })
        .collect()
}

fn lon_lat_or_nan(v: &Value) -> LonLat {
    let coord = |i: usize| {
        v.as_array()
            .and_then(|a| a.get(i))
            .and_then(Value::as_f64)
            .unwrap_or(f64::NAN)
    };
    LonLat::new(coord(0), coord(1))
}

#[cfg(test)]
mod tests {
    use super::{BoundaryCollection, GeoJsonError};
    use foundation::math::LonLat;
    use pretty_assertions::assert_eq;
    use scene::components::AdminLevel;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "adcode": 110000, "name": "Beijing", "level": "province",
                    "centroid": [116.41, 40.19], "parent": {"adcode": 100000},
                    "childrenNum": 16, "acroutes": [100000]
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[116.0, 39.5], [117.0, 39.5], [117.0, 40.5], [116.0, 39.5]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"adcode": "120000", "name": "Tianjin", "level": "weird"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[117.0, 38.5], [118.0, 38.5], [118.0, 39.5], [117.0, 38.5]]],
                        [[[118.5, 39.0], ["x", 39.0], [119.0, 39.5], [118.5, 39.0]]]
                    ]
                }
            },
            {"type": "Feature", "properties": {"name": "no code"}, "geometry": null},
            {"type": "Feature", "properties": {"adcode": 3}, "geometry": {"type": "Point", "coordinates": [0, 0]}}
        ]
    }"#;

    #[test]
    fn parses_properties_and_geometry() {
        let fc = BoundaryCollection::from_geojson_str(SAMPLE).expect("parse");
        assert_eq!(fc.len(), 2);

        let bj = &fc.features[0].properties;
        assert_eq!(bj.adcode, 110000);
        assert_eq!(bj.centroid, Some(LonLat::new(116.41, 40.19)));
        assert_eq!(bj.parent, Some(100000));
        assert_eq!(bj.children_num, Some(16));
        assert_eq!(bj.extra.get("acroutes"), Some(&serde_json::json!([100000])));
        assert!(!bj.extra.contains_key("adcode"));

        let tj = fc.find(120000).expect("string adcode accepted");
        assert_eq!(tj.properties.level, AdminLevel::Province);
        assert_eq!(tj.polygons.len(), 2);
        assert!(tj.polygons[1][0][1].lon.is_nan());
    }

    #[test]
    fn malformed_features_are_reported_not_fatal() {
        let fc = BoundaryCollection::from_geojson_str(SAMPLE).expect("parse");
        let skipped: Vec<usize> = fc.skipped.iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![2, 3]);
        assert!(fc.skipped[1].reason.contains("Point"));
    }

    #[test]
    fn non_collection_documents_are_errors() {
        let err = BoundaryCollection::from_geojson_str(r#"{"type": "Feature"}"#).unwrap_err();
        assert!(matches!(err, GeoJsonError::NotAFeatureCollection));
        let err = BoundaryCollection::from_geojson_str("{").unwrap_err();
        assert!(matches!(err, GeoJsonError::Json { .. }));
    }
}
