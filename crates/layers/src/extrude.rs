//! Geometry builder: boundary features to extruded region solids.
//!
//! Per polygon the builder projects the rings, cleans and orients them
//! (outer CCW, holes CW), triangulates the outer ring minus holes into a top
//! face at the extrusion depth, and closes the solid with one side-wall quad
//! per ring edge plus an optional bottom face. A top-edge polyline follows the
//! outer ring. Polygons that cannot be built are skipped and counted.

use earcutr::earcut;
use foundation::color::Color;
use foundation::math::{LonLat, ProjectionParams, Vec2, Vec3};
use formats::geojson::{BoundaryCollection, BoundaryFeature, PolygonRings};
use scene::World;
use scene::components::{Geometry, GeometryRole, Material, Polyline, TriMesh, Visibility};
use scene::regions::RegionRegistry;

/// Rings with less absolute area than this are degenerate.
const MIN_RING_AREA: f64 = 1e-12;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ExtrudeStyle {
    pub depth: f64,
    pub fill: Color,
    pub side_bottom: Color,
    pub side_top: Color,
    pub edge_color: Color,
    pub edge_width_px: f32,
    pub with_bottom: bool,
}

impl Default for ExtrudeStyle {
    fn default() -> Self {
        Self {
            depth: 5.0,
            fill: Color::from_rgb8(0x1f, 0x4e, 0x8c),
            side_bottom: Color::from_rgb8(0x0b, 0x1d, 0x3a),
            side_top: Color::from_rgb8(0x2d, 0x8c, 0xd6),
            edge_color: Color::from_rgb8(0x9f, 0xe3, 0xff),
            edge_width_px: 1.5,
            with_bottom: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PolygonSkip {
    TooFewPoints,
    NonFinite,
    ZeroArea,
    Triangulation,
}

impl std::fmt::Display for PolygonSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolygonSkip::TooFewPoints => write!(f, "outer ring has fewer than 3 points"),
            PolygonSkip::NonFinite => write!(f, "non-finite coordinates"),
            PolygonSkip::ZeroArea => write!(f, "zero-area outer ring"),
            PolygonSkip::Triangulation => write!(f, "triangulation failed"),
        }
    }
}

/// A projected, cleaned polygon: outer ring CCW, holes CW, no closing duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPolygon {
    pub outer: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
    /// Absolute area of the outer ring.
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudedPolygon {
    pub top: TriMesh,
    /// One quad per ring edge: `[b_i, b_{i+1}, t_{i+1}, t_i]`.
    pub side_quads: Vec<[Vec3; 4]>,
    pub bottom: Option<TriMesh>,
    pub edge: Polyline,
}

impl ExtrudedPolygon {
    /// Side quads as a triangle mesh, four vertices per quad.
    pub fn side_mesh(&self) -> TriMesh {
        let mut mesh = TriMesh::default();
        for quad in &self.side_quads {
            let base = mesh.positions.len() as u32;
            mesh.positions.extend_from_slice(quad);
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }
}

pub fn prepare_polygon(
    rings: &PolygonRings,
    projection: &ProjectionParams,
) -> Result<PreparedPolygon, PolygonSkip> {
    let project_ring = |ring: &Vec<LonLat>| -> Result<Vec<Vec2>, PolygonSkip> {
        let pts: Vec<Vec2> = ring.iter().map(|p| projection.project(*p)).collect();
        if pts.iter().any(|p| !p.is_finite()) {
            return Err(PolygonSkip::NonFinite);
        }
        Ok(clean_ring(pts))
    };

    let mut outer = project_ring(rings.first().ok_or(PolygonSkip::TooFewPoints)?)?;
    if outer.len() < 3 {
        return Err(PolygonSkip::TooFewPoints);
    }
    let area = signed_area(&outer);
    if area.abs() < MIN_RING_AREA {
        return Err(PolygonSkip::ZeroArea);
    }
    if area < 0.0 {
        outer.reverse();
    }

    let mut holes = Vec::new();
    for ring in &rings[1..] {
        let mut hole = project_ring(ring)?;
        if hole.len() < 3 {
            continue;
        }
        let hole_area = signed_area(&hole);
        if hole_area.abs() < MIN_RING_AREA {
            continue;
        }
        if hole_area > 0.0 {
            hole.reverse();
        }
        holes.push(hole);
    }

    Ok(PreparedPolygon {
        outer,
        holes,
        area: area.abs(),
    })
}

pub fn extrude_polygon(
    polygon: &PreparedPolygon,
    depth: f64,
    with_bottom: bool,
) -> Result<ExtrudedPolygon, PolygonSkip> {
    let rings: Vec<&[Vec2]> = std::iter::once(polygon.outer.as_slice())
        .chain(polygon.holes.iter().map(Vec::as_slice))
        .collect();

    let mut flat: Vec<Vec2> = Vec::new();
    let mut coords: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            hole_indices.push(flat.len());
        }
        for p in ring.iter() {
            coords.push(p.x);
            coords.push(p.y);
            flat.push(*p);
        }
    }

    let raw = earcut(&coords, &hole_indices, 2).map_err(|_| PolygonSkip::Triangulation)?;
    if raw.is_empty() {
        return Err(PolygonSkip::Triangulation);
    }

    let mut top_indices: Vec<u32> = Vec::with_capacity(raw.len());
    for tri in raw.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ccw = (flat[b] - flat[a]).perp_dot(flat[c] - flat[a]) >= 0.0;
        let ordered = if ccw { [a, b, c] } else { [a, c, b] };
        top_indices.extend(ordered.iter().map(|i| *i as u32));
    }

    let top = TriMesh {
        positions: flat.iter().map(|p| p.extend(depth)).collect(),
        indices: top_indices.clone(),
    };
    let bottom = with_bottom.then(|| TriMesh {
        positions: flat.iter().map(|p| p.extend(0.0)).collect(),
        indices: top_indices
            .chunks_exact(3)
            .flat_map(|t| [t[0], t[2], t[1]])
            .collect(),
    });

    let mut side_quads = Vec::new();
    for ring in &rings {
        for (i, p) in ring.iter().enumerate() {
            let q = ring[(i + 1) % ring.len()];
            side_quads.push([p.extend(0.0), q.extend(0.0), q.extend(depth), p.extend(depth)]);
        }
    }

    let edge = Polyline {
        points: polygon.outer.iter().map(|p| p.extend(depth)).collect(),
        closed: true,
    };

    Ok(ExtrudedPolygon {
        top,
        side_quads,
        bottom,
        edge,
    })
}

/// Drops consecutive duplicates and the closing point that repeats the first.
fn clean_ring(mut pts: Vec<Vec2>) -> Vec<Vec2> {
    pts.dedup();
    if pts.len() >= 2 && pts.first() == pts.last() {
        pts.pop();
    }
    pts
}

/// Shoelace area, positive for CCW rings.
pub fn signed_area(ring: &[Vec2]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| ring[i].perp_dot(ring[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

/// Area-weighted centroid of a simple ring. Falls back to the vertex mean.
pub fn ring_centroid(ring: &[Vec2]) -> Option<Vec2> {
    if ring.is_empty() {
        return None;
    }
    let n = ring.len();
    let a = signed_area(ring);
    if a.abs() < MIN_RING_AREA {
        let sum = ring.iter().fold(Vec2::ZERO, |acc, p| acc + *p);
        return Some(sum.scale(1.0 / n as f64));
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let (p, q) = (ring[i], ring[(i + 1) % n]);
        let cross = p.perp_dot(q);
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Some(Vec2::new(cx / (6.0 * a), cy / (6.0 * a)))
}

/// Label position of one region, on top of its solid.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionLabelAnchor {
    pub adcode: i64,
    pub name: String,
    /// Root-local position.
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRegion {
    pub adcode: Option<i64>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildReport {
    pub regions_built: usize,
    pub polygons_built: usize,
    pub polygons_skipped: usize,
    pub skipped_features: Vec<SkippedRegion>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildOutput {
    pub anchors: Vec<RegionLabelAnchor>,
    pub report: BuildReport,
}

/// Builds every feature of a collection into `world` and `regions`.
///
/// The caller disposes any previous map first. A feature that yields no
/// polygon is skipped and reported; nothing here fails the build.
pub fn build_regions(
    collection: &BoundaryCollection,
    projection: &ProjectionParams,
    style: &ExtrudeStyle,
    world: &mut World,
    regions: &mut RegionRegistry,
) -> BuildOutput {
    let mut out = BuildOutput::default();
    out.report.skipped_features = collection
        .skipped
        .iter()
        .map(|s| SkippedRegion {
            adcode: None,
            reason: format!("feature #{}: {}", s.index, s.reason),
        })
        .collect();

    for feature in &collection.features {
        let adcode = feature.properties.adcode;
        let mut solids = Vec::new();
        let mut first_skip: Option<PolygonSkip> = None;
        let mut largest: Option<&PreparedPolygon> = None;
        let prepared: Vec<Result<PreparedPolygon, PolygonSkip>> = feature
            .polygons
            .iter()
            .map(|rings| prepare_polygon(rings, projection))
            .collect();

        for result in &prepared {
            let built = result
                .as_ref()
                .map_err(|e| *e)
                .and_then(|p| Ok((p, extrude_polygon(p, style.depth, style.with_bottom)?)));
            match built {
                Ok((p, solid)) => {
                    if largest.is_none_or(|l| p.area > l.area) {
                        largest = Some(p);
                    }
                    solids.push(solid);
                }
                Err(skip) => {
                    out.report.polygons_skipped += 1;
                    first_skip.get_or_insert(skip);
                }
            }
        }

        let Some(largest) = largest else {
            let reason = first_skip.map_or("no polygons".to_string(), |s| s.to_string());
            out.report.skipped_features.push(SkippedRegion {
                adcode: Some(adcode),
                reason,
            });
            continue;
        };

        let is_new = regions.get(adcode).is_none();
        let anchor = region_anchor(feature, largest, projection, style.depth);
        regions.upsert(feature.properties.clone(), anchor, style.fill);
        if is_new {
            out.report.regions_built += 1;
            out.anchors.push(RegionLabelAnchor {
                adcode,
                name: feature.properties.name.clone(),
                position: anchor,
            });
        }

        for solid in solids {
            spawn_solid(world, regions, adcode, solid, style);
            out.report.polygons_built += 1;
        }
    }
    out
}

fn region_anchor(
    feature: &BoundaryFeature,
    largest: &PreparedPolygon,
    projection: &ProjectionParams,
    depth: f64,
) -> Vec3 {
    let xy = feature
        .properties
        .anchor_lon_lat()
        .map(|ll| projection.project(ll))
        .filter(|p| p.is_finite())
        .or_else(|| ring_centroid(&largest.outer))
        .unwrap_or(Vec2::ZERO);
    xy.extend(depth)
}

fn spawn_solid(
    world: &mut World,
    regions: &mut RegionRegistry,
    adcode: i64,
    solid: ExtrudedPolygon,
    style: &ExtrudeStyle,
) {
    let side = solid.side_mesh();
    let mut parts: Vec<(Geometry, GeometryRole, Material, Visibility)> = vec![
        (
            Geometry::Mesh(solid.top),
            GeometryRole::TopFace,
            Material::solid(style.fill),
            Visibility::pickable(),
        ),
        (
            Geometry::Mesh(side),
            GeometryRole::SideWall,
            Material::VerticalGradient {
                bottom: style.side_bottom,
                top: style.side_top,
                opacity: 1.0,
            },
            Visibility::visible(),
        ),
        (
            Geometry::Line(solid.edge),
            GeometryRole::EdgeLine,
            Material::Line {
                color: style.edge_color,
                width_px: style.edge_width_px,
            },
            Visibility::visible(),
        ),
    ];
    if let Some(bottom) = solid.bottom {
        parts.push((
            Geometry::Mesh(bottom),
            GeometryRole::Bottom,
            Material::solid(style.side_bottom),
            Visibility::visible(),
        ));
    }

    for (geometry, role, material, visibility) in parts {
        let entity = world.spawn();
        world.set_geometry(entity, geometry, role);
        world.set_material(entity, material);
        world.set_visibility(entity, visibility);
        regions.attach(adcode, entity, role);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ExtrudeStyle, PolygonSkip, build_regions, extrude_polygon, prepare_polygon, signed_area,
    };
    use foundation::math::{LonLat, ProjectionParams};
    use formats::geojson::{BoundaryCollection, BoundaryFeature};
    use pretty_assertions::assert_eq;
    use scene::World;
    use scene::components::{GeometryRole, RegionProperties};
    use scene::regions::RegionRegistry;

    fn proj() -> ProjectionParams {
        ProjectionParams::new(LonLat::new(0.0, 0.0), 1000.0)
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<LonLat> {
        vec![
            LonLat::new(x0, y0),
            LonLat::new(x0 + size, y0),
            LonLat::new(x0 + size, y0 + size),
            LonLat::new(x0, y0 + size),
            LonLat::new(x0, y0),
        ]
    }

    fn feature(adcode: i64, polygons: Vec<Vec<Vec<LonLat>>>) -> BoundaryFeature {
        BoundaryFeature {
            properties: RegionProperties::new(adcode, format!("R{adcode}")),
            polygons,
        }
    }

    #[test]
    fn top_face_sits_at_depth_and_side_quads_connect_rings() {
        let p = prepare_polygon(&vec![square(0.0, 0.0, 1.0)], &proj()).expect("prepare");
        assert_eq!(p.outer.len(), 4, "closing duplicate dropped");

        let solid = extrude_polygon(&p, 3.0, true).expect("extrude");
        assert!(solid.top.positions.iter().all(|v| v.z == 3.0));
        assert_eq!(solid.top.triangle_count(), 2);
        assert_eq!(solid.side_quads.len(), 4);
        for (i, quad) in solid.side_quads.iter().enumerate() {
            let (a, b) = (p.outer[i], p.outer[(i + 1) % 4]);
            assert_eq!(quad[0], a.extend(0.0));
            assert_eq!(quad[1], b.extend(0.0));
            assert_eq!(quad[2], b.extend(3.0));
            assert_eq!(quad[3], a.extend(3.0));
        }
        assert_eq!(solid.side_mesh().positions.len(), 16);
        let bottom = solid.bottom.expect("bottom");
        assert!(bottom.positions.iter().all(|v| v.z == 0.0));
    }

    #[test]
    fn winding_is_normalized_and_top_faces_up() {
        let mut cw = square(0.0, 0.0, 1.0);
        cw.reverse();
        let hole = vec![
            LonLat::new(0.25, 0.25),
            LonLat::new(0.75, 0.25),
            LonLat::new(0.75, 0.75),
            LonLat::new(0.25, 0.75),
        ];
        let p = prepare_polygon(&vec![cw, hole], &proj()).expect("prepare");
        assert!(signed_area(&p.outer) > 0.0);
        assert!(signed_area(&p.holes[0]) < 0.0);

        let solid = extrude_polygon(&p, 1.0, false).expect("extrude");
        assert_eq!(solid.side_quads.len(), 8, "hole walls included");
        for tri in solid.top.triangles() {
            let (a, b, c) = (tri[0].truncate(), tri[1].truncate(), tri[2].truncate());
            assert!((b - a).perp_dot(c - a) > 0.0);
        }
        assert!(solid.bottom.is_none());
    }

    #[test]
    fn degenerate_polygons_are_skipped() {
        let two = vec![vec![LonLat::new(0.0, 0.0), LonLat::new(1.0, 1.0)]];
        assert_eq!(prepare_polygon(&two, &proj()), Err(PolygonSkip::TooFewPoints));

        let line = vec![vec![
            LonLat::new(0.0, 0.0),
            LonLat::new(1.0, 0.0),
            LonLat::new(2.0, 0.0),
        ]];
        assert_eq!(prepare_polygon(&line, &proj()), Err(PolygonSkip::ZeroArea));

        let mut nan = square(0.0, 0.0, 1.0);
        nan[1].lon = f64::NAN;
        assert_eq!(prepare_polygon(&vec![nan], &proj()), Err(PolygonSkip::NonFinite));
    }

    #[test]
    fn tiny_holes_are_dropped() {
        let hole = vec![LonLat::new(0.5, 0.5), LonLat::new(0.6, 0.6)];
        let p = prepare_polygon(&vec![square(0.0, 0.0, 1.0), hole], &proj()).expect("prepare");
        assert!(p.holes.is_empty());
    }

    #[test]
    fn build_registers_regions_and_reports_skips() {
        let collection = BoundaryCollection {
            features: vec![
                feature(1, vec![vec![square(0.0, 0.0, 1.0)]]),
                feature(2, vec![vec![square(2.0, 0.0, 1.0)], vec![square(4.0, 0.0, 0.5)]]),
                feature(3, vec![vec![vec![LonLat::new(0.0, 0.0), LonLat::new(1.0, 0.0)]]]),
            ],
            skipped: Vec::new(),
        };
        let mut world = World::new();
        let mut regions = RegionRegistry::new();
        let out = build_regions(
            &collection,
            &proj(),
            &ExtrudeStyle::default(),
            &mut world,
            &mut regions,
        );

        assert_eq!(out.report.regions_built, 2);
        assert_eq!(out.report.polygons_built, 3);
        assert_eq!(out.report.polygons_skipped, 1);
        assert_eq!(out.report.skipped_features.len(), 1);
        assert_eq!(out.report.skipped_features[0].adcode, Some(3));
        assert_eq!(out.anchors.len(), 2);

        let b = regions.get(2).expect("region 2");
        assert_eq!(b.top_faces.len(), 2, "multi-polygon shares one record");
        assert_eq!(b.side_walls.len(), 2);
        for e in &b.top_faces {
            assert_eq!(
                world.geometry_component(*e).map(|g| g.role),
                Some(GeometryRole::TopFace)
            );
            assert!(world.visibility(*e).is_pick_target());
        }
        // 4 entities per solid: top, side, edge, bottom.
        assert_eq!(world.len(), 12);
    }

    #[test]
    fn anchor_prefers_properties_then_largest_polygon() {
        let mut f = feature(9, vec![vec![square(0.0, 0.0, 0.1)], vec![square(2.0, 2.0, 1.0)]]);
        let collection = BoundaryCollection {
            features: vec![f.clone()],
            skipped: Vec::new(),
        };
        let (mut world, mut regions) = (World::new(), RegionRegistry::new());
        let style = ExtrudeStyle::default();
        let out = build_regions(&collection, &proj(), &style, &mut world, &mut regions);
        let expected = proj().project(LonLat::new(2.5, 2.5));
        let got = out.anchors[0].position;
        assert!((got.x - expected.x).abs() < 1e-6);
        assert!((got.y - expected.y).abs() < 1e-2, "area centroid in projected space");
        assert_eq!(got.z, style.depth);

        f.properties.centroid = Some(LonLat::new(0.05, 0.05));
        let collection = BoundaryCollection {
            features: vec![f],
            skipped: Vec::new(),
        };
        let (mut world, mut regions) = (World::new(), RegionRegistry::new());
        let out = build_regions(&collection, &proj(), &style, &mut world, &mut regions);
        let got = out.anchors[0].position.truncate();
        assert_eq!(got, proj().project(LonLat::new(0.05, 0.05)));
    }
}
