//! Planar map projection.
//!
//! A spherical Mercator parameterized by a center point and a linear scale.
//! Projected coordinates are centered on `center` (which maps to the origin)
//! and `y` grows northward.
//!
//! The transform never fails: NaN input propagates as NaN output, and
//! latitudes outside the Mercator band are clamped so the output stays finite.

use serde::{Deserialize, Serialize};

use super::Vec2;

/// Latitude limit of the square Web Mercator world (degrees).
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

/// Geographic coordinate in degrees. Serialized as `[lon, lat]` like GeoJSON.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(v: LonLat) -> Self {
        [v.lon, v.lat]
    }
}

/// Parameters shared by every coordinate of one map build.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionParams {
    pub center: LonLat,
    pub scale: f64,
}

impl ProjectionParams {
    pub fn new(center: LonLat, scale: f64) -> Self {
        Self { center, scale }
    }

    pub fn project(&self, p: LonLat) -> Vec2 {
        project(p, self.center, self.scale)
    }

    pub fn unproject(&self, xy: Vec2) -> LonLat {
        unproject(xy, self.center, self.scale)
    }
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            center: LonLat::new(0.0, 0.0),
            scale: 1.0,
        }
    }
}

/// Projects `p` onto the map plane.
pub fn project(p: LonLat, center: LonLat, scale: f64) -> Vec2 {
    let x = (p.lon - center.lon).to_radians() * scale;
    let y = (mercator_y(p.lat) - mercator_y(center.lat)) * scale;
    Vec2::new(x, y)
}

/// Inverse of [`project`] inside the clamped latitude band.
pub fn unproject(xy: Vec2, center: LonLat, scale: f64) -> LonLat {
    let lon = (xy.x / scale).to_degrees() + center.lon;
    let m = xy.y / scale + mercator_y(center.lat);
    let lat = (2.0 * m.exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    LonLat::new(lon, lat)
}

fn mercator_y(lat_deg: f64) -> f64 {
    // clamp() keeps NaN as NaN.
    let lat = lat_deg
        .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
        .to_radians();
    (std::f64::consts::FRAC_PI_4 + lat * 0.5).tan().ln()
}
