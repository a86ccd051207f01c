//! Region metadata carried from the boundary dataset to picking and events.

use foundation::math::LonLat;
use serde::{Deserialize, Serialize};

/// Administrative level of a region.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminLevel {
    #[default]
    Province,
    City,
    District,
}

impl AdminLevel {
    /// Parses a level name; anything unrecognized is a province.
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("city") => AdminLevel::City,
            Some("district") => AdminLevel::District,
            _ => AdminLevel::Province,
        }
    }

    /// The level one drill-down step below this one.
    pub fn child(self) -> Self {
        match self {
            AdminLevel::Province => AdminLevel::City,
            AdminLevel::City | AdminLevel::District => AdminLevel::District,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdminLevel::Province => "province",
            AdminLevel::City => "city",
            AdminLevel::District => "district",
        }
    }
}

/// Properties record of one logical region, shared by all of its solids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionProperties {
    pub adcode: i64,
    pub name: String,
    #[serde(default)]
    pub level: AdminLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<LonLat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LonLat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_num: Option<u32>,
    /// Every other feature property, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RegionProperties {
    pub fn new(adcode: i64, name: impl Into<String>) -> Self {
        Self {
            adcode,
            name: name.into(),
            level: AdminLevel::Province,
            centroid: None,
            center: None,
            parent: None,
            children_num: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_level(mut self, level: AdminLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_centroid(mut self, centroid: LonLat) -> Self {
        self.centroid = Some(centroid);
        self
    }

    /// Preferred label position: `centroid`, then `center`.
    pub fn anchor_lon_lat(&self) -> Option<LonLat> {
        self.centroid
            .filter(|c| c.is_finite())
            .or(self.center.filter(|c| c.is_finite()))
    }
}
