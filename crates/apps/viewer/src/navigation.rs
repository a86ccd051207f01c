//! Drill-down history and the projection of each level.

use foundation::math::{LonLat, ProjectionParams};
use scene::components::{AdminLevel, RegionProperties};
use serde::{Deserialize, Serialize};

/// Projection scale used when showing regions of each level.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelScales {
    pub province: f64,
    pub city: f64,
    pub district: f64,
}

impl Default for LevelScales {
    fn default() -> Self {
        Self {
            province: 1_000.0,
            city: 4_000.0,
            district: 16_000.0,
        }
    }
}

impl LevelScales {
    pub fn for_level(&self, level: AdminLevel) -> f64 {
        match level {
            AdminLevel::Province => self.province,
            AdminLevel::City => self.city,
            AdminLevel::District => self.district,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.province, self.city, self.district]
            .iter()
            .all(|s| s.is_finite() && *s > 0.0)
    }
}

/// Regions the user drilled into, outermost first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationStack {
    stack: Vec<RegionProperties>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, region: RegionProperties) {
        self.stack.push(region);
    }

    pub fn pop(&mut self) -> Option<RegionProperties> {
        self.stack.pop()
    }

    pub fn current(&self) -> Option<&RegionProperties> {
        self.stack.last()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn breadcrumbs(&self) -> impl Iterator<Item = &str> {
        self.stack.iter().map(|r| r.name.as_str())
    }

    /// Projection for the map shown at the current depth: centered on the
    /// navigated region with the scale of its children's level.
    pub fn projection(&self, root_center: LonLat, scales: &LevelScales) -> ProjectionParams {
        projection_for(self.current(), root_center, scales)
    }
}

pub fn projection_for(
    region: Option<&RegionProperties>,
    root_center: LonLat,
    scales: &LevelScales,
) -> ProjectionParams {
    match region {
        None => ProjectionParams::new(root_center, scales.province),
        Some(r) => ProjectionParams::new(
            r.anchor_lon_lat()
                .filter(|c| c.is_finite())
                .unwrap_or(root_center),
            scales.for_level(r.level.child()),
        ),
    }
}
