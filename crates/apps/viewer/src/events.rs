use scene::components::RegionProperties;
use serde::Serialize;

use crate::interaction::Tooltip;

/// Notifications for the embedding application, drained once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    /// A region was double-clicked.
    DrillDown { properties: RegionProperties },
    HoverChanged {
        adcode: Option<i64>,
        tooltip: Option<Tooltip>,
    },
    BuildFinished {
        regions: usize,
        skipped_features: usize,
        skipped_polygons: usize,
    },
    ModelLoaded { name: String, instances: usize },
    ModelFailed { reason: String },
}
