//! Animated decorations drawn on top of the extruded map.
//!
//! Every overlay is rebuilt from the label anchors of a fresh build and
//! advanced once per frame; none of them touch the region meshes.

pub mod flights;
pub mod markers;
pub mod models;
pub mod radar;

pub use flights::*;
pub use markers::*;
pub use models::*;
pub use radar::*;

use serde::{Deserialize, Serialize};

use crate::extrude::RegionLabelAnchor;
use crate::layer::{Animated, Layer, LayerId};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub markers: MarkerSettings,
    pub flights: FlightSettings,
    pub radars: Vec<RadarSettings>,
    pub models: ModelSettings,
}

/// All overlays of one map instance.
#[derive(Debug, Clone)]
pub struct Overlays {
    id: LayerId,
    pub markers: PulsingMarkers,
    pub flights: FlightPaths,
    pub radar: RadarSweep,
    pub models: ModelInstances,
}

impl Overlays {
    pub fn new(id: u64, settings: &OverlaySettings) -> Self {
        Self {
            id: LayerId(id),
            markers: PulsingMarkers::new(settings.markers.clone()),
            flights: FlightPaths::new(settings.flights.clone()),
            radar: RadarSweep::new(settings.radars.clone()),
            models: ModelInstances::new(settings.models.clone()),
        }
    }

    /// Repopulates the anchor-driven overlays after a build.
    pub fn populate(&mut self, anchors: &[RegionLabelAnchor]) {
        self.markers.populate(anchors);
        self.flights.populate(anchors);
        self.models.set_anchors(anchors);
    }

    /// Applies new parameters. Anchor-driven overlays keep their anchors.
    pub fn apply_settings(&mut self, settings: &OverlaySettings) {
        self.markers.set_settings(settings.markers.clone());
        self.flights.set_settings(settings.flights.clone());
        self.radar.set_planes(settings.radars.clone());
        self.models.set_settings(settings.models.clone());
    }

    pub fn clear(&mut self) {
        self.markers.clear();
        self.flights.clear();
        self.models.clear();
    }
}

impl Animated for Overlays {
    fn advance(&mut self, dt_s: f64) {
        self.markers.advance(dt_s);
        self.flights.advance(dt_s);
        self.radar.advance(dt_s);
        self.models.advance(dt_s);
    }
}

impl Layer for Overlays {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        "overlays"
    }
}
