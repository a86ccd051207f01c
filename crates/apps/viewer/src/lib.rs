//! Interactive choropleth map instance.
//!
//! [`MapView`] owns one map: its scene, region registry, overlays, camera and
//! the backend it hands frames to. Everything runs on the caller's thread
//! except model loading.

pub mod config;
pub mod events;
pub mod interaction;
pub mod loader;
pub mod map_view;
pub mod navigation;

pub use config::*;
pub use events::*;
pub use map_view::*;
