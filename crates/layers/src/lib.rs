pub mod extrude;
pub mod labels;
pub mod layer;
pub mod normalize;
pub mod overlays;
pub mod symbology;

pub use layer::*;
