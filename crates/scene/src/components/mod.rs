pub mod bounds;
pub mod geometry;
pub mod material;
pub mod properties;
pub mod transform;
pub mod visibility;

pub use bounds::*;
pub use geometry::*;
pub use material::*;
pub use properties::*;
pub use transform::*;
pub use visibility::*;
