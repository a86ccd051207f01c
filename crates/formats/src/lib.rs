pub mod geojson;
pub mod model;
pub mod model_codec;
pub mod time_series;

pub use geojson::*;
pub use model::*;
pub use model_codec::*;
pub use time_series::*;
