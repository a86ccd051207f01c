pub mod backend;
pub mod camera;
pub mod debug;
pub mod label_layer;
pub mod lights;
pub mod renderer;
pub mod vertex;

pub use backend::*;
pub use camera::*;
pub use renderer::*;
