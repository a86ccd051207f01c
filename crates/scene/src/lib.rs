pub mod components;
pub mod entity;
pub mod picking;
pub mod regions;
pub mod spatial;
pub mod world;

pub use world::*;
