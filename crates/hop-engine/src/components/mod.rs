pub mod animation;
pub mod layer;
pub mod object;
pub mod sprite;
pub mod tilemap;
