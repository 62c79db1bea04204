mod geometry;
pub mod heat;
mod projection;
mod renderer;

pub use projection::Viewport;
pub use renderer::{DisplaySettings, LineString, MapLayers, MapRenderer, MapScene};
