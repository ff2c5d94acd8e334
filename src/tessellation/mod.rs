mod grid_mesher;
mod noise;

pub use grid_mesher::{GridMesher, MeshMode};
pub use noise::{ApplyNoise, TopographyNoise};
