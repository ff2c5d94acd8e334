mod arrangement;
mod kernel;
mod retriangulate;
mod split_volume;

pub use arrangement::MeshArrangement;
pub use kernel::{IntersectionKernel, MergedMesh, Origin};
pub use split_volume::SplitVolume;
