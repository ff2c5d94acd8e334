mod bounding_box;
mod classify;
mod intersect;
mod is_valid;
mod volume;

pub use bounding_box::BoundingBox;
pub use classify::{ClassifyPoint, PointClassification};
pub use intersect::ShellsIntersect;
pub use is_valid::{IsValid, ValidityReport};
pub use volume::Volume;
