pub mod aabb;
pub mod predicates;
pub mod triangle;

pub use aabb::Aabb;
pub use predicates::Sign;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Distance below which intersection curve endpoints are merged.
pub const WELD_EPSILON: f64 = 1e-6;

/// Distance below which vertices of a reassembled solid are merged.
pub const DOUBLES_EPSILON: f64 = 1e-4;

/// Enclosed volume below which a split result is treated as degenerate.
pub const MIN_VOLUME: f64 = 1e-9;
