pub mod config;
pub mod error;
pub mod geology;
pub mod interpolation;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod pipeline;
pub mod tessellation;

pub use error::{GeostrataError, Result};
