mod borehole;
mod contact;

pub use borehole::{Borehole, Layer};
pub use contact::{ContactPointSet, ExtractContacts};
