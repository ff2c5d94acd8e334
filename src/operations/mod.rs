pub mod creation;
pub mod layer_stack;
pub mod query;
pub mod split;
