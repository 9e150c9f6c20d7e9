//! HTTP handlers for entity CRUD and registry metadata.

pub mod entity;
pub mod model;
pub use entity::*;
pub use model::*;
