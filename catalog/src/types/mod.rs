//! Catalog entities, their identities and the descriptors merged into them.

pub mod descriptor;
pub mod entity;
pub mod graph;
pub mod ids;
pub mod metadata;

pub use descriptor::*;
pub use entity::*;
pub use graph::*;
pub use ids::*;
pub use metadata::*;
