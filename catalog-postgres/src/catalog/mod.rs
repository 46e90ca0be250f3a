//! Row types and queries for the tables of the `catalog` schema.
//!
//! Every function takes a generic executor so that callers can run it on a pool or inside
//! an open transaction. Inserts return the stored row, including its surrogate id.

pub mod category;
pub mod compatibility;
pub mod extension;
pub mod links;
pub mod platform;
pub mod stats;

pub use category::*;
pub use compatibility::*;
pub use extension::*;
pub use links::*;
pub use platform::*;
pub use stats::*;
