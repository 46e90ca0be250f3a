//! Storage seam of the catalog.
//!
//! [`base::CatalogStore`] hands out [`base::UnitOfWork`]s, each of which scopes the lookups
//! and inserts of a single merge and is either committed or rolled back as a whole.

pub mod base;
pub mod configured;
pub mod memory;
pub mod postgres;
