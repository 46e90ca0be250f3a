//! Catalog merge engine for platforms, extensions and their compatibility matrix.
//!
//! Inbound [`events::CatalogEvent`]s are merged into a [`store::base::CatalogStore`] by the
//! [`merge::orchestrator::CatalogMerger`]. Every merge runs in its own unit of work and is
//! idempotent: replaying a descriptor never creates a second row for a natural key.
//! [`service::CatalogService`] wires a configured store, the merger and the worker pool
//! together.

pub mod compatibility;
pub mod concurrency;
pub mod error;
pub mod events;
pub mod failpoints;
mod macros;
pub mod merge;
pub mod metrics;
pub mod service;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
