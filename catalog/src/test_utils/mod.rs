//! Helpers for testing catalog merges.
//!
//! - [`fixtures`] builds descriptors for platforms, extensions and categories.
//! - [`fault_store`] wraps a store to lose races on purpose or fail selected inserts.
//! - [`failpoints`] configures `fail` failpoints for the lifetime of a test.
//! - [`database`] creates an isolated, migrated Postgres database per test.

#[cfg(feature = "test-utils")]
pub mod database;
pub mod failpoints;
pub mod fault_store;
pub mod fixtures;
