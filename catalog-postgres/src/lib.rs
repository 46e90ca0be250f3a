//! Postgres schema, migrations and queries backing the catalog store.

pub mod catalog;
pub mod db;
pub mod migrations;
#[cfg(feature = "test-utils")]
pub mod test_utils;
