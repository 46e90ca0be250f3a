use catalog_config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, postgres::PgConnectOptions};
use std::time::Duration;

/// Duration after which idle connections are closed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates a lazily connected pool to the catalog database.
///
/// Returns immediately; connections are opened on first use and closed after
/// [`IDLE_TIMEOUT`] of inactivity. Each concurrent merge holds one connection for the
/// duration of its unit of work, so `max_connections` should match the worker count.
pub fn create_catalog_pool(config: &PgConnectionConfig, max_connections: u32) -> PgPool {
    let options: PgConnectOptions = config.with_db();

    PgPoolOptions::new()
        .min_connections(0)
        .max_connections(max_connections.max(1))
        .idle_timeout(Some(IDLE_TIMEOUT))
        .connect_lazy_with(options)
}

/// Returns `true` when `err` is a violation of a unique constraint (SQLSTATE 23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Returns `true` when `err` is a violation of a foreign key (SQLSTATE 23503).
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}

/// SQLSTATE raised when Postgres aborts a transaction to break a lock cycle.
const DEADLOCK_DETECTED: &str = "40P01";

/// SQLSTATE raised when a transaction cannot be serialized against a concurrent one.
const SERIALIZATION_FAILURE: &str = "40001";

/// Returns `true` when Postgres aborted the transaction because of a concurrent one
/// (SQLSTATE 40P01 or 40001). Re-running the transaction may succeed.
pub fn is_transaction_conflict(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == DEADLOCK_DETECTED || code == SERIALIZATION_FAILURE)
}
