use catalog_config::shared::{PgConnectionConfig, TlsConfig};
use catalog_postgres::migrations::apply_catalog_migrations;
use catalog_postgres::test_utils::{create_pg_database, drop_pg_database};
use uuid::Uuid;

use crate::store::postgres::PostgresStore;

/// Connections kept by the pool of a test database.
///
/// Race tests open a competing unit of work while another one is in flight, so this must
/// stay above one.
const TEST_POOL_MAX_CONNECTIONS: u32 = 8;

/// Builds a connection config for a local Postgres with a fresh, unique database name.
///
/// Configuration is read from environment variables:
/// - `TESTS_DATABASE_HOST`: Postgres server hostname (required)
/// - `TESTS_DATABASE_PORT`: Postgres server port (required)
/// - `TESTS_DATABASE_USERNAME`: Database user (required)
/// - `TESTS_DATABASE_PASSWORD`: Database password (optional)
pub fn local_pg_connection_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: std::env::var("TESTS_DATABASE_HOST").expect("TESTS_DATABASE_HOST must be set"),
        port: std::env::var("TESTS_DATABASE_PORT")
            .expect("TESTS_DATABASE_PORT must be set")
            .parse()
            .expect("TESTS_DATABASE_PORT must be a valid port number"),
        name: Uuid::new_v4().to_string(),
        username: std::env::var("TESTS_DATABASE_USERNAME")
            .expect("TESTS_DATABASE_USERNAME must be set"),
        password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(Into::into),
        tls: TlsConfig {
            trusted_root_certs: String::new(),
            enabled: false,
        },
    }
}

/// A throwaway catalog database with migrations applied.
pub struct TestCatalogDatabase {
    config: PgConnectionConfig,
    store: PostgresStore,
}

impl TestCatalogDatabase {
    pub fn config(&self) -> &PgConnectionConfig {
        &self.config
    }

    pub fn store(&self) -> PostgresStore {
        self.store.clone()
    }

    /// Closes the pool and drops the database.
    pub async fn cleanup(self) {
        self.store.pool().close().await;
        drop_pg_database(&self.config).await;
    }
}

/// Creates a uniquely named database, migrates it and returns a store backed by it.
///
/// # Panics
///
/// Panics if the database cannot be created or migrated.
pub async fn spawn_catalog_database() -> TestCatalogDatabase {
    let config = local_pg_connection_config();
    create_pg_database(&config).await;
    apply_catalog_migrations(&config)
        .await
        .expect("Failed to apply catalog migrations");

    let store = PostgresStore::new(&config, TEST_POOL_MAX_CONNECTIONS);

    TestCatalogDatabase { config, store }
}
