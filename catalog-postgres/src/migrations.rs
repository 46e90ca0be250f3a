use catalog_config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::{Executor, postgres::PgPoolOptions};
use tracing::info;

/// Runs the catalog migrations on the database described by `connection_config`.
///
/// The migrations run with `search_path` set to `catalog` so that the `_sqlx_migrations`
/// metadata table is created inside that schema instead of `public`.
pub async fn apply_catalog_migrations(
    connection_config: &PgConnectionConfig,
) -> Result<(), sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("create schema if not exists catalog;").await?;
                conn.execute("set search_path = 'catalog';").await?;

                Ok(())
            })
        })
        .connect_with(connection_config.with_db())
        .await?;

    info!("applying catalog migrations");

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("catalog migrations successfully applied");

    pool.close().await;

    Ok(())
}
