use sqlx::{PgExecutor, prelude::FromRow};

/// A row from the `catalog.extension_release_compatibility` table.
#[derive(Debug, Clone, FromRow)]
pub struct CompatibilityRow {
    pub id: i64,
    pub extension_release_id: i64,
    pub quarkus_core_version: String,
    pub compatible: bool,
}

pub async fn find_compatibility<'c, E>(
    executor: E,
    extension_release_id: i64,
    quarkus_core_version: &str,
) -> sqlx::Result<Option<CompatibilityRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CompatibilityRow>(
        r#"
        select id, extension_release_id, quarkus_core_version, compatible
        from catalog.extension_release_compatibility
        where extension_release_id = $1 and quarkus_core_version = $2
        "#,
    )
    .bind(extension_release_id)
    .bind(quarkus_core_version)
    .fetch_optional(executor)
    .await
}

pub async fn insert_compatibility<'c, E>(
    executor: E,
    extension_release_id: i64,
    quarkus_core_version: &str,
    compatible: bool,
) -> sqlx::Result<CompatibilityRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CompatibilityRow>(
        r#"
        insert into catalog.extension_release_compatibility
            (extension_release_id, quarkus_core_version, compatible)
        values ($1, $2, $3)
        returning id, extension_release_id, quarkus_core_version, compatible
        "#,
    )
    .bind(extension_release_id)
    .bind(quarkus_core_version)
    .bind(compatible)
    .fetch_one(executor)
    .await
}

/// Overwrites the compatibility flag of an existing row.
pub async fn update_compatibility<'c, E>(
    executor: E,
    id: i64,
    compatible: bool,
) -> sqlx::Result<Option<CompatibilityRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CompatibilityRow>(
        r#"
        update catalog.extension_release_compatibility
        set compatible = $2, updated_at = now()
        where id = $1
        returning id, extension_release_id, quarkus_core_version, compatible
        "#,
    )
    .bind(id)
    .bind(compatible)
    .fetch_optional(executor)
    .await
}

/// Returns `(extension_release_id, compatible)` for every row of a core version.
pub async fn get_compatibility_map_rows<'c, E>(
    executor: E,
    quarkus_core_version: &str,
) -> sqlx::Result<Vec<(i64, bool)>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, (i64, bool)>(
        r#"
        select extension_release_id, compatible
        from catalog.extension_release_compatibility
        where quarkus_core_version = $1
        "#,
    )
    .bind(quarkus_core_version)
    .fetch_all(executor)
    .await
}
