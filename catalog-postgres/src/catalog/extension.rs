use sqlx::{PgExecutor, prelude::FromRow};

/// A row from the `catalog.extension` table.
#[derive(Debug, Clone, FromRow)]
pub struct ExtensionRow {
    pub id: i64,
    pub group_id: String,
    pub artifact_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// A row from the `catalog.extension_release` table.
#[derive(Debug, Clone, FromRow)]
pub struct ExtensionReleaseRow {
    pub id: i64,
    pub extension_id: i64,
    pub version: String,
}

pub async fn find_extension<'c, E>(
    executor: E,
    group_id: &str,
    artifact_id: &str,
) -> sqlx::Result<Option<ExtensionRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, ExtensionRow>(
        r#"
        select id, group_id, artifact_id, name, description
        from catalog.extension
        where group_id = $1 and artifact_id = $2
        "#,
    )
    .bind(group_id)
    .bind(artifact_id)
    .fetch_optional(executor)
    .await
}

pub async fn insert_extension<'c, E>(
    executor: E,
    group_id: &str,
    artifact_id: &str,
    name: &str,
    description: Option<&str>,
) -> sqlx::Result<ExtensionRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, ExtensionRow>(
        r#"
        insert into catalog.extension (group_id, artifact_id, name, description)
        values ($1, $2, $3, $4)
        returning id, group_id, artifact_id, name, description
        "#,
    )
    .bind(group_id)
    .bind(artifact_id)
    .bind(name)
    .bind(description)
    .fetch_one(executor)
    .await
}

pub async fn find_extension_release<'c, E>(
    executor: E,
    extension_id: i64,
    version: &str,
) -> sqlx::Result<Option<ExtensionReleaseRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, ExtensionReleaseRow>(
        r#"
        select id, extension_id, version
        from catalog.extension_release
        where extension_id = $1 and version = $2
        "#,
    )
    .bind(extension_id)
    .bind(version)
    .fetch_optional(executor)
    .await
}

pub async fn insert_extension_release<'c, E>(
    executor: E,
    extension_id: i64,
    version: &str,
) -> sqlx::Result<ExtensionReleaseRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, ExtensionReleaseRow>(
        r#"
        insert into catalog.extension_release (extension_id, version)
        values ($1, $2)
        returning id, extension_id, version
        "#,
    )
    .bind(extension_id)
    .bind(version)
    .fetch_one(executor)
    .await
}
