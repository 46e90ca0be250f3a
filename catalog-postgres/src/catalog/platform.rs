use sqlx::{PgExecutor, prelude::FromRow};

/// A row from the `catalog.platform` table.
#[derive(Debug, Clone, FromRow)]
pub struct PlatformRow {
    pub id: i64,
    pub group_id: String,
    pub artifact_id: String,
}

/// A row from the `catalog.platform_release` table.
#[derive(Debug, Clone, FromRow)]
pub struct PlatformReleaseRow {
    pub id: i64,
    pub platform_id: i64,
    pub version: String,
    pub quarkus_core_version: String,
    pub upstream_quarkus_core_version: Option<String>,
}

pub async fn find_platform<'c, E>(
    executor: E,
    group_id: &str,
    artifact_id: &str,
) -> sqlx::Result<Option<PlatformRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformRow>(
        r#"
        select id, group_id, artifact_id
        from catalog.platform
        where group_id = $1 and artifact_id = $2
        "#,
    )
    .bind(group_id)
    .bind(artifact_id)
    .fetch_optional(executor)
    .await
}

pub async fn insert_platform<'c, E>(
    executor: E,
    group_id: &str,
    artifact_id: &str,
) -> sqlx::Result<PlatformRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformRow>(
        r#"
        insert into catalog.platform (group_id, artifact_id)
        values ($1, $2)
        returning id, group_id, artifact_id
        "#,
    )
    .bind(group_id)
    .bind(artifact_id)
    .fetch_one(executor)
    .await
}

pub async fn find_platform_release<'c, E>(
    executor: E,
    platform_id: i64,
    version: &str,
) -> sqlx::Result<Option<PlatformReleaseRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformReleaseRow>(
        r#"
        select id, platform_id, version, quarkus_core_version, upstream_quarkus_core_version
        from catalog.platform_release
        where platform_id = $1 and version = $2
        "#,
    )
    .bind(platform_id)
    .bind(version)
    .fetch_optional(executor)
    .await
}

pub async fn insert_platform_release<'c, E>(
    executor: E,
    platform_id: i64,
    version: &str,
    quarkus_core_version: &str,
    upstream_quarkus_core_version: Option<&str>,
) -> sqlx::Result<PlatformReleaseRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformReleaseRow>(
        r#"
        insert into catalog.platform_release
            (platform_id, version, quarkus_core_version, upstream_quarkus_core_version)
        values ($1, $2, $3, $4)
        returning id, platform_id, version, quarkus_core_version, upstream_quarkus_core_version
        "#,
    )
    .bind(platform_id)
    .bind(version)
    .bind(quarkus_core_version)
    .bind(upstream_quarkus_core_version)
    .fetch_one(executor)
    .await
}

/// Returns every release of a platform, oldest first.
pub async fn get_platform_releases<'c, E>(
    executor: E,
    platform_id: i64,
) -> sqlx::Result<Vec<PlatformReleaseRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformReleaseRow>(
        r#"
        select id, platform_id, version, quarkus_core_version, upstream_quarkus_core_version
        from catalog.platform_release
        where platform_id = $1
        order by id
        "#,
    )
    .bind(platform_id)
    .fetch_all(executor)
    .await
}
