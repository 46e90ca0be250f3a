use sqlx::{PgExecutor, prelude::FromRow};

/// A row from the `catalog.platform_extension` join table.
#[derive(Debug, Clone, FromRow)]
pub struct PlatformExtensionRow {
    pub id: i64,
    pub platform_release_id: i64,
    pub extension_release_id: i64,
    pub metadata: serde_json::Value,
}

/// A row from the `catalog.platform_release_category` join table.
#[derive(Debug, Clone, FromRow)]
pub struct PlatformReleaseCategoryRow {
    pub id: i64,
    pub platform_release_id: i64,
    pub category_id: i64,
    pub metadata: serde_json::Value,
}

pub async fn find_platform_extension<'c, E>(
    executor: E,
    platform_release_id: i64,
    extension_release_id: i64,
) -> sqlx::Result<Option<PlatformExtensionRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformExtensionRow>(
        r#"
        select id, platform_release_id, extension_release_id, metadata
        from catalog.platform_extension
        where platform_release_id = $1 and extension_release_id = $2
        "#,
    )
    .bind(platform_release_id)
    .bind(extension_release_id)
    .fetch_optional(executor)
    .await
}

pub async fn insert_platform_extension<'c, E>(
    executor: E,
    platform_release_id: i64,
    extension_release_id: i64,
    metadata: &serde_json::Value,
) -> sqlx::Result<PlatformExtensionRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformExtensionRow>(
        r#"
        insert into catalog.platform_extension (platform_release_id, extension_release_id, metadata)
        values ($1, $2, $3)
        returning id, platform_release_id, extension_release_id, metadata
        "#,
    )
    .bind(platform_release_id)
    .bind(extension_release_id)
    .bind(metadata)
    .fetch_one(executor)
    .await
}

/// Returns the extension links of a platform release.
pub async fn get_platform_extensions_by_platform_release<'c, E>(
    executor: E,
    platform_release_id: i64,
) -> sqlx::Result<Vec<PlatformExtensionRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformExtensionRow>(
        r#"
        select id, platform_release_id, extension_release_id, metadata
        from catalog.platform_extension
        where platform_release_id = $1
        order by id
        "#,
    )
    .bind(platform_release_id)
    .fetch_all(executor)
    .await
}

/// Returns the platform links of an extension release.
pub async fn get_platform_extensions_by_extension_release<'c, E>(
    executor: E,
    extension_release_id: i64,
) -> sqlx::Result<Vec<PlatformExtensionRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformExtensionRow>(
        r#"
        select id, platform_release_id, extension_release_id, metadata
        from catalog.platform_extension
        where extension_release_id = $1
        order by id
        "#,
    )
    .bind(extension_release_id)
    .fetch_all(executor)
    .await
}

pub async fn find_platform_release_category<'c, E>(
    executor: E,
    platform_release_id: i64,
    category_id: i64,
) -> sqlx::Result<Option<PlatformReleaseCategoryRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformReleaseCategoryRow>(
        r#"
        select id, platform_release_id, category_id, metadata
        from catalog.platform_release_category
        where platform_release_id = $1 and category_id = $2
        "#,
    )
    .bind(platform_release_id)
    .bind(category_id)
    .fetch_optional(executor)
    .await
}

pub async fn insert_platform_release_category<'c, E>(
    executor: E,
    platform_release_id: i64,
    category_id: i64,
    metadata: &serde_json::Value,
) -> sqlx::Result<PlatformReleaseCategoryRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformReleaseCategoryRow>(
        r#"
        insert into catalog.platform_release_category (platform_release_id, category_id, metadata)
        values ($1, $2, $3)
        returning id, platform_release_id, category_id, metadata
        "#,
    )
    .bind(platform_release_id)
    .bind(category_id)
    .bind(metadata)
    .fetch_one(executor)
    .await
}

/// Returns the category links of a platform release.
pub async fn get_platform_release_categories<'c, E>(
    executor: E,
    platform_release_id: i64,
) -> sqlx::Result<Vec<PlatformReleaseCategoryRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, PlatformReleaseCategoryRow>(
        r#"
        select id, platform_release_id, category_id, metadata
        from catalog.platform_release_category
        where platform_release_id = $1
        order by id
        "#,
    )
    .bind(platform_release_id)
    .fetch_all(executor)
    .await
}
