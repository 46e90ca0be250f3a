use sqlx::{PgExecutor, prelude::FromRow};

/// Row counts of every catalog table.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CatalogCountsRow {
    pub platforms: i64,
    pub platform_releases: i64,
    pub extensions: i64,
    pub extension_releases: i64,
    pub platform_extensions: i64,
    pub categories: i64,
    pub platform_release_categories: i64,
    pub compatibilities: i64,
}

pub async fn get_catalog_counts<'c, E>(executor: E) -> sqlx::Result<CatalogCountsRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CatalogCountsRow>(
        r#"
        select
            (select count(*) from catalog.platform) as platforms,
            (select count(*) from catalog.platform_release) as platform_releases,
            (select count(*) from catalog.extension) as extensions,
            (select count(*) from catalog.extension_release) as extension_releases,
            (select count(*) from catalog.platform_extension) as platform_extensions,
            (select count(*) from catalog.category) as categories,
            (select count(*) from catalog.platform_release_category) as platform_release_categories,
            (select count(*) from catalog.extension_release_compatibility) as compatibilities
        "#,
    )
    .fetch_one(executor)
    .await
}
