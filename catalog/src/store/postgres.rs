use std::collections::HashMap;

use catalog_config::shared::PgConnectionConfig;
use catalog_postgres::catalog::{
    CatalogCountsRow, CategoryRow, CompatibilityRow, ExtensionReleaseRow, ExtensionRow,
    PlatformExtensionRow, PlatformReleaseCategoryRow, PlatformReleaseRow, PlatformRow,
};
use catalog_postgres::{catalog as queries, db};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::catalog_error;
use crate::error::{CatalogResult, ErrorKind};
use crate::store::base::{CatalogStats, CatalogStore, Repository, UnitOfWork};
use crate::types::{
    Category, CategoryId, CategoryKey, CompatibilityId, CompatibilityKey, Extension, ExtensionId,
    ExtensionKey, ExtensionRelease, ExtensionReleaseCompatibility, ExtensionReleaseId,
    ExtensionReleaseKey, Metadata, NewCategory, NewCompatibility, NewExtension,
    NewExtensionRelease, NewPlatform, NewPlatformExtension, NewPlatformRelease,
    NewPlatformReleaseCategory, Platform, PlatformExtension, PlatformExtensionId,
    PlatformExtensionKey, PlatformId, PlatformKey, PlatformRelease, PlatformReleaseCategory,
    PlatformReleaseCategoryId, PlatformReleaseCategoryKey, PlatformReleaseId, PlatformReleaseKey,
};

impl From<PlatformRow> for Platform {
    fn from(row: PlatformRow) -> Self {
        Platform {
            id: PlatformId::new(row.id),
            group_id: row.group_id,
            artifact_id: row.artifact_id,
        }
    }
}

impl From<PlatformReleaseRow> for PlatformRelease {
    fn from(row: PlatformReleaseRow) -> Self {
        PlatformRelease {
            id: PlatformReleaseId::new(row.id),
            platform_id: PlatformId::new(row.platform_id),
            version: row.version,
            quarkus_core_version: row.quarkus_core_version,
            upstream_quarkus_core_version: row.upstream_quarkus_core_version,
        }
    }
}

impl From<ExtensionRow> for Extension {
    fn from(row: ExtensionRow) -> Self {
        Extension {
            id: ExtensionId::new(row.id),
            group_id: row.group_id,
            artifact_id: row.artifact_id,
            name: row.name,
            description: row.description,
        }
    }
}

impl From<ExtensionReleaseRow> for ExtensionRelease {
    fn from(row: ExtensionReleaseRow) -> Self {
        ExtensionRelease {
            id: ExtensionReleaseId::new(row.id),
            extension_id: ExtensionId::new(row.extension_id),
            version: row.version,
        }
    }
}

impl From<PlatformExtensionRow> for PlatformExtension {
    fn from(row: PlatformExtensionRow) -> Self {
        PlatformExtension {
            id: PlatformExtensionId::new(row.id),
            platform_release_id: PlatformReleaseId::new(row.platform_release_id),
            extension_release_id: ExtensionReleaseId::new(row.extension_release_id),
            metadata: Metadata::new(row.metadata),
        }
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

impl From<PlatformReleaseCategoryRow> for PlatformReleaseCategory {
    fn from(row: PlatformReleaseCategoryRow) -> Self {
        PlatformReleaseCategory {
            id: PlatformReleaseCategoryId::new(row.id),
            platform_release_id: PlatformReleaseId::new(row.platform_release_id),
            category_id: CategoryId::new(row.category_id),
            metadata: Metadata::new(row.metadata),
        }
    }
}

impl From<CompatibilityRow> for ExtensionReleaseCompatibility {
    fn from(row: CompatibilityRow) -> Self {
        ExtensionReleaseCompatibility {
            id: CompatibilityId::new(row.id),
            extension_release_id: ExtensionReleaseId::new(row.extension_release_id),
            quarkus_core_version: row.quarkus_core_version,
            compatible: row.compatible,
        }
    }
}

impl From<CatalogCountsRow> for CatalogStats {
    fn from(row: CatalogCountsRow) -> Self {
        let count = |value: i64| u64::try_from(value).unwrap_or_default();

        CatalogStats {
            platforms: count(row.platforms),
            platform_releases: count(row.platform_releases),
            extensions: count(row.extensions),
            extension_releases: count(row.extension_releases),
            platform_extensions: count(row.platform_extensions),
            categories: count(row.categories),
            platform_release_categories: count(row.platform_release_categories),
            compatibilities: count(row.compatibilities),
        }
    }
}

/// Catalog store backed by the `catalog` schema of a Postgres database.
///
/// Every unit of work is a database transaction. Natural keys are protected by unique
/// constraints, so a transaction that inserts a key committed concurrently fails with
/// [`ErrorKind::UniqueViolation`] and the merge is re-run in a fresh transaction.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store with a lazily connected pool.
    ///
    /// The migrations must have been applied with
    /// [`catalog_postgres::migrations::apply_catalog_migrations`].
    pub fn new(config: &PgConnectionConfig, max_connections: u32) -> Self {
        Self {
            pool: db::create_catalog_pool(config, max_connections),
        }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CatalogStore for PostgresStore {
    type UnitOfWork = PostgresUnitOfWork;

    async fn begin(&self) -> CatalogResult<Self::UnitOfWork> {
        let transaction = self.pool.begin().await?;

        Ok(PostgresUnitOfWork { transaction })
    }

    async fn get_compatibility_map(
        &self,
        quarkus_core_version: &str,
    ) -> CatalogResult<HashMap<ExtensionReleaseId, bool>> {
        let rows = queries::get_compatibility_map_rows(&self.pool, quarkus_core_version).await?;

        Ok(rows
            .into_iter()
            .map(|(id, compatible)| (ExtensionReleaseId::new(id), compatible))
            .collect())
    }

    async fn get_compatibility(
        &self,
        extension_release_id: ExtensionReleaseId,
        quarkus_core_version: &str,
    ) -> CatalogResult<Option<ExtensionReleaseCompatibility>> {
        let row = queries::find_compatibility(
            &self.pool,
            extension_release_id.into(),
            quarkus_core_version,
        )
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_platform_releases(
        &self,
        platform_id: PlatformId,
    ) -> CatalogResult<Vec<PlatformRelease>> {
        let rows = queries::get_platform_releases(&self.pool, platform_id.into()).await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_platform_extensions_by_platform_release(
        &self,
        platform_release_id: PlatformReleaseId,
    ) -> CatalogResult<Vec<PlatformExtension>> {
        let rows = queries::get_platform_extensions_by_platform_release(
            &self.pool,
            platform_release_id.into(),
        )
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_platform_extensions_by_extension_release(
        &self,
        extension_release_id: ExtensionReleaseId,
    ) -> CatalogResult<Vec<PlatformExtension>> {
        let rows = queries::get_platform_extensions_by_extension_release(
            &self.pool,
            extension_release_id.into(),
        )
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_platform_release_categories(
        &self,
        platform_release_id: PlatformReleaseId,
    ) -> CatalogResult<Vec<PlatformReleaseCategory>> {
        let rows =
            queries::get_platform_release_categories(&self.pool, platform_release_id.into())
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_catalog_stats(&self) -> CatalogResult<CatalogStats> {
        let row = queries::get_catalog_counts(&self.pool).await?;

        Ok(row.into())
    }
}

/// Unit of work of a [`PostgresStore`], wrapping one transaction.
///
/// Dropping it without committing rolls the transaction back.
pub struct PostgresUnitOfWork {
    transaction: Transaction<'static, Postgres>,
}

impl Repository<Platform> for PostgresUnitOfWork {
    async fn find_by_key(&mut self, key: &PlatformKey) -> CatalogResult<Option<Platform>> {
        let row =
            queries::find_platform(&mut *self.transaction, &key.group_id, &key.artifact_id)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn insert(&mut self, draft: NewPlatform) -> CatalogResult<Platform> {
        let row =
            queries::insert_platform(&mut *self.transaction, &draft.group_id, &draft.artifact_id)
                .await?;

        Ok(row.into())
    }
}

impl Repository<PlatformRelease> for PostgresUnitOfWork {
    async fn find_by_key(
        &mut self,
        key: &PlatformReleaseKey,
    ) -> CatalogResult<Option<PlatformRelease>> {
        let row = queries::find_platform_release(
            &mut *self.transaction,
            key.platform_id.into(),
            &key.version,
        )
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert(&mut self, draft: NewPlatformRelease) -> CatalogResult<PlatformRelease> {
        let row = queries::insert_platform_release(
            &mut *self.transaction,
            draft.platform_id.into(),
            &draft.version,
            &draft.quarkus_core_version,
            draft.upstream_quarkus_core_version.as_deref(),
        )
        .await?;

        Ok(row.into())
    }
}

impl Repository<Extension> for PostgresUnitOfWork {
    async fn find_by_key(&mut self, key: &ExtensionKey) -> CatalogResult<Option<Extension>> {
        let row =
            queries::find_extension(&mut *self.transaction, &key.group_id, &key.artifact_id)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn insert(&mut self, draft: NewExtension) -> CatalogResult<Extension> {
        let row = queries::insert_extension(
            &mut *self.transaction,
            &draft.group_id,
            &draft.artifact_id,
            &draft.name,
            draft.description.as_deref(),
        )
        .await?;

        Ok(row.into())
    }
}

impl Repository<ExtensionRelease> for PostgresUnitOfWork {
    async fn find_by_key(
        &mut self,
        key: &ExtensionReleaseKey,
    ) -> CatalogResult<Option<ExtensionRelease>> {
        let row = queries::find_extension_release(
            &mut *self.transaction,
            key.extension_id.into(),
            &key.version,
        )
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert(&mut self, draft: NewExtensionRelease) -> CatalogResult<ExtensionRelease> {
        let row = queries::insert_extension_release(
            &mut *self.transaction,
            draft.extension_id.into(),
            &draft.version,
        )
        .await?;

        Ok(row.into())
    }
}

impl Repository<PlatformExtension> for PostgresUnitOfWork {
    async fn find_by_key(
        &mut self,
        key: &PlatformExtensionKey,
    ) -> CatalogResult<Option<PlatformExtension>> {
        let row = queries::find_platform_extension(
            &mut *self.transaction,
            key.platform_release_id.into(),
            key.extension_release_id.into(),
        )
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert(&mut self, draft: NewPlatformExtension) -> CatalogResult<PlatformExtension> {
        let row = queries::insert_platform_extension(
            &mut *self.transaction,
            draft.platform_release_id.into(),
            draft.extension_release_id.into(),
            draft.metadata.as_value(),
        )
        .await?;

        Ok(row.into())
    }
}

impl Repository<Category> for PostgresUnitOfWork {
    async fn find_by_key(&mut self, key: &CategoryKey) -> CatalogResult<Option<Category>> {
        let row = queries::find_category(&mut *self.transaction, &key.name).await?;

        Ok(row.map(Into::into))
    }

    async fn insert(&mut self, draft: NewCategory) -> CatalogResult<Category> {
        let row = queries::insert_category(
            &mut *self.transaction,
            &draft.name,
            draft.description.as_deref(),
        )
        .await?;

        Ok(row.into())
    }
}

impl Repository<PlatformReleaseCategory> for PostgresUnitOfWork {
    async fn find_by_key(
        &mut self,
        key: &PlatformReleaseCategoryKey,
    ) -> CatalogResult<Option<PlatformReleaseCategory>> {
        let row = queries::find_platform_release_category(
            &mut *self.transaction,
            key.platform_release_id.into(),
            key.category_id.into(),
        )
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert(
        &mut self,
        draft: NewPlatformReleaseCategory,
    ) -> CatalogResult<PlatformReleaseCategory> {
        let row = queries::insert_platform_release_category(
            &mut *self.transaction,
            draft.platform_release_id.into(),
            draft.category_id.into(),
            draft.metadata.as_value(),
        )
        .await?;

        Ok(row.into())
    }
}

impl Repository<ExtensionReleaseCompatibility> for PostgresUnitOfWork {
    async fn find_by_key(
        &mut self,
        key: &CompatibilityKey,
    ) -> CatalogResult<Option<ExtensionReleaseCompatibility>> {
        let row = queries::find_compatibility(
            &mut *self.transaction,
            key.extension_release_id.into(),
            &key.quarkus_core_version,
        )
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert(
        &mut self,
        draft: NewCompatibility,
    ) -> CatalogResult<ExtensionReleaseCompatibility> {
        let row = queries::insert_compatibility(
            &mut *self.transaction,
            draft.extension_release_id.into(),
            &draft.quarkus_core_version,
            draft.compatible,
        )
        .await?;

        Ok(row.into())
    }
}

impl UnitOfWork for PostgresUnitOfWork {
    async fn update_compatibility(
        &mut self,
        id: CompatibilityId,
        compatible: bool,
    ) -> CatalogResult<ExtensionReleaseCompatibility> {
        let row = queries::update_compatibility(&mut *self.transaction, id.into(), compatible)
            .await?
            .ok_or_else(|| {
                catalog_error!(
                    ErrorKind::MissingReference,
                    "Referenced catalog entity does not exist",
                    format!("extension_release_compatibility {id} does not exist")
                )
            })?;

        Ok(row.into())
    }

    async fn commit(self) -> CatalogResult<()> {
        self.transaction.commit().await?;
        debug!("committed catalog transaction");

        Ok(())
    }

    async fn rollback(self) -> CatalogResult<()> {
        self.transaction.rollback().await?;

        Ok(())
    }
}
