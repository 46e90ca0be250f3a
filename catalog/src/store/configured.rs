use catalog_config::shared::{StoreConfig, ValidationError};
use catalog_postgres::migrations::apply_catalog_migrations;
use std::collections::HashMap;
use tracing::info;

use crate::catalog_error;
use crate::error::{CatalogError, CatalogResult, ErrorKind};
use crate::store::base::{CatalogStats, CatalogStore, Repository, UnitOfWork};
use crate::store::memory::{MemoryStore, MemoryUnitOfWork};
use crate::store::postgres::{PostgresStore, PostgresUnitOfWork};
use crate::types::{
    Category, CompatibilityId, Entity, Extension, ExtensionRelease,
    ExtensionReleaseCompatibility, ExtensionReleaseId, Platform, PlatformExtension, PlatformId,
    PlatformRelease, PlatformReleaseCategory, PlatformReleaseId,
};

fn config_error(err: ValidationError) -> CatalogError {
    catalog_error!(
        ErrorKind::ConfigError,
        "Invalid store configuration",
        err.to_string(),
        source: err
    )
}

/// Store selected at runtime from a [`StoreConfig`].
#[derive(Debug, Clone)]
pub enum ConfiguredStore {
    Memory(MemoryStore),
    Postgres(PostgresStore),
}

impl ConfiguredStore {
    /// Builds the configured store.
    ///
    /// For Postgres the catalog migrations are applied first, so the returned store is ready
    /// for merges.
    pub async fn connect(config: &StoreConfig, max_connections: u32) -> CatalogResult<Self> {
        config.validate().map_err(config_error)?;

        match config {
            StoreConfig::Memory => {
                info!("using in-memory catalog store");

                Ok(ConfiguredStore::Memory(MemoryStore::new()))
            }
            StoreConfig::Postgres { connection } => {
                apply_catalog_migrations(connection).await?;
                info!(
                    host = %connection.host,
                    database = %connection.name,
                    "using postgres catalog store"
                );

                Ok(ConfiguredStore::Postgres(PostgresStore::new(
                    connection,
                    max_connections,
                )))
            }
        }
    }
}

/// Unit of work of a [`ConfiguredStore`].
pub enum ConfiguredUnitOfWork {
    Memory(MemoryUnitOfWork),
    Postgres(PostgresUnitOfWork),
}

macro_rules! dispatch_repository {
    ($($entity:ty),* $(,)?) => {
        $(
            impl Repository<$entity> for ConfiguredUnitOfWork {
                async fn find_by_key(
                    &mut self,
                    key: &<$entity as Entity>::Key,
                ) -> CatalogResult<Option<$entity>> {
                    match self {
                        ConfiguredUnitOfWork::Memory(uow) => {
                            <MemoryUnitOfWork as Repository<$entity>>::find_by_key(uow, key).await
                        }
                        ConfiguredUnitOfWork::Postgres(uow) => {
                            <PostgresUnitOfWork as Repository<$entity>>::find_by_key(uow, key)
                                .await
                        }
                    }
                }

                async fn insert(
                    &mut self,
                    draft: <$entity as Entity>::Draft,
                ) -> CatalogResult<$entity> {
                    match self {
                        ConfiguredUnitOfWork::Memory(uow) => {
                            <MemoryUnitOfWork as Repository<$entity>>::insert(uow, draft).await
                        }
                        ConfiguredUnitOfWork::Postgres(uow) => {
                            <PostgresUnitOfWork as Repository<$entity>>::insert(uow, draft).await
                        }
                    }
                }
            }
        )*
    };
}

dispatch_repository!(
    Platform,
    PlatformRelease,
    Extension,
    ExtensionRelease,
    PlatformExtension,
    Category,
    PlatformReleaseCategory,
    ExtensionReleaseCompatibility,
);

impl UnitOfWork for ConfiguredUnitOfWork {
    async fn update_compatibility(
        &mut self,
        id: CompatibilityId,
        compatible: bool,
    ) -> CatalogResult<ExtensionReleaseCompatibility> {
        match self {
            ConfiguredUnitOfWork::Memory(uow) => uow.update_compatibility(id, compatible).await,
            ConfiguredUnitOfWork::Postgres(uow) => uow.update_compatibility(id, compatible).await,
        }
    }

    async fn commit(self) -> CatalogResult<()> {
        match self {
            ConfiguredUnitOfWork::Memory(uow) => uow.commit().await,
            ConfiguredUnitOfWork::Postgres(uow) => uow.commit().await,
        }
    }

    async fn rollback(self) -> CatalogResult<()> {
        match self {
            ConfiguredUnitOfWork::Memory(uow) => uow.rollback().await,
            ConfiguredUnitOfWork::Postgres(uow) => uow.rollback().await,
        }
    }
}

impl CatalogStore for ConfiguredStore {
    type UnitOfWork = ConfiguredUnitOfWork;

    async fn begin(&self) -> CatalogResult<Self::UnitOfWork> {
        match self {
            ConfiguredStore::Memory(store) => {
                Ok(ConfiguredUnitOfWork::Memory(store.begin().await?))
            }
            ConfiguredStore::Postgres(store) => {
                Ok(ConfiguredUnitOfWork::Postgres(store.begin().await?))
            }
        }
    }

    async fn get_compatibility_map(
        &self,
        quarkus_core_version: &str,
    ) -> CatalogResult<HashMap<ExtensionReleaseId, bool>> {
        match self {
            ConfiguredStore::Memory(store) => {
                store.get_compatibility_map(quarkus_core_version).await
            }
            ConfiguredStore::Postgres(store) => {
                store.get_compatibility_map(quarkus_core_version).await
            }
        }
    }

    async fn get_compatibility(
        &self,
        extension_release_id: ExtensionReleaseId,
        quarkus_core_version: &str,
    ) -> CatalogResult<Option<ExtensionReleaseCompatibility>> {
        match self {
            ConfiguredStore::Memory(store) => {
                store
                    .get_compatibility(extension_release_id, quarkus_core_version)
                    .await
            }
            ConfiguredStore::Postgres(store) => {
                store
                    .get_compatibility(extension_release_id, quarkus_core_version)
                    .await
            }
        }
    }

    async fn get_platform_releases(
        &self,
        platform_id: PlatformId,
    ) -> CatalogResult<Vec<PlatformRelease>> {
        match self {
            ConfiguredStore::Memory(store) => store.get_platform_releases(platform_id).await,
            ConfiguredStore::Postgres(store) => store.get_platform_releases(platform_id).await,
        }
    }

    async fn get_platform_extensions_by_platform_release(
        &self,
        platform_release_id: PlatformReleaseId,
    ) -> CatalogResult<Vec<PlatformExtension>> {
        match self {
            ConfiguredStore::Memory(store) => {
                store
                    .get_platform_extensions_by_platform_release(platform_release_id)
                    .await
            }
            ConfiguredStore::Postgres(store) => {
                store
                    .get_platform_extensions_by_platform_release(platform_release_id)
                    .await
            }
        }
    }

    async fn get_platform_extensions_by_extension_release(
        &self,
        extension_release_id: ExtensionReleaseId,
    ) -> CatalogResult<Vec<PlatformExtension>> {
        match self {
            ConfiguredStore::Memory(store) => {
                store
                    .get_platform_extensions_by_extension_release(extension_release_id)
                    .await
            }
            ConfiguredStore::Postgres(store) => {
                store
                    .get_platform_extensions_by_extension_release(extension_release_id)
                    .await
            }
        }
    }

    async fn get_platform_release_categories(
        &self,
        platform_release_id: PlatformReleaseId,
    ) -> CatalogResult<Vec<PlatformReleaseCategory>> {
        match self {
            ConfiguredStore::Memory(store) => {
                store.get_platform_release_categories(platform_release_id).await
            }
            ConfiguredStore::Postgres(store) => {
                store.get_platform_release_categories(platform_release_id).await
            }
        }
    }

    async fn get_catalog_stats(&self) -> CatalogResult<CatalogStats> {
        match self {
            ConfiguredStore::Memory(store) => store.get_catalog_stats().await,
            ConfiguredStore::Postgres(store) => store.get_catalog_stats().await,
        }
    }
}
