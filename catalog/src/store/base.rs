use std::collections::HashMap;
use std::future::Future;

use tracing::warn;

use crate::error::CatalogResult;
use crate::types::{
    Category, CompatibilityId, Entity, Extension, ExtensionRelease, ExtensionReleaseCompatibility,
    ExtensionReleaseId, Platform, PlatformExtension, PlatformId, PlatformRelease,
    PlatformReleaseCategory, PlatformReleaseId,
};

/// Natural-key access to one entity type inside a unit of work.
///
/// A lookup is a hint, not a lock: a concurrent unit of work may insert the same key after
/// [`Repository::find_by_key`] returned `None`. The store's unique index is what guarantees
/// a single row per key, and it reports the lost race as
/// [`crate::error::ErrorKind::UniqueViolation`], either from [`Repository::insert`] or from
/// [`UnitOfWork::commit`].
pub trait Repository<E: Entity> {
    /// Returns the entity whose natural key equals `key` on every field.
    ///
    /// Sees rows committed by other units of work and rows inserted by this one.
    fn find_by_key(
        &mut self,
        key: &E::Key,
    ) -> impl Future<Output = CatalogResult<Option<E>>> + Send;

    /// Persists a new row and returns it with its assigned surrogate id.
    fn insert(&mut self, draft: E::Draft) -> impl Future<Output = CatalogResult<E>> + Send;
}

/// An atomic scope of catalog writes.
///
/// Nothing written through a unit of work is visible to others before
/// [`UnitOfWork::commit`]. Dropping it without committing discards its writes.
pub trait UnitOfWork:
    Repository<Platform>
    + Repository<PlatformRelease>
    + Repository<Extension>
    + Repository<ExtensionRelease>
    + Repository<PlatformExtension>
    + Repository<Category>
    + Repository<PlatformReleaseCategory>
    + Repository<ExtensionReleaseCompatibility>
    + Send
    + Sized
{
    /// Overwrites the flag of an existing compatibility row.
    fn update_compatibility(
        &mut self,
        id: CompatibilityId,
        compatible: bool,
    ) -> impl Future<Output = CatalogResult<ExtensionReleaseCompatibility>> + Send;

    fn commit(self) -> impl Future<Output = CatalogResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = CatalogResult<()>> + Send;
}

/// Row counts of every catalog entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub platforms: u64,
    pub platform_releases: u64,
    pub extensions: u64,
    pub extension_releases: u64,
    pub platform_extensions: u64,
    pub categories: u64,
    pub platform_release_categories: u64,
    pub compatibilities: u64,
}

/// Persistent catalog shared by every merge.
///
/// Implementations must be cheap to clone and safe to use from many tasks at once.
pub trait CatalogStore: Clone + Send + Sync + 'static {
    type UnitOfWork: UnitOfWork;

    /// Starts a new unit of work.
    fn begin(&self) -> impl Future<Output = CatalogResult<Self::UnitOfWork>> + Send;

    /// Returns every compatibility verdict recorded for `quarkus_core_version`, keyed by
    /// extension release, in a single read.
    ///
    /// An unknown core version yields an empty map.
    fn get_compatibility_map(
        &self,
        quarkus_core_version: &str,
    ) -> impl Future<Output = CatalogResult<HashMap<ExtensionReleaseId, bool>>> + Send;

    fn get_compatibility(
        &self,
        extension_release_id: ExtensionReleaseId,
        quarkus_core_version: &str,
    ) -> impl Future<Output = CatalogResult<Option<ExtensionReleaseCompatibility>>> + Send;

    /// Returns the releases of a platform ordered by id.
    fn get_platform_releases(
        &self,
        platform_id: PlatformId,
    ) -> impl Future<Output = CatalogResult<Vec<PlatformRelease>>> + Send;

    /// Returns the extension links of a platform release ordered by id.
    fn get_platform_extensions_by_platform_release(
        &self,
        platform_release_id: PlatformReleaseId,
    ) -> impl Future<Output = CatalogResult<Vec<PlatformExtension>>> + Send;

    /// Returns the platform links of an extension release ordered by id.
    fn get_platform_extensions_by_extension_release(
        &self,
        extension_release_id: ExtensionReleaseId,
    ) -> impl Future<Output = CatalogResult<Vec<PlatformExtension>>> + Send;

    fn get_platform_release_categories(
        &self,
        platform_release_id: PlatformReleaseId,
    ) -> impl Future<Output = CatalogResult<Vec<PlatformReleaseCategory>>> + Send;

    fn get_catalog_stats(&self) -> impl Future<Output = CatalogResult<CatalogStats>> + Send;
}

/// Commits `uow` when `result` is `Ok`, rolls it back otherwise.
///
/// A failed rollback is logged and the original error is returned.
pub async fn commit_or_rollback<U, T>(uow: U, result: CatalogResult<T>) -> CatalogResult<T>
where
    U: UnitOfWork,
{
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "failed to roll back catalog unit of work");
            }
            Err(err)
        }
    }
}
