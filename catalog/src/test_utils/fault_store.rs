use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::bail;
use crate::error::{CatalogResult, ErrorKind};
use crate::store::base::{CatalogStats, CatalogStore, Repository, UnitOfWork};
use crate::types::{
    CompatibilityId, Entity, ExtensionReleaseCompatibility, ExtensionReleaseId,
    PlatformExtension, PlatformId, PlatformRelease, PlatformReleaseCategory, PlatformReleaseId,
};

#[derive(Debug, Default)]
struct Faults {
    /// Entity names whose next insert is preceded by a competing commit of the same row.
    races: Mutex<HashSet<&'static str>>,
    races_injected: AtomicU32,
    /// Entity name mapped to the 1-based insert attempt that fails.
    failing_inserts: Mutex<HashMap<&'static str, u32>>,
    insert_attempts: Mutex<HashMap<&'static str, u32>>,
    unavailable: AtomicBool,
}

impl Faults {
    fn take_race(&self, entity: &'static str) -> bool {
        self.races.lock().unwrap().remove(entity)
    }

    fn insert_should_fail(&self, entity: &'static str) -> bool {
        let mut attempts = self.insert_attempts.lock().unwrap();
        let attempt = attempts.entry(entity).or_default();
        *attempt += 1;

        self.failing_inserts.lock().unwrap().get(entity) == Some(attempt)
    }

    fn check_available(&self) -> CatalogResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!(
                ErrorKind::StorageUnavailable,
                "Catalog storage is unavailable",
                "storage outage injected by test"
            );
        }

        Ok(())
    }
}

/// Store wrapper that injects faults into the units of work of the wrapped store.
#[derive(Debug, Clone)]
pub struct FaultInjectingStore<S> {
    inner: S,
    faults: Arc<Faults>,
}

impl<S> FaultInjectingStore<S>
where
    S: CatalogStore,
{
    pub fn wrap(inner: S) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults::default()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Makes the next insert of an `E` lose a race.
    ///
    /// Right before the insert is delegated, the same row is inserted and committed through
    /// a separate unit of work, so the delegated insert (or its commit) hits the unique
    /// index. The row's parents must already be committed.
    pub fn race_next_insert<E: Entity>(&self) {
        self.faults.races.lock().unwrap().insert(E::NAME);
    }

    /// Number of competing commits injected so far.
    pub fn races_injected(&self) -> u32 {
        self.faults.races_injected.load(Ordering::SeqCst)
    }

    /// Fails the `attempt`-th insert (1-based, counted across units of work) of an `E`.
    pub fn fail_insert<E: Entity>(&self, attempt: u32) {
        self.faults
            .failing_inserts
            .lock()
            .unwrap()
            .insert(E::NAME, attempt);
    }

    /// Makes every call fail with [`ErrorKind::StorageUnavailable`] while `unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl<S> CatalogStore for FaultInjectingStore<S>
where
    S: CatalogStore,
{
    type UnitOfWork = FaultInjectingUnitOfWork<S>;

    async fn begin(&self) -> CatalogResult<Self::UnitOfWork> {
        self.faults.check_available()?;

        Ok(FaultInjectingUnitOfWork {
            inner: self.inner.begin().await?,
            store: self.inner.clone(),
            faults: self.faults.clone(),
        })
    }

    async fn get_compatibility_map(
        &self,
        quarkus_core_version: &str,
    ) -> CatalogResult<HashMap<ExtensionReleaseId, bool>> {
        self.faults.check_available()?;
        self.inner.get_compatibility_map(quarkus_core_version).await
    }

    async fn get_compatibility(
        &self,
        extension_release_id: ExtensionReleaseId,
        quarkus_core_version: &str,
    ) -> CatalogResult<Option<ExtensionReleaseCompatibility>> {
        self.faults.check_available()?;
        self.inner
            .get_compatibility(extension_release_id, quarkus_core_version)
            .await
    }

    async fn get_platform_releases(
        &self,
        platform_id: PlatformId,
    ) -> CatalogResult<Vec<PlatformRelease>> {
        self.faults.check_available()?;
        self.inner.get_platform_releases(platform_id).await
    }

    async fn get_platform_extensions_by_platform_release(
        &self,
        platform_release_id: PlatformReleaseId,
    ) -> CatalogResult<Vec<PlatformExtension>> {
        self.faults.check_available()?;
        self.inner
            .get_platform_extensions_by_platform_release(platform_release_id)
            .await
    }

    async fn get_platform_extensions_by_extension_release(
        &self,
        extension_release_id: ExtensionReleaseId,
    ) -> CatalogResult<Vec<PlatformExtension>> {
        self.faults.check_available()?;
        self.inner
            .get_platform_extensions_by_extension_release(extension_release_id)
            .await
    }

    async fn get_platform_release_categories(
        &self,
        platform_release_id: PlatformReleaseId,
    ) -> CatalogResult<Vec<PlatformReleaseCategory>> {
        self.faults.check_available()?;
        self.inner
            .get_platform_release_categories(platform_release_id)
            .await
    }

    async fn get_catalog_stats(&self) -> CatalogResult<CatalogStats> {
        self.faults.check_available()?;
        self.inner.get_catalog_stats().await
    }
}

pub struct FaultInjectingUnitOfWork<S: CatalogStore> {
    inner: S::UnitOfWork,
    store: S,
    faults: Arc<Faults>,
}

impl<S, E> Repository<E> for FaultInjectingUnitOfWork<S>
where
    S: CatalogStore,
    S::UnitOfWork: Repository<E>,
    E: Entity,
{
    async fn find_by_key(&mut self, key: &E::Key) -> CatalogResult<Option<E>> {
        <S::UnitOfWork as Repository<E>>::find_by_key(&mut self.inner, key).await
    }

    async fn insert(&mut self, draft: E::Draft) -> CatalogResult<E> {
        if self.faults.take_race(E::NAME) {
            let mut competitor = self.store.begin().await?;
            <S::UnitOfWork as Repository<E>>::insert(&mut competitor, draft.clone()).await?;
            competitor.commit().await?;
            self.faults.races_injected.fetch_add(1, Ordering::SeqCst);
        }

        if self.faults.insert_should_fail(E::NAME) {
            bail!(
                ErrorKind::StorageQueryFailed,
                "Catalog query failed",
                format!("insert of {} failed by test", E::NAME)
            );
        }

        <S::UnitOfWork as Repository<E>>::insert(&mut self.inner, draft).await
    }
}

impl<S> UnitOfWork for FaultInjectingUnitOfWork<S>
where
    S: CatalogStore,
{
    async fn update_compatibility(
        &mut self,
        id: CompatibilityId,
        compatible: bool,
    ) -> CatalogResult<ExtensionReleaseCompatibility> {
        self.inner.update_compatibility(id, compatible).await
    }

    async fn commit(self) -> CatalogResult<()> {
        self.faults.check_available()?;
        self.inner.commit().await
    }

    async fn rollback(self) -> CatalogResult<()> {
        self.inner.rollback().await
    }
}
