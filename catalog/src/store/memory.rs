use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::Mutex;
use tracing::debug;

use crate::bail;
use crate::catalog_error;
use crate::error::{CatalogResult, ErrorKind};
use crate::store::base::{CatalogStats, CatalogStore, Repository, UnitOfWork};
use crate::types::{
    Category, CompatibilityId, CompatibilityKey, Entity, Extension, ExtensionRelease,
    ExtensionReleaseCompatibility, ExtensionReleaseId, Platform, PlatformExtension, PlatformId,
    PlatformRelease, PlatformReleaseCategory, PlatformReleaseId, SurrogateId,
};

/// Rows of one entity type with a unique index on the natural key.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: BTreeMap<E::Id, E>,
    by_key: HashMap<E::Key, E::Id>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<E: Entity> Table<E> {
    fn get(&self, id: E::Id) -> Option<&E> {
        self.rows.get(&id)
    }

    fn get_by_key(&self, key: &E::Key) -> Option<&E> {
        self.by_key.get(key).and_then(|id| self.rows.get(id))
    }

    fn contains(&self, id: E::Id) -> bool {
        self.rows.contains_key(&id)
    }

    /// Inserts `row`, replacing any row with the same id.
    fn put(&mut self, row: E) {
        let id = row.id();
        if let Some(previous) = self.rows.get(&id) {
            self.by_key.remove(&previous.key());
        }
        self.by_key.insert(row.key(), id);
        self.rows.insert(id, row);
    }

    /// Returns the first row of `self` whose key is held by a different row in `committed`.
    fn first_conflict(&self, committed: &Table<E>) -> Option<&E> {
        self.rows.values().find(|row| {
            committed
                .by_key
                .get(&row.key())
                .is_some_and(|id| *id != row.id())
        })
    }

    fn apply_to(self, committed: &mut Table<E>) {
        for row in self.rows.into_values() {
            committed.put(row);
        }
    }

    fn filter(&self, predicate: impl Fn(&E) -> bool) -> Vec<E> {
        self.rows
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
struct Tables {
    platforms: Table<Platform>,
    platform_releases: Table<PlatformRelease>,
    extensions: Table<Extension>,
    extension_releases: Table<ExtensionRelease>,
    platform_extensions: Table<PlatformExtension>,
    categories: Table<Category>,
    platform_release_categories: Table<PlatformReleaseCategory>,
    compatibilities: Table<ExtensionReleaseCompatibility>,
}

impl Tables {
    /// Returns the entity name and key of the first staged row that collides with a
    /// committed one.
    fn first_conflict(&self, committed: &Tables) -> Option<(&'static str, String)> {
        fn describe<E: Entity>(row: &E) -> (&'static str, String) {
            (E::NAME, format!("{:?}", row.key()))
        }

        self.platforms
            .first_conflict(&committed.platforms)
            .map(describe)
            .or_else(|| {
                self.platform_releases
                    .first_conflict(&committed.platform_releases)
                    .map(describe)
            })
            .or_else(|| self.extensions.first_conflict(&committed.extensions).map(describe))
            .or_else(|| {
                self.extension_releases
                    .first_conflict(&committed.extension_releases)
                    .map(describe)
            })
            .or_else(|| {
                self.platform_extensions
                    .first_conflict(&committed.platform_extensions)
                    .map(describe)
            })
            .or_else(|| self.categories.first_conflict(&committed.categories).map(describe))
            .or_else(|| {
                self.platform_release_categories
                    .first_conflict(&committed.platform_release_categories)
                    .map(describe)
            })
            .or_else(|| {
                self.compatibilities
                    .first_conflict(&committed.compatibilities)
                    .map(describe)
            })
    }

    fn apply_to(self, committed: &mut Tables) {
        self.platforms.apply_to(&mut committed.platforms);
        self.platform_releases
            .apply_to(&mut committed.platform_releases);
        self.extensions.apply_to(&mut committed.extensions);
        self.extension_releases
            .apply_to(&mut committed.extension_releases);
        self.platform_extensions
            .apply_to(&mut committed.platform_extensions);
        self.categories.apply_to(&mut committed.categories);
        self.platform_release_categories
            .apply_to(&mut committed.platform_release_categories);
        self.compatibilities.apply_to(&mut committed.compatibilities);
    }
}

/// Binds an entity type to its table and checks the rows it references.
///
/// [`memory_entity!`] also derives the [`Repository`] implementation of
/// [`MemoryUnitOfWork`] from it.
trait MemoryEntity: Entity {
    fn table(tables: &Tables) -> &Table<Self>;

    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;

    /// Fails with [`ErrorKind::MissingReference`] when a referenced row is neither
    /// committed nor staged.
    fn check_references(
        _draft: &Self::Draft,
        _committed: &Tables,
        _staged: &Tables,
    ) -> CatalogResult<()> {
        Ok(())
    }
}

fn require<P: MemoryEntity>(id: P::Id, committed: &Tables, staged: &Tables) -> CatalogResult<()> {
    if P::table(committed).contains(id) || P::table(staged).contains(id) {
        return Ok(());
    }

    bail!(
        ErrorKind::MissingReference,
        "Referenced catalog entity does not exist",
        format!("{} {id} does not exist", P::NAME)
    );
}

macro_rules! memory_entity {
    ($entity:ty, $field:ident) => {
        memory_entity!($entity, $field, |_draft, _committed, _staged| Ok(()));
    };
    ($entity:ty, $field:ident, |$draft:ident, $committed:ident, $staged:ident| $check:expr) => {
        impl MemoryEntity for $entity {
            fn table(tables: &Tables) -> &Table<Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
                &mut tables.$field
            }

            fn check_references(
                $draft: &Self::Draft,
                $committed: &Tables,
                $staged: &Tables,
            ) -> CatalogResult<()> {
                $check
            }
        }

        impl Repository<$entity> for MemoryUnitOfWork {
            async fn find_by_key(
                &mut self,
                key: &<$entity as Entity>::Key,
            ) -> CatalogResult<Option<$entity>> {
                self.find_row::<$entity>(key).await
            }

            async fn insert(
                &mut self,
                draft: <$entity as Entity>::Draft,
            ) -> CatalogResult<$entity> {
                self.insert_row::<$entity>(draft).await
            }
        }
    };
}

memory_entity!(Platform, platforms);
memory_entity!(PlatformRelease, platform_releases, |draft, committed, staged| {
    require::<Platform>(draft.platform_id, committed, staged)
});
memory_entity!(Extension, extensions);
memory_entity!(ExtensionRelease, extension_releases, |draft, committed, staged| {
    require::<Extension>(draft.extension_id, committed, staged)
});
memory_entity!(
    PlatformExtension,
    platform_extensions,
    |draft, committed, staged| {
        require::<PlatformRelease>(draft.platform_release_id, committed, staged)?;
        require::<ExtensionRelease>(draft.extension_release_id, committed, staged)
    }
);
memory_entity!(Category, categories);
memory_entity!(
    PlatformReleaseCategory,
    platform_release_categories,
    |draft, committed, staged| {
        require::<PlatformRelease>(draft.platform_release_id, committed, staged)?;
        require::<Category>(draft.category_id, committed, staged)
    }
);
memory_entity!(
    ExtensionReleaseCompatibility,
    compatibilities,
    |draft, committed, staged| {
        require::<ExtensionRelease>(draft.extension_release_id, committed, staged)
    }
);

#[derive(Debug, Default)]
struct Inner {
    committed: Tables,
}

/// In-memory catalog store.
///
/// Each unit of work stages its rows privately and publishes them on commit after checking
/// every staged natural key against the committed unique indexes. A unit of work that lost
/// a race therefore fails its commit with [`ErrorKind::UniqueViolation`], the same signal
/// the Postgres store raises. Surrogate ids come from one shared counter and are never
/// reused, even for rolled back rows.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for MemoryStore {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin(&self) -> CatalogResult<Self::UnitOfWork> {
        Ok(MemoryUnitOfWork {
            inner: self.inner.clone(),
            next_id: self.next_id.clone(),
            staged: Tables::default(),
        })
    }

    async fn get_compatibility_map(
        &self,
        quarkus_core_version: &str,
    ) -> CatalogResult<HashMap<ExtensionReleaseId, bool>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .committed
            .compatibilities
            .rows
            .values()
            .filter(|row| row.quarkus_core_version == quarkus_core_version)
            .map(|row| (row.extension_release_id, row.compatible))
            .collect())
    }

    async fn get_compatibility(
        &self,
        extension_release_id: ExtensionReleaseId,
        quarkus_core_version: &str,
    ) -> CatalogResult<Option<ExtensionReleaseCompatibility>> {
        let inner = self.inner.lock().await;
        let key = CompatibilityKey {
            extension_release_id,
            quarkus_core_version: quarkus_core_version.to_owned(),
        };

        Ok(inner.committed.compatibilities.get_by_key(&key).cloned())
    }

    async fn get_platform_releases(
        &self,
        platform_id: PlatformId,
    ) -> CatalogResult<Vec<PlatformRelease>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .committed
            .platform_releases
            .filter(|row| row.platform_id == platform_id))
    }

    async fn get_platform_extensions_by_platform_release(
        &self,
        platform_release_id: PlatformReleaseId,
    ) -> CatalogResult<Vec<PlatformExtension>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .committed
            .platform_extensions
            .filter(|row| row.platform_release_id == platform_release_id))
    }

    async fn get_platform_extensions_by_extension_release(
        &self,
        extension_release_id: ExtensionReleaseId,
    ) -> CatalogResult<Vec<PlatformExtension>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .committed
            .platform_extensions
            .filter(|row| row.extension_release_id == extension_release_id))
    }

    async fn get_platform_release_categories(
        &self,
        platform_release_id: PlatformReleaseId,
    ) -> CatalogResult<Vec<PlatformReleaseCategory>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .committed
            .platform_release_categories
            .filter(|row| row.platform_release_id == platform_release_id))
    }

    async fn get_catalog_stats(&self) -> CatalogResult<CatalogStats> {
        let inner = self.inner.lock().await;
        let tables = &inner.committed;

        Ok(CatalogStats {
            platforms: tables.platforms.rows.len() as u64,
            platform_releases: tables.platform_releases.rows.len() as u64,
            extensions: tables.extensions.rows.len() as u64,
            extension_releases: tables.extension_releases.rows.len() as u64,
            platform_extensions: tables.platform_extensions.rows.len() as u64,
            categories: tables.categories.rows.len() as u64,
            platform_release_categories: tables.platform_release_categories.rows.len() as u64,
            compatibilities: tables.compatibilities.rows.len() as u64,
        })
    }
}

/// Unit of work of a [`MemoryStore`].
///
/// Dropping it without calling [`UnitOfWork::commit`] discards the staged rows.
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    inner: Arc<Mutex<Inner>>,
    next_id: Arc<AtomicI64>,
    staged: Tables,
}

impl MemoryUnitOfWork {
    async fn find_row<E: MemoryEntity>(&mut self, key: &E::Key) -> CatalogResult<Option<E>> {
        if let Some(row) = E::table(&self.staged).get_by_key(key) {
            return Ok(Some(row.clone()));
        }

        let inner = self.inner.lock().await;

        Ok(E::table(&inner.committed).get_by_key(key).cloned())
    }

    async fn insert_row<E: MemoryEntity>(&mut self, draft: E::Draft) -> CatalogResult<E> {
        let key = E::draft_key(&draft);

        {
            let inner = self.inner.lock().await;
            if E::table(&inner.committed).get_by_key(&key).is_some()
                || E::table(&self.staged).get_by_key(&key).is_some()
            {
                bail!(
                    ErrorKind::UniqueViolation,
                    "Natural key was inserted concurrently",
                    format!("{} {key:?} already exists", E::NAME)
                );
            }

            E::check_references(&draft, &inner.committed, &self.staged)?;
        }

        let id = E::Id::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        let row = E::from_draft(id, draft);
        E::table_mut(&mut self.staged).put(row.clone());

        Ok(row)
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    async fn update_compatibility(
        &mut self,
        id: CompatibilityId,
        compatible: bool,
    ) -> CatalogResult<ExtensionReleaseCompatibility> {
        let current = match self.staged.compatibilities.get(id) {
            Some(row) => row.clone(),
            None => {
                let inner = self.inner.lock().await;
                inner
                    .committed
                    .compatibilities
                    .get(id)
                    .cloned()
                    .ok_or_else(|| {
                        catalog_error!(
                            ErrorKind::MissingReference,
                            "Referenced catalog entity does not exist",
                            format!("{} {id} does not exist", ExtensionReleaseCompatibility::NAME)
                        )
                    })?
            }
        };

        let updated = ExtensionReleaseCompatibility {
            compatible,
            ..current
        };
        self.staged.compatibilities.put(updated.clone());

        Ok(updated)
    }

    async fn commit(self) -> CatalogResult<()> {
        let mut inner = self.inner.lock().await;

        if let Some((entity, key)) = self.staged.first_conflict(&inner.committed) {
            bail!(
                ErrorKind::UniqueViolation,
                "Natural key was inserted concurrently",
                format!("{entity} {key} was committed by another unit of work")
            );
        }

        debug!("committing memory unit of work");
        self.staged.apply_to(&mut inner.committed);

        Ok(())
    }

    async fn rollback(self) -> CatalogResult<()> {
        Ok(())
    }
}
