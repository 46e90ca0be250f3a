//! In-memory view of the entities touched by one merge.
//!
//! Entities live in per-type arenas keyed by surrogate id. Ownership points one way
//! (a release knows its platform id); the reverse direction is kept in explicit indexes
//! that the association builder fills as links are made, so both sides of a link are
//! observable as soon as it exists.

use std::collections::{BTreeMap, BTreeSet};

use crate::merge::upsert::Upserted;
use crate::types::entity::{
    Category, Entity, Extension, ExtensionRelease, Platform, PlatformExtension,
    PlatformRelease, PlatformReleaseCategory,
};
use crate::types::ids::{
    CategoryId, ExtensionId, ExtensionReleaseId, PlatformExtensionId, PlatformId,
    PlatformReleaseCategoryId, PlatformReleaseId,
};

/// Number of rows a merge inserted, per entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreatedCounts {
    pub platforms: u64,
    pub platform_releases: u64,
    pub extensions: u64,
    pub extension_releases: u64,
    pub platform_extensions: u64,
    pub categories: u64,
    pub platform_release_categories: u64,
}

impl CreatedCounts {
    pub fn total(&self) -> u64 {
        self.platforms
            + self.platform_releases
            + self.extensions
            + self.extension_releases
            + self.platform_extensions
            + self.categories
            + self.platform_release_categories
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogGraph {
    platforms: BTreeMap<PlatformId, Platform>,
    platform_releases: BTreeMap<PlatformReleaseId, PlatformRelease>,
    extensions: BTreeMap<ExtensionId, Extension>,
    extension_releases: BTreeMap<ExtensionReleaseId, ExtensionRelease>,
    categories: BTreeMap<CategoryId, Category>,
    platform_extensions: BTreeMap<PlatformExtensionId, PlatformExtension>,
    platform_release_categories: BTreeMap<PlatformReleaseCategoryId, PlatformReleaseCategory>,

    releases_by_platform: BTreeMap<PlatformId, BTreeSet<PlatformReleaseId>>,
    extensions_by_platform_release: BTreeMap<PlatformReleaseId, BTreeSet<PlatformExtensionId>>,
    platforms_by_extension_release: BTreeMap<ExtensionReleaseId, BTreeSet<PlatformExtensionId>>,
    categories_by_platform_release:
        BTreeMap<PlatformReleaseId, BTreeSet<PlatformReleaseCategoryId>>,

    created: CreatedCounts,
}

impl CatalogGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_platform(&mut self, upserted: Upserted<Platform>) -> PlatformId {
        if upserted.is_created() {
            self.created.platforms += 1;
        }
        let platform = upserted.into_inner();
        let id = platform.id();
        self.releases_by_platform.entry(id).or_default();
        self.platforms.insert(id, platform);

        id
    }

    pub fn add_platform_release(
        &mut self,
        upserted: Upserted<PlatformRelease>,
    ) -> PlatformReleaseId {
        if upserted.is_created() {
            self.created.platform_releases += 1;
        }
        let release = upserted.into_inner();
        let id = release.id();
        self.releases_by_platform
            .entry(release.platform_id)
            .or_default()
            .insert(id);
        self.extensions_by_platform_release.entry(id).or_default();
        self.categories_by_platform_release.entry(id).or_default();
        self.platform_releases.insert(id, release);

        id
    }

    pub fn add_extension(&mut self, upserted: Upserted<Extension>) -> ExtensionId {
        if upserted.is_created() {
            self.created.extensions += 1;
        }
        let extension = upserted.into_inner();
        let id = extension.id();
        self.extensions.insert(id, extension);

        id
    }

    pub fn add_extension_release(
        &mut self,
        upserted: Upserted<ExtensionRelease>,
    ) -> ExtensionReleaseId {
        if upserted.is_created() {
            self.created.extension_releases += 1;
        }
        let release = upserted.into_inner();
        let id = release.id();
        self.platforms_by_extension_release.entry(id).or_default();
        self.extension_releases.insert(id, release);

        id
    }

    pub fn add_category(&mut self, upserted: Upserted<Category>) -> CategoryId {
        if upserted.is_created() {
            self.created.categories += 1;
        }
        let category = upserted.into_inner();
        let id = category.id();
        self.categories.insert(id, category);

        id
    }

    /// Records a platform extension link on both of its sides.
    pub fn add_platform_extension(
        &mut self,
        upserted: Upserted<PlatformExtension>,
    ) -> PlatformExtensionId {
        if upserted.is_created() {
            self.created.platform_extensions += 1;
        }
        let link = upserted.into_inner();
        let id = link.id();
        self.extensions_by_platform_release
            .entry(link.platform_release_id)
            .or_default()
            .insert(id);
        self.platforms_by_extension_release
            .entry(link.extension_release_id)
            .or_default()
            .insert(id);
        self.platform_extensions.insert(id, link);

        id
    }

    pub fn add_platform_release_category(
        &mut self,
        upserted: Upserted<PlatformReleaseCategory>,
    ) -> PlatformReleaseCategoryId {
        if upserted.is_created() {
            self.created.platform_release_categories += 1;
        }
        let link = upserted.into_inner();
        let id = link.id();
        self.categories_by_platform_release
            .entry(link.platform_release_id)
            .or_default()
            .insert(id);
        self.platform_release_categories.insert(id, link);

        id
    }

    pub fn created(&self) -> &CreatedCounts {
        &self.created
    }

    pub fn platform(&self, id: PlatformId) -> Option<&Platform> {
        self.platforms.get(&id)
    }

    pub fn platform_release(&self, id: PlatformReleaseId) -> Option<&PlatformRelease> {
        self.platform_releases.get(&id)
    }

    pub fn extension(&self, id: ExtensionId) -> Option<&Extension> {
        self.extensions.get(&id)
    }

    pub fn extension_release(&self, id: ExtensionReleaseId) -> Option<&ExtensionRelease> {
        self.extension_releases.get(&id)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn platforms(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.values()
    }

    pub fn platform_releases(&self) -> impl Iterator<Item = &PlatformRelease> {
        self.platform_releases.values()
    }

    pub fn extension_releases(&self) -> impl Iterator<Item = &ExtensionRelease> {
        self.extension_releases.values()
    }

    pub fn platform_extensions(&self) -> impl Iterator<Item = &PlatformExtension> {
        self.platform_extensions.values()
    }

    pub fn platform_release_categories(&self) -> impl Iterator<Item = &PlatformReleaseCategory> {
        self.platform_release_categories.values()
    }

    /// Releases of `platform` touched by this merge.
    pub fn releases_of_platform(
        &self,
        platform: PlatformId,
    ) -> impl Iterator<Item = &PlatformRelease> {
        resolve(&self.releases_by_platform, &platform, &self.platform_releases)
    }

    /// Extension links of a platform release.
    pub fn extensions_of_platform_release(
        &self,
        release: PlatformReleaseId,
    ) -> impl Iterator<Item = &PlatformExtension> {
        resolve(
            &self.extensions_by_platform_release,
            &release,
            &self.platform_extensions,
        )
    }

    /// Platform links of an extension release. Empty for standalone releases.
    pub fn platforms_of_extension_release(
        &self,
        release: ExtensionReleaseId,
    ) -> impl Iterator<Item = &PlatformExtension> {
        resolve(
            &self.platforms_by_extension_release,
            &release,
            &self.platform_extensions,
        )
    }

    pub fn categories_of_platform_release(
        &self,
        release: PlatformReleaseId,
    ) -> impl Iterator<Item = &PlatformReleaseCategory> {
        resolve(
            &self.categories_by_platform_release,
            &release,
            &self.platform_release_categories,
        )
    }
}

fn resolve<'a, K, I, V>(
    index: &'a BTreeMap<K, BTreeSet<I>>,
    key: &K,
    arena: &'a BTreeMap<I, V>,
) -> impl Iterator<Item = &'a V> + use<'a, K, I, V>
where
    K: Ord,
    I: Ord,
{
    index
        .get(key)
        .into_iter()
        .flatten()
        .filter_map(|id| arena.get(id))
}
