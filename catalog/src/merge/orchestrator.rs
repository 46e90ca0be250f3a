use catalog_config::shared::MergeConfig;
use metrics::{counter, histogram};
use std::time::Instant;
use tracing::{Instrument, error, info, info_span};

use crate::compatibility::CompatibilityIndex;
use crate::error::CatalogResult;
use crate::events::{CatalogEvent, EXTENSION_KIND, PLATFORM_KIND};
use crate::failpoints::{MERGE__BEFORE_COMMIT, catalog_fail_point};
use crate::merge::association::{
    link_category_to_platform_release, link_extension_to_platform_release,
};
use crate::merge::retry::retry_on_conflict;
use crate::merge::upsert::{
    upsert_category, upsert_extension, upsert_extension_release, upsert_platform,
    upsert_platform_release,
};
use crate::metrics::{
    CATALOG_ENTITIES_CREATED_TOTAL, CATALOG_MERGE_DURATION_SECONDS, CATALOG_MERGES_TOTAL,
    ENTITY_LABEL, ERROR_KIND_LABEL, KIND_LABEL, OUTCOME_LABEL,
};
use crate::store::base::{CatalogStore, UnitOfWork, commit_or_rollback};
use crate::types::{
    ArtifactCoords, CatalogGraph, Category, CategoryDescriptor, CreatedCounts, Entity, Extension,
    ExtensionDescriptor, ExtensionRelease, ExtensionReleaseId, Metadata, Platform,
    PlatformDescriptor, PlatformExtension, PlatformRelease, PlatformReleaseCategory,
};

/// Entry point for merging descriptors into the catalog.
///
/// Every merge validates its descriptor, then runs in one unit of work that is committed
/// only if every upsert and link succeeded. A merge that loses a race on a natural key is
/// re-run from scratch, up to `max_conflict_retries` times.
#[derive(Debug, Clone)]
pub struct CatalogMerger<S> {
    store: S,
    compatibility: CompatibilityIndex<S>,
    max_conflict_retries: u32,
}

impl<S> CatalogMerger<S>
where
    S: CatalogStore,
{
    pub fn new(store: S, config: &MergeConfig) -> Self {
        Self::with_max_conflict_retries(store, config.max_conflict_retries)
    }

    pub fn with_max_conflict_retries(store: S, max_conflict_retries: u32) -> Self {
        Self {
            compatibility: CompatibilityIndex::new(store.clone(), max_conflict_retries),
            store,
            max_conflict_retries,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn compatibility(&self) -> &CompatibilityIndex<S> {
        &self.compatibility
    }

    /// Merges a platform release with its member extensions and categories.
    ///
    /// Returns the graph of every entity the merge resolved or created. On error nothing
    /// of this merge is persisted.
    pub async fn merge_platform(
        &self,
        descriptor: &PlatformDescriptor,
    ) -> CatalogResult<CatalogGraph> {
        let started = Instant::now();
        let result = async {
            let bom = descriptor.validate()?;

            retry_on_conflict(PLATFORM_KIND, self.max_conflict_retries, || {
                self.try_merge_platform(descriptor, bom)
            })
            .await
        }
        .await;

        record_merge(PLATFORM_KIND, &result, started);
        if let Ok(graph) = &result {
            info!(
                extensions = descriptor.extensions.len(),
                categories = descriptor.categories.len(),
                created = graph.created().total(),
                "merged platform"
            );
        }

        result
    }

    async fn try_merge_platform(
        &self,
        descriptor: &PlatformDescriptor,
        bom: &ArtifactCoords,
    ) -> CatalogResult<CatalogGraph> {
        let mut uow = self.store.begin().await?;
        let result = apply_platform(&mut uow, descriptor, bom).await;

        commit_or_rollback(uow, result).await
    }

    /// Merges an extension released outside of any platform.
    ///
    /// Creates at most the extension and its release; no platform link is made.
    pub async fn merge_extension(
        &self,
        descriptor: &ExtensionDescriptor,
    ) -> CatalogResult<CatalogGraph> {
        let started = Instant::now();
        let result = async {
            descriptor.validate()?;

            retry_on_conflict(EXTENSION_KIND, self.max_conflict_retries, || {
                self.try_merge_extension(descriptor)
            })
            .await
        }
        .await;

        record_merge(EXTENSION_KIND, &result, started);
        if let Ok(graph) = &result {
            info!(created = graph.created().total(), "merged extension");
        }

        result
    }

    async fn try_merge_extension(
        &self,
        descriptor: &ExtensionDescriptor,
    ) -> CatalogResult<CatalogGraph> {
        let mut uow = self.store.begin().await?;
        let result = apply_standalone_extension(&mut uow, descriptor).await;

        commit_or_rollback(uow, result).await
    }

    /// Handles one event from the event source.
    ///
    /// Errors are logged and dropped: the event source has no channel to receive them and
    /// redelivery, if any, is its own concern.
    pub async fn handle_event(&self, event: CatalogEvent) {
        let span = info_span!("catalog_merge", kind = event.kind(), event = %event);

        async {
            let result = match &event {
                CatalogEvent::PlatformCreated { platform } => {
                    self.merge_platform(platform).await.map(|_| ())
                }
                CatalogEvent::ExtensionCreated { extension } => {
                    self.merge_extension(extension).await.map(|_| ())
                }
                CatalogEvent::CompatibilityReported {
                    extension_release_id,
                    quarkus_core_version,
                    compatible,
                } => self
                    .compatibility
                    .record(*extension_release_id, quarkus_core_version, *compatible)
                    .await
                    .map(|_| ()),
            };

            if let Err(err) = result {
                error!(
                    error = %err,
                    error_kind = ?err.kind(),
                    "dropping catalog event after failed merge"
                );
            }
        }
        .instrument(span)
        .await
    }
}

/// Materializes a platform descriptor inside `uow`.
///
/// `bom` must be the validated bom coordinate of `descriptor`.
pub async fn apply_platform<U>(
    uow: &mut U,
    descriptor: &PlatformDescriptor,
    bom: &ArtifactCoords,
) -> CatalogResult<CatalogGraph>
where
    U: UnitOfWork,
{
    let mut graph = CatalogGraph::new();

    let platform = upsert_platform(uow, bom).await?;
    let platform_id = graph.add_platform(platform);
    let release = upsert_platform_release(uow, platform_id, bom, descriptor).await?;
    let release_id = graph.add_platform_release(release);

    // Members and categories are upserted in natural-key order so that overlapping merges
    // lock shared keys in the same order. The sort is stable: of two equal members the
    // first one listed provides the link metadata.
    let mut extensions: Vec<&ExtensionDescriptor> = descriptor.extensions.iter().collect();
    extensions.sort_by(|a, b| a.artifact.cmp(&b.artifact));
    let mut categories: Vec<&CategoryDescriptor> = descriptor.categories.iter().collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));

    for extension in extensions {
        let extension_release_id = apply_extension(uow, &mut graph, extension).await?;
        link_extension_to_platform_release(
            uow,
            &mut graph,
            release_id,
            extension_release_id,
            &Metadata::from_map(&extension.metadata),
        )
        .await?;
    }

    for category in categories {
        let category_id = graph.add_category(upsert_category(uow, category).await?);
        link_category_to_platform_release(
            uow,
            &mut graph,
            release_id,
            category_id,
            &Metadata::from_map(&category.metadata),
        )
        .await?;
    }

    catalog_fail_point(MERGE__BEFORE_COMMIT)?;

    Ok(graph)
}

/// Materializes a standalone extension descriptor inside `uow`.
pub async fn apply_standalone_extension<U>(
    uow: &mut U,
    descriptor: &ExtensionDescriptor,
) -> CatalogResult<CatalogGraph>
where
    U: UnitOfWork,
{
    let mut graph = CatalogGraph::new();
    apply_extension(uow, &mut graph, descriptor).await?;

    catalog_fail_point(MERGE__BEFORE_COMMIT)?;

    Ok(graph)
}

async fn apply_extension<U>(
    uow: &mut U,
    graph: &mut CatalogGraph,
    descriptor: &ExtensionDescriptor,
) -> CatalogResult<ExtensionReleaseId>
where
    U: UnitOfWork,
{
    let extension = upsert_extension(uow, descriptor).await?;
    let extension_id = graph.add_extension(extension);
    let release = upsert_extension_release(uow, extension_id, &descriptor.artifact).await?;

    Ok(graph.add_extension_release(release))
}

fn record_merge(kind: &'static str, result: &CatalogResult<CatalogGraph>, started: Instant) {
    histogram!(CATALOG_MERGE_DURATION_SECONDS, KIND_LABEL => kind)
        .record(started.elapsed().as_secs_f64());

    match result {
        Ok(graph) => {
            counter!(CATALOG_MERGES_TOTAL, KIND_LABEL => kind, OUTCOME_LABEL => "committed")
                .increment(1);
            record_created(graph.created());
        }
        Err(err) => {
            counter!(
                CATALOG_MERGES_TOTAL,
                KIND_LABEL => kind,
                OUTCOME_LABEL => "failed",
                ERROR_KIND_LABEL => format!("{:?}", err.kind()),
            )
            .increment(1);
        }
    }
}

fn record_created(created: &CreatedCounts) {
    let counts = [
        (Platform::NAME, created.platforms),
        (PlatformRelease::NAME, created.platform_releases),
        (Extension::NAME, created.extensions),
        (ExtensionRelease::NAME, created.extension_releases),
        (PlatformExtension::NAME, created.platform_extensions),
        (Category::NAME, created.categories),
        (PlatformReleaseCategory::NAME, created.platform_release_categories),
    ];

    for (entity, count) in counts {
        if count > 0 {
            counter!(CATALOG_ENTITIES_CREATED_TOTAL, ENTITY_LABEL => entity).increment(count);
        }
    }
}
