use catalog::error::ErrorKind;
use catalog::merge::orchestrator::CatalogMerger;
use catalog::store::base::{CatalogStats, CatalogStore, Repository, UnitOfWork};
use catalog::store::memory::MemoryStore;
use catalog::test_utils::fault_store::FaultInjectingStore;
use catalog::test_utils::fixtures::{
    EXTENSION_GROUP_ID, extension_descriptor, overlapping_platform_descriptors,
    platform_descriptor, quarkus_bom_descriptor,
};
use catalog::types::{
    CreatedCounts, Extension, ExtensionRelease, NewExtension, Platform, PlatformExtension,
};
use catalog_telemetry::tracing::init_test_tracing;
use futures::future::join_all;
use serde_json::Value;

const MAX_CONFLICT_RETRIES: u32 = 3;

fn scenario_stats() -> CatalogStats {
    CatalogStats {
        platforms: 1,
        platform_releases: 1,
        extensions: 1,
        extension_releases: 1,
        platform_extensions: 1,
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn sequential_replays_of_a_platform_are_idempotent() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);

    let first = merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();
    let second = merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();

    assert_eq!(first.created().total(), 5);
    assert_eq!(second.created(), &CreatedCounts::default());
    assert_eq!(store.get_catalog_stats().await.unwrap(), scenario_stats());

    // The second merge resolved the rows of the first one.
    let first_links: Vec<_> = first.platform_extensions().cloned().collect();
    let second_links: Vec<_> = second.platform_extensions().cloned().collect();
    assert_eq!(first_links, second_links);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_replays_of_a_platform_are_idempotent() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);

    let handles = (0..2).map(|_| {
        let merger = merger.clone();
        tokio::spawn(async move { merger.merge_platform(&quarkus_bom_descriptor()).await })
    });
    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    assert_eq!(store.get_catalog_stats().await.unwrap(), scenario_stats());
}

#[tokio::test(flavor = "multi_thread")]
async fn many_concurrent_merges_of_one_platform_create_each_row_once() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);
    let descriptor = platform_descriptor("3.2.0", 4, 2);

    let handles = (0..16).map(|_| {
        let merger = merger.clone();
        let descriptor = descriptor.clone();
        tokio::spawn(async move { merger.merge_platform(&descriptor).await })
    });
    let graphs: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|result| result.unwrap().unwrap())
        .collect();

    let created_platforms: u64 = graphs.iter().map(|g| g.created().platforms).sum();
    assert_eq!(created_platforms, 1);

    let stats = store.get_catalog_stats().await.unwrap();
    assert_eq!(
        stats,
        CatalogStats {
            platforms: 1,
            platform_releases: 1,
            extensions: 4,
            extension_releases: 4,
            platform_extensions: 4,
            categories: 2,
            platform_release_categories: 2,
            compatibilities: 0,
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn overlapping_platforms_merged_concurrently_share_their_members() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);
    let iterations = 20;
    let members = 8;
    let categories = 2;

    for i in 0..iterations {
        let (first, second) = overlapping_platform_descriptors(i, members, categories);

        let (first, second) = tokio::join!(
            merger.merge_platform(&first),
            merger.merge_platform(&second)
        );
        first.unwrap();
        second.unwrap();
    }

    let iterations = iterations as u64;
    let members = members as u64;
    let categories = categories as u64;
    assert_eq!(
        store.get_catalog_stats().await.unwrap(),
        CatalogStats {
            platforms: 2 * iterations,
            platform_releases: 2 * iterations,
            extensions: members * iterations,
            extension_releases: members * iterations,
            platform_extensions: 2 * members * iterations,
            categories: categories * iterations,
            platform_release_categories: 2 * categories * iterations,
            compatibilities: 0,
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn lost_race_on_platform_is_retried_and_resolves_the_winner() {
    init_test_tracing();
    let store = FaultInjectingStore::wrap(MemoryStore::new());
    store.race_next_insert::<Platform>();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);

    let graph = merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();

    assert_eq!(store.races_injected(), 1);
    // The platform was committed by the competitor, everything else by this merge.
    assert_eq!(graph.created().platforms, 0);
    assert_eq!(graph.created().platform_releases, 1);
    assert_eq!(store.get_catalog_stats().await.unwrap(), scenario_stats());
}

#[tokio::test(flavor = "multi_thread")]
async fn lost_race_on_extension_release_is_retried() {
    init_test_tracing();
    let store = FaultInjectingStore::wrap(MemoryStore::new());

    // The extension must be committed for the competing release insert to succeed.
    let mut uow = store.inner().begin().await.unwrap();
    <_ as Repository<Extension>>::insert(
        &mut uow,
        NewExtension {
            group_id: EXTENSION_GROUP_ID.to_owned(),
            artifact_id: "quarkus-resteasy".to_owned(),
            name: "RESTEasy Classic".to_owned(),
            description: None,
        },
    )
    .await
    .unwrap();
    uow.commit().await.unwrap();

    store.race_next_insert::<ExtensionRelease>();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);

    let graph = merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();

    assert_eq!(store.races_injected(), 1);
    assert_eq!(graph.created().extension_releases, 0);
    assert_eq!(graph.created().platform_extensions, 1);
    assert_eq!(store.get_catalog_stats().await.unwrap(), scenario_stats());
}

#[tokio::test(flavor = "multi_thread")]
async fn standalone_extension_has_no_platform_links() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);

    let graph = merger
        .merge_extension(&extension_descriptor("quarkus-hibernate-orm", "3.0.0"))
        .await
        .unwrap();

    assert_eq!(graph.created().extensions, 1);
    assert_eq!(graph.created().extension_releases, 1);
    assert_eq!(graph.created().platform_extensions, 0);

    let release = graph.extension_releases().next().unwrap();
    assert_eq!(graph.platforms_of_extension_release(release.id).count(), 0);
    assert!(
        store
            .get_platform_extensions_by_extension_release(release.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn standalone_extension_is_later_linked_by_a_platform() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);

    let standalone = merger
        .merge_extension(&extension_descriptor("extension-0", "3.1.0"))
        .await
        .unwrap();
    let platform = merger
        .merge_platform(&platform_descriptor("3.1.0", 1, 0))
        .await
        .unwrap();

    let release = standalone.extension_releases().next().unwrap();
    assert_eq!(platform.created().extension_releases, 0);
    assert_eq!(
        store
            .get_platform_extensions_by_extension_release(release.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn platform_links_carry_descriptor_metadata_verbatim() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);
    let descriptor = platform_descriptor("3.3.0", 3, 2);

    let graph = merger.merge_platform(&descriptor).await.unwrap();

    let release = graph.platform_releases().next().unwrap();
    let links = store
        .get_platform_extensions_by_platform_release(release.id)
        .await
        .unwrap();
    assert_eq!(links.len(), 3);
    for (link, member) in links.iter().zip(&descriptor.extensions) {
        let extension_release = graph.extension_release(link.extension_release_id).unwrap();
        assert_eq!(extension_release.version, member.artifact.version);
        assert_eq!(
            link.metadata.as_value(),
            &Value::Object(member.metadata.clone())
        );
    }

    let categories = store
        .get_platform_release_categories(release.id)
        .await
        .unwrap();
    assert_eq!(categories.len(), 2);
    for (link, category) in categories.iter().zip(&descriptor.categories) {
        assert_eq!(
            link.metadata.as_value(),
            &Value::Object(category.metadata.clone())
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn replay_with_changed_metadata_keeps_the_first_write() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);
    let descriptor = platform_descriptor("3.4.0", 1, 0);
    let original = descriptor.extensions[0].metadata.clone();

    let mut changed = descriptor.clone();
    changed.extensions[0]
        .metadata
        .insert("status".to_owned(), Value::String("deprecated".to_owned()));

    merger.merge_platform(&descriptor).await.unwrap();
    let graph = merger.merge_platform(&changed).await.unwrap();

    let link: &PlatformExtension = graph.platform_extensions().next().unwrap();
    assert_eq!(link.metadata.as_value(), &Value::Object(original));
}

#[tokio::test(flavor = "multi_thread")]
async fn graph_is_navigable_from_both_sides() {
    init_test_tracing();
    let merger = CatalogMerger::with_max_conflict_retries(MemoryStore::new(), MAX_CONFLICT_RETRIES);

    let graph = merger
        .merge_platform(&platform_descriptor("3.5.0", 2, 1))
        .await
        .unwrap();

    let platform = graph.platforms().next().unwrap();
    let releases: Vec<_> = graph.releases_of_platform(platform.id).collect();
    assert_eq!(releases.len(), 1);
    let release = releases[0];
    assert_eq!(graph.platform(release.platform_id), Some(platform));

    let links: Vec<_> = graph.extensions_of_platform_release(release.id).collect();
    assert_eq!(links.len(), 2);
    for link in links {
        let platforms: Vec<_> = graph
            .platforms_of_extension_release(link.extension_release_id)
            .collect();
        assert_eq!(platforms, vec![link]);
    }
    assert_eq!(graph.categories_of_platform_release(release.id).count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_link_discards_the_whole_merge() {
    init_test_tracing();
    let store = FaultInjectingStore::wrap(MemoryStore::new());
    store.fail_insert::<PlatformExtension>(2);
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);

    let err = merger
        .merge_platform(&platform_descriptor("3.6.0", 3, 1))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StorageQueryFailed);
    assert_eq!(store.get_catalog_stats().await.unwrap(), CatalogStats::default());
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_descriptors_are_rejected_before_any_write() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);

    let mut missing_bom = quarkus_bom_descriptor();
    missing_bom.bom = None;
    let mut blank_member = platform_descriptor("3.7.0", 2, 0);
    blank_member.extensions[1].artifact.artifact_id = " ".to_owned();
    let mut unnamed = extension_descriptor("quarkus-grpc", "3.7.0");
    unnamed.name = String::new();

    for descriptor in [missing_bom, blank_member] {
        let err = merger.merge_platform(&descriptor).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
    }
    let err = merger.merge_extension(&unnamed).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);

    assert_eq!(store.get_catalog_stats().await.unwrap(), CatalogStats::default());
}

#[tokio::test(flavor = "multi_thread")]
async fn unavailable_store_fails_the_merge() {
    init_test_tracing();
    let store = FaultInjectingStore::wrap(MemoryStore::new());
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), MAX_CONFLICT_RETRIES);

    store.set_unavailable(true);
    let err = merger
        .merge_platform(&quarkus_bom_descriptor())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);

    store.set_unavailable(false);
    merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();
    assert_eq!(store.get_catalog_stats().await.unwrap(), scenario_stats());
}
