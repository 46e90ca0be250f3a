use catalog::error::ErrorKind;
use catalog::merge::orchestrator::CatalogMerger;
use catalog::store::base::CatalogStore;
use catalog::store::memory::MemoryStore;
use catalog::test_utils::fault_store::FaultInjectingStore;
use catalog::test_utils::fixtures::{extension_descriptor, quarkus_bom_descriptor};
use catalog::types::{ExtensionReleaseCompatibility, ExtensionReleaseId};
use catalog_telemetry::tracing::init_test_tracing;

async fn merged_extension_release<S>(merger: &CatalogMerger<S>) -> ExtensionReleaseId
where
    S: CatalogStore,
{
    let graph = merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();
    graph.extension_releases().next().unwrap().id
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_returns_verdicts_of_the_requested_core_version_only() {
    init_test_tracing();
    let merger = CatalogMerger::with_max_conflict_retries(MemoryStore::new(), 3);
    let release_id = merged_extension_release(&merger).await;
    let index = merger.compatibility();

    index.record(release_id, "3.0.0", true).await.unwrap();

    let map = index.lookup_compatibility_map("3.0.0").await.unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&release_id), Some(&true));
    assert!(index.lookup_compatibility_map("2.0.0").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn latest_report_wins() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);
    let release_id = merged_extension_release(&merger).await;
    let index = merger.compatibility();

    let first = index.record(release_id, "3.1.0", true).await.unwrap();
    let second = index.record(release_id, "3.1.0", false).await.unwrap();
    let replayed = index.record(release_id, "3.1.0", false).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second, replayed);
    assert_eq!(
        index.get(release_id, "3.1.0").await.unwrap(),
        Some(ExtensionReleaseCompatibility {
            id: first.id,
            extension_release_id: release_id,
            quarkus_core_version: "3.1.0".to_owned(),
            compatible: false,
        })
    );
    assert_eq!(store.get_catalog_stats().await.unwrap().compatibilities, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn verdicts_of_several_releases_are_read_in_one_map() {
    init_test_tracing();
    let merger = CatalogMerger::with_max_conflict_retries(MemoryStore::new(), 3);
    let resteasy = merged_extension_release(&merger).await;
    let graph = merger
        .merge_extension(&extension_descriptor("quarkus-grpc", "3.0.0"))
        .await
        .unwrap();
    let grpc = graph.extension_releases().next().unwrap().id;
    let index = merger.compatibility();

    index.record(resteasy, "3.0.0", true).await.unwrap();
    index.record(grpc, "3.0.0", false).await.unwrap();
    index.record(grpc, "3.2.0", true).await.unwrap();

    let map = index.lookup_compatibility_map("3.0.0").await.unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map[&resteasy], true);
    assert_eq!(map[&grpc], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn report_for_unknown_release_is_rejected() {
    init_test_tracing();
    let merger = CatalogMerger::with_max_conflict_retries(MemoryStore::new(), 3);

    let err = merger
        .compatibility()
        .record(ExtensionReleaseId::new(4242), "3.0.0", true)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingReference);
}

#[tokio::test(flavor = "multi_thread")]
async fn report_with_blank_core_version_is_rejected() {
    init_test_tracing();
    let merger = CatalogMerger::with_max_conflict_retries(MemoryStore::new(), 3);
    let release_id = merged_extension_release(&merger).await;

    let err = merger
        .compatibility()
        .record(release_id, "  ", true)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
}

#[tokio::test(flavor = "multi_thread")]
async fn unavailable_store_is_an_error_not_an_empty_map() {
    init_test_tracing();
    let store = FaultInjectingStore::wrap(MemoryStore::new());
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);
    let release_id = merged_extension_release(&merger).await;
    merger
        .compatibility()
        .record(release_id, "3.0.0", true)
        .await
        .unwrap();

    store.set_unavailable(true);
    let err = merger
        .compatibility()
        .lookup_compatibility_map("3.0.0")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
}
