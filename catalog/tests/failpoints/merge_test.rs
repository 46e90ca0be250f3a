use catalog::error::{CatalogError, ErrorKind};
use catalog::failpoints::{
    ASSOCIATION_BUILDER__BEFORE_LINK_CATEGORY, ASSOCIATION_BUILDER__BEFORE_LINK_EXTENSION,
    MERGE__BEFORE_COMMIT,
};
use catalog::merge::orchestrator::CatalogMerger;
use catalog::store::base::{CatalogStats, CatalogStore};
use catalog::store::memory::MemoryStore;
use catalog::test_utils::failpoints::CustomFailScenario;
use catalog::test_utils::fixtures::{extension_descriptor, platform_descriptor};
use catalog_telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn failure_between_links_persists_nothing() {
    init_test_tracing();
    let _scenario =
        CustomFailScenario::setup(&[(ASSOCIATION_BUILDER__BEFORE_LINK_EXTENSION, "1*off->return")]);
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);

    let err = merger
        .merge_platform(&platform_descriptor("3.0.0", 2, 0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FailpointTriggered);
    // Neither the platform, its release nor the first link survived.
    assert_eq!(store.get_catalog_stats().await.unwrap(), CatalogStats::default());
}

#[tokio::test(flavor = "multi_thread")]
async fn storage_failure_while_linking_categories_persists_nothing() {
    init_test_tracing();
    let _scenario = CustomFailScenario::setup(&[(
        ASSOCIATION_BUILDER__BEFORE_LINK_CATEGORY,
        "return(storage)",
    )]);
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);

    let err = merger
        .merge_platform(&platform_descriptor("3.0.0", 2, 1))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    assert_eq!(store.get_catalog_stats().await.unwrap(), CatalogStats::default());
}

#[tokio::test(flavor = "multi_thread")]
async fn persistent_conflicts_exhaust_retries() {
    init_test_tracing();
    let _scenario = CustomFailScenario::setup(&[(MERGE__BEFORE_COMMIT, "return(conflict)")]);
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 2);

    let err = merger
        .merge_extension(&extension_descriptor("quarkus-grpc", "3.0.0"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConflictRetriesExhausted);
    let source = std::error::Error::source(&err)
        .and_then(|source| source.downcast_ref::<CatalogError>())
        .unwrap();
    assert_eq!(source.kind(), ErrorKind::UniqueViolation);
    assert_eq!(store.get_catalog_stats().await.unwrap(), CatalogStats::default());
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_conflicts_are_retried_until_commit() {
    init_test_tracing();
    let _scenario =
        CustomFailScenario::setup(&[(MERGE__BEFORE_COMMIT, "2*return(conflict)->off")]);
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);

    let graph = merger
        .merge_platform(&platform_descriptor("3.0.0", 1, 1))
        .await
        .unwrap();

    // Rows of the two rolled back attempts were discarded, so the third one created all.
    assert_eq!(graph.created().total(), 7);
    assert_eq!(
        store.get_catalog_stats().await.unwrap(),
        CatalogStats {
            platforms: 1,
            platform_releases: 1,
            extensions: 1,
            extension_releases: 1,
            platform_extensions: 1,
            categories: 1,
            platform_release_categories: 1,
            compatibilities: 0,
        }
    );
}
