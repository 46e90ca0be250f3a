use catalog::error::ErrorKind;
use catalog::merge::orchestrator::CatalogMerger;
use catalog::store::base::{CatalogStats, CatalogStore, Repository, UnitOfWork};
use catalog::test_utils::database::spawn_catalog_database;
use catalog::test_utils::fault_store::FaultInjectingStore;
use catalog::test_utils::fixtures::{
    PLATFORM_ARTIFACT_ID, PLATFORM_GROUP_ID, extension_descriptor,
    overlapping_platform_descriptors, platform_descriptor, quarkus_bom_descriptor,
};
use catalog::types::{ExtensionReleaseId, NewPlatform, Platform, PlatformExtension};
use catalog_telemetry::tracing::init_test_tracing;
use futures::future::join_all;
use serde_json::Value;

#[tokio::test(flavor = "multi_thread")]
async fn replayed_platform_is_idempotent() {
    init_test_tracing();
    let database = spawn_catalog_database().await;
    let store = database.store();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);

    let first = merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();
    let second = merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();

    assert_eq!(first.created().total(), 5);
    assert_eq!(second.created().total(), 0);
    assert_eq!(
        store.get_catalog_stats().await.unwrap(),
        CatalogStats {
            platforms: 1,
            platform_releases: 1,
            extensions: 1,
            extension_releases: 1,
            platform_extensions: 1,
            ..Default::default()
        }
    );

    database.cleanup().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_merges_create_each_row_once() {
    init_test_tracing();
    let database = spawn_catalog_database().await;
    let store = database.store();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 5);
    let descriptor = platform_descriptor("3.2.0", 3, 2);

    let handles = (0..6).map(|_| {
        let merger = merger.clone();
        let descriptor = descriptor.clone();
        tokio::spawn(async move { merger.merge_platform(&descriptor).await })
    });
    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    assert_eq!(
        store.get_catalog_stats().await.unwrap(),
        CatalogStats {
            platforms: 1,
            platform_releases: 1,
            extensions: 3,
            extension_releases: 3,
            platform_extensions: 3,
            categories: 2,
            platform_release_categories: 2,
            compatibilities: 0,
        }
    );

    database.cleanup().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn overlapping_platforms_merged_concurrently_both_commit() {
    init_test_tracing();
    let database = spawn_catalog_database().await;
    let store = database.store();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);
    let iterations = 40;
    let members = 20;
    let categories = 3;

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

    database.cleanup().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn lost_race_surfaces_as_unique_violation_and_is_retried() {
    init_test_tracing();
    let database = spawn_catalog_database().await;
    let store = FaultInjectingStore::wrap(database.store());
    store.race_next_insert::<Platform>();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);

    let graph = merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();

    assert_eq!(store.races_injected(), 1);
    assert_eq!(graph.created().platforms, 0);
    assert_eq!(store.get_catalog_stats().await.unwrap().platforms, 1);

    database.cleanup().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_insert_is_a_unique_violation() {
    init_test_tracing();
    let database = spawn_catalog_database().await;
    let store = database.store();
    let draft = NewPlatform {
        group_id: PLATFORM_GROUP_ID.to_owned(),
        artifact_id: PLATFORM_ARTIFACT_ID.to_owned(),
    };

    let mut uow = store.begin().await.unwrap();
    <_ as Repository<Platform>>::insert(&mut uow, draft.clone())
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let mut uow = store.begin().await.unwrap();
    let err = <_ as Repository<Platform>>::insert(&mut uow, draft)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UniqueViolation);
    uow.rollback().await.unwrap();

    database.cleanup().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_link_rolls_back_the_transaction() {
    init_test_tracing();
    let database = spawn_catalog_database().await;
    let store = FaultInjectingStore::wrap(database.store());
    store.fail_insert::<PlatformExtension>(2);
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);

    let err = merger
        .merge_platform(&platform_descriptor("3.3.0", 2, 0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StorageQueryFailed);
    assert_eq!(store.get_catalog_stats().await.unwrap(), CatalogStats::default());

    database.cleanup().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn metadata_is_stored_verbatim() {
    init_test_tracing();
    let database = spawn_catalog_database().await;
    let store = database.store();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);
    let descriptor = platform_descriptor("3.4.0", 2, 1);

    let graph = merger.merge_platform(&descriptor).await.unwrap();
    let release = graph.platform_releases().next().unwrap();

    let links = store
        .get_platform_extensions_by_platform_release(release.id)
        .await
        .unwrap();
    assert_eq!(links.len(), 2);
    for (link, member) in links.iter().zip(&descriptor.extensions) {
        assert_eq!(
            link.metadata.as_value(),
            &Value::Object(member.metadata.clone())
        );
    }

    let releases = store
        .get_platform_releases(release.platform_id)
        .await
        .unwrap();
    assert_eq!(releases, vec![release.clone()]);

    database.cleanup().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn standalone_extension_and_compatibility_round_trip() {
    init_test_tracing();
    let database = spawn_catalog_database().await;
    let store = database.store();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);

    let graph = merger
        .merge_extension(&extension_descriptor("quarkus-grpc", "3.0.0"))
        .await
        .unwrap();
    let release_id = graph.extension_releases().next().unwrap().id;
    assert!(
        store
            .get_platform_extensions_by_extension_release(release_id)
            .await
            .unwrap()
            .is_empty()
    );

    let index = merger.compatibility();
    index.record(release_id, "3.0.0", true).await.unwrap();
    index.record(release_id, "3.0.0", false).await.unwrap();

    let map = index.lookup_compatibility_map("3.0.0").await.unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&release_id), Some(&false));
    assert!(index.lookup_compatibility_map("2.0.0").await.unwrap().is_empty());

    let err = index
        .record(ExtensionReleaseId::new(i64::MAX), "3.0.0", true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingReference);

    database.cleanup().await;
}
