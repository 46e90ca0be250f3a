use catalog::error::ErrorKind;
use catalog::events::CatalogEvent;
use catalog::merge::orchestrator::CatalogMerger;
use catalog::store::base::{CatalogStats, CatalogStore};
use catalog::store::memory::MemoryStore;
use catalog::test_utils::fixtures::{extension_descriptor, quarkus_bom_descriptor};
use catalog::types::ExtensionReleaseId;
use catalog::workers::pool::MergeWorkerPool;
use catalog_config::shared::MergeConfig;
use catalog_telemetry::tracing::init_test_tracing;

fn merge_config(workers: u16) -> MergeConfig {
    MergeConfig {
        workers,
        queue_capacity: 8,
        max_conflict_retries: 3,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn pool_merges_every_queued_event() {
    init_test_tracing();
    let store = MemoryStore::new();
    let config = merge_config(4);
    let merger = CatalogMerger::new(store.clone(), &config);
    let graph = merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();
    let release_id = graph.extension_releases().next().unwrap().id;

    let (pool, sender) = MergeWorkerPool::start(merger.clone(), &config).unwrap();
    let events = [
        CatalogEvent::PlatformCreated {
            platform: quarkus_bom_descriptor(),
        },
        CatalogEvent::PlatformCreated {
            platform: quarkus_bom_descriptor(),
        },
        CatalogEvent::ExtensionCreated {
            extension: extension_descriptor("quarkus-grpc", "3.0.0"),
        },
        CatalogEvent::CompatibilityReported {
            extension_release_id: release_id,
            quarkus_core_version: "3.0.0".to_owned(),
            compatible: true,
        },
        // Fails and is dropped without stopping its worker.
        CatalogEvent::CompatibilityReported {
            extension_release_id: ExtensionReleaseId::new(4242),
            quarkus_core_version: "3.0.0".to_owned(),
            compatible: true,
        },
    ];
    for event in events {
        sender.send(event).await.unwrap();
    }

    // Workers stop once the queue is drained and every sender is gone.
    drop(sender);
    pool.wait().await.unwrap();

    assert_eq!(
        store.get_catalog_stats().await.unwrap(),
        CatalogStats {
            platforms: 1,
            platform_releases: 1,
            extensions: 2,
            extension_releases: 2,
            platform_extensions: 1,
            compatibilities: 1,
            ..Default::default()
        }
    );
    let map = merger
        .compatibility()
        .lookup_compatibility_map("3.0.0")
        .await
        .unwrap();
    assert_eq!(map.get(&release_id), Some(&true));
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_workers_and_closes_the_queue() {
    init_test_tracing();
    let config = merge_config(2);
    let merger = CatalogMerger::new(MemoryStore::new(), &config);

    let (pool, sender) = MergeWorkerPool::start(merger, &config).unwrap();
    pool.shutdown();
    pool.wait().await.unwrap();

    let err = sender
        .send(CatalogEvent::ExtensionCreated {
            extension: extension_descriptor("quarkus-grpc", "3.0.0"),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test(flavor = "multi_thread")]
async fn pool_rejects_invalid_config() {
    init_test_tracing();
    let config = merge_config(0);
    let merger = CatalogMerger::new(MemoryStore::new(), &config);

    let err = MergeWorkerPool::start(merger, &config).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_event_is_logged_and_dropped() {
    init_test_tracing();
    let store = MemoryStore::new();
    let merger = CatalogMerger::with_max_conflict_retries(store.clone(), 3);
    let mut malformed = quarkus_bom_descriptor();
    malformed.bom = None;

    merger
        .handle_event(CatalogEvent::PlatformCreated {
            platform: malformed,
        })
        .await;
    merger
        .handle_event(CatalogEvent::CompatibilityReported {
            extension_release_id: ExtensionReleaseId::new(7),
            quarkus_core_version: "3.0.0".to_owned(),
            compatible: false,
        })
        .await;

    assert_eq!(store.get_catalog_stats().await.unwrap(), CatalogStats::default());
}
