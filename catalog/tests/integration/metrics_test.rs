use catalog::merge::orchestrator::CatalogMerger;
use catalog::metrics::{
    CATALOG_ENTITIES_CREATED_TOTAL, CATALOG_MERGE_DURATION_SECONDS, CATALOG_MERGES_TOTAL,
};
use catalog::store::memory::MemoryStore;
use catalog::test_utils::fixtures::quarkus_bom_descriptor;
use catalog_telemetry::metrics::init_metrics_handle;
use catalog_telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn merges_are_exported_to_prometheus() {
    init_test_tracing();
    let handle = init_metrics_handle().unwrap();
    let merger = CatalogMerger::with_max_conflict_retries(MemoryStore::new(), 3);

    merger.merge_platform(&quarkus_bom_descriptor()).await.unwrap();

    let rendered = handle.render();
    assert!(rendered.contains(CATALOG_MERGES_TOTAL));
    assert!(rendered.contains(CATALOG_ENTITIES_CREATED_TOTAL));
    assert!(rendered.contains(CATALOG_MERGE_DURATION_SECONDS));
    assert!(rendered.contains(r#"outcome="committed""#));
}
