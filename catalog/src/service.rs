use catalog_config::shared::CatalogConfig;
use tracing::{error, info};

use crate::catalog_error;
use crate::error::{CatalogResult, ErrorKind};
use crate::merge::orchestrator::CatalogMerger;
use crate::store::configured::ConfiguredStore;
use crate::workers::pool::{CatalogEventSender, MergeWorkerPool};

/// A running catalog merge engine built from a [`CatalogConfig`].
///
/// Owns the configured store, the merger and the worker pool consuming the event queue.
#[derive(Debug)]
pub struct CatalogService {
    merger: CatalogMerger<ConfiguredStore>,
    pool: MergeWorkerPool,
    sender: CatalogEventSender,
}

impl CatalogService {
    /// Validates `config`, connects the store and starts the merge workers.
    pub async fn start(config: &CatalogConfig) -> CatalogResult<Self> {
        if let Err(err) = config.validate() {
            return Err(catalog_error!(
                ErrorKind::ConfigError,
                "Invalid catalog configuration",
                err.to_string(),
                source: err
            ));
        }

        // One connection per worker, plus one for reads issued outside the pool.
        let max_connections = u32::from(config.merge.workers) + 1;
        let store = ConfiguredStore::connect(&config.store, max_connections).await?;

        let merger = CatalogMerger::new(store, &config.merge);
        let (pool, sender) = MergeWorkerPool::start(merger.clone(), &config.merge)?;

        info!("catalog service started");

        Ok(Self {
            merger,
            pool,
            sender,
        })
    }

    /// Returns a producer handle for the event queue.
    pub fn sender(&self) -> CatalogEventSender {
        self.sender.clone()
    }

    pub fn merger(&self) -> &CatalogMerger<ConfiguredStore> {
        &self.merger
    }

    pub fn shutdown(&self) {
        info!("shutting down catalog service");
        self.pool.shutdown();
    }

    /// Waits for the workers to stop.
    ///
    /// Workers stop after [`CatalogService::shutdown`], or once the queue is drained and
    /// every sender handed out by [`CatalogService::sender`] is dropped.
    pub async fn wait(self) -> CatalogResult<()> {
        drop(self.sender);

        let result = self.pool.wait().await;
        if let Err(err) = &result {
            error!(error = %err, "catalog service stopped with errors");
        }

        result
    }

    pub async fn shutdown_and_wait(self) -> CatalogResult<()> {
        self.shutdown();
        self.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CatalogEvent;
    use crate::store::base::CatalogStore;
    use crate::test_utils::fixtures::quarkus_bom_descriptor;
    use catalog_config::shared::{MergeConfig, StoreConfig};

    fn memory_config(workers: u16) -> CatalogConfig {
        CatalogConfig {
            store: StoreConfig::Memory,
            merge: MergeConfig {
                workers,
                ..MergeConfig::default()
            },
        }
    }

    #[tokio::test]
    async fn service_merges_events_until_senders_are_dropped() {
        let service = CatalogService::start(&memory_config(2)).await.unwrap();
        let sender = service.sender();
        let store = service.merger().store().clone();

        sender
            .send(CatalogEvent::PlatformCreated {
                platform: quarkus_bom_descriptor(),
            })
            .await
            .unwrap();
        drop(sender);
        service.wait().await.unwrap();

        assert_eq!(store.get_catalog_stats().await.unwrap().platform_extensions, 1);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_connecting() {
        let err = CatalogService::start(&memory_config(0)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[tokio::test]
    async fn shutdown_and_wait_stops_the_workers() {
        let service = CatalogService::start(&memory_config(1)).await.unwrap();

        service.shutdown_and_wait().await.unwrap();
    }
}
