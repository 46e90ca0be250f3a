use catalog_config::shared::MergeConfig;
use metrics::gauge;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span};

use crate::catalog_error;
use crate::concurrency::shutdown::{ShutdownRx, ShutdownTx, create_shutdown_channel};
use crate::error::{CatalogError, CatalogResult, ErrorKind};
use crate::events::CatalogEvent;
use crate::merge::orchestrator::CatalogMerger;
use crate::metrics::CATALOG_QUEUED_EVENTS;
use crate::store::base::CatalogStore;

type SharedReceiver = Arc<Mutex<mpsc::Receiver<CatalogEvent>>>;

/// Producer handle of the merge queue.
///
/// Cloneable; the workers stop once every sender is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct CatalogEventSender {
    tx: mpsc::Sender<CatalogEvent>,
}

impl CatalogEventSender {
    /// Enqueues an event, waiting while the queue is full.
    ///
    /// Fails with [`ErrorKind::InvalidState`] once every worker has stopped.
    pub async fn send(&self, event: CatalogEvent) -> CatalogResult<()> {
        if self.tx.send(event).await.is_err() {
            return Err(catalog_error!(
                ErrorKind::InvalidState,
                "Merge worker pool is not running"
            ));
        }
        record_queued_events(self.queued());

        Ok(())
    }

    /// Number of events waiting in the queue.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

/// Publishes the queue depth as read from the channel.
fn record_queued_events(depth: usize) {
    gauge!(CATALOG_QUEUED_EVENTS).set(depth as f64);
}

/// Fixed set of tasks merging catalog events from a bounded queue.
///
/// Events are consumed in queue order but merged concurrently, so two events may complete
/// in any order. Failed merges are logged by [`CatalogMerger::handle_event`] and never
/// re-queued.
#[derive(Debug)]
pub struct MergeWorkerPool {
    join_set: JoinSet<()>,
    shutdown_tx: ShutdownTx,
}

impl MergeWorkerPool {
    /// Spawns `config.workers` workers on the current runtime.
    pub fn start<S>(
        merger: CatalogMerger<S>,
        config: &MergeConfig,
    ) -> CatalogResult<(Self, CatalogEventSender)>
    where
        S: CatalogStore,
    {
        if let Err(err) = config.validate() {
            return Err(catalog_error!(
                ErrorKind::ConfigError,
                "Invalid merge configuration",
                err.to_string(),
                source: err
            ));
        }

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let rx: SharedReceiver = Arc::new(Mutex::new(rx));
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

        let mut join_set = JoinSet::new();
        for worker_id in 0..config.workers {
            let span = info_span!("merge_worker", worker_id);
            let worker = run_worker(merger.clone(), rx.clone(), shutdown_rx.clone());
            join_set.spawn(worker.instrument(span));
        }

        info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "started merge worker pool"
        );

        Ok((
            Self {
                join_set,
                shutdown_tx,
            },
            CatalogEventSender { tx },
        ))
    }

    /// Asks every worker to stop after the event it is currently merging.
    ///
    /// Events still queued are not merged.
    pub fn shutdown(&self) {
        self.shutdown_tx.shutdown();
    }

    /// Waits for every worker to stop.
    ///
    /// Returns an error of kind [`ErrorKind::MergeWorkerPanic`] for every worker that
    /// panicked, aggregated into one error.
    pub async fn wait(mut self) -> CatalogResult<()> {
        let mut errors: Vec<CatalogError> = Vec::new();

        while let Some(result) = self.join_set.join_next().await {
            if let Err(err) = result {
                error!(error = %err, "merge worker terminated abnormally");
                errors.push(catalog_error!(
                    ErrorKind::MergeWorkerPanic,
                    "A merge worker terminated abnormally",
                    err.to_string()
                ));
            }
        }

        // Events still queued after a shutdown were dropped with the receiver.
        record_queued_events(0);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}

async fn run_worker<S>(merger: CatalogMerger<S>, rx: SharedReceiver, mut shutdown_rx: ShutdownRx)
where
    S: CatalogStore,
{
    loop {
        let event = {
            let mut rx = rx.lock().await;
            let event = tokio::select! {
                biased;

                _ = shutdown_rx.wait() => None,
                event = rx.recv() => event,
            };
            record_queued_events(rx.len());

            event
        };

        let Some(event) = event else {
            break;
        };

        merger.handle_event(event).await;
    }

    debug!("merge worker stopped");
}
