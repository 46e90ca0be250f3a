//! Shutdown signalling for the merge worker pool.
//!
//! Wraps a tokio watch channel so that every worker observes the same shutdown request,
//! including workers that start waiting after the request was sent.

use tokio::sync::watch;

/// Transmitter side of the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<bool>);

impl ShutdownTx {
    /// Requests shutdown. Receivers subscribed later still observe the request.
    pub fn shutdown(&self) {
        self.0.send_replace(true);
    }

    /// Creates a new receiver subscribed to this signal.
    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.0.subscribe())
    }
}

/// Receiver side of the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

impl ShutdownRx {
    /// Returns `true` once shutdown was requested.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown is requested or the transmitter is dropped.
    pub async fn wait(&mut self) {
        // An error means the sender was dropped, which is treated as a shutdown.
        let _ = self.0.wait_for(|requested| *requested).await;
    }
}

/// Creates a new shutdown channel in the "running" state.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx(tx), ShutdownRx(rx))
}
