use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{client::ExplorerApi, models::SyncInfo};

/// Periodically refreshes the backend's indexing progress.
pub struct SyncStatusPoller {
    api: Arc<dyn ExplorerApi>,
    interval: Duration,
}

impl SyncStatusPoller {
    pub fn new(api: Arc<dyn ExplorerApi>, interval: Duration) -> Self {
        Self { api, interval }
    }

    /// Fetches immediately, then every `interval` until the handle is stopped or dropped.
    pub fn start(&self) -> SyncPollerHandle {
        let (latest_tx, latest_rx) = watch::channel(None);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let api = self.api.clone();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            tracing::info!("sync poller started (every {:?})", interval);
            // Fixed rate; the first tick fires immediately
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }
                let result = tokio::select! {
                    result = api.blockchain_info() => result,
                    _ = shutdown_rx.changed() => break,
                };
                match result {
                    Ok(info) => {
                        tracing::debug!(
                            "sync {}/{} ({}%)",
                            info.current_block_number,
                            info.last_block_number,
                            info.progress_percent()
                        );
                        latest_tx.send_replace(Some(info));
                    }
                    // Keep showing the last known progress
                    Err(err) => tracing::debug!("sync status fetch failed: {}", err),
                }
            }
            tracing::info!("sync poller stopped");
        });

        SyncPollerHandle {
            latest: latest_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Running poller. Dropping it cancels the timer.
pub struct SyncPollerHandle {
    latest: watch::Receiver<Option<SyncInfo>>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl SyncPollerHandle {
    pub fn latest(&self) -> Option<SyncInfo> {
        *self.latest.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SyncInfo>> {
        self.latest.clone()
    }

    /// Stops polling and waits for the loop to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::error!("sync poller task failed: {}", err);
            }
        }
    }
}

impl Drop for SyncPollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
