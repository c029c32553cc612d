//! Periodic retention sweeper.
//!
//! Runs [`ArtifactStore::sweep`] on a fixed interval (first run immediately)
//! until told to stop. Each sweep runs on the blocking pool since it walks
//! the filesystem synchronously.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument};

use docport_core::defaults::SWEEP_INTERVAL_SECS;
use docport_core::{Error, Result};
use docport_store::{ArtifactStore, SweepReport};

pub struct Sweeper {
    store: Arc<ArtifactStore>,
    interval: Duration,
}

/// Handle for stopping a running sweeper.
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for its task to finish.
    ///
    /// A sweep already in progress completes first.
    pub async fn shutdown(self) -> Result<()> {
        // The task may already have exited; joining below still succeeds.
        let _ = self.shutdown_tx.send(()).await;
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Sweeper task failed: {}", e)))
    }
}

impl Sweeper {
    pub fn new(store: Arc<ArtifactStore>, interval: Duration) -> Self {
        Self {
            store,
            interval: if interval.is_zero() {
                Duration::from_secs(SWEEP_INTERVAL_SECS)
            } else {
                interval
            },
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the periodic task. Returns `None` under infinite retention,
    /// where there is never anything to sweep.
    pub fn start(self) -> Option<SweeperHandle> {
        if self.store.retention().is_infinite() {
            info!("Retention is infinite, sweeper not started");
            return None;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        Some(SweeperHandle { shutdown_tx, task })
    }

    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            retention_hours = ?self.store.retention().hours(),
            root = %self.store.root().display(),
            "Sweeper started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Sweeper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }

        info!("Sweeper stopped");
    }

    async fn sweep_once(&self) -> Option<SweepReport> {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.sweep(SystemTime::now())).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = ?e, "Sweep task panicked");
                None
            }
        }
    }
}
