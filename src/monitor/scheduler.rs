//! Timer loop driving periodic refreshes and display ticks.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use super::pipeline::run_refresh;
use crate::config::Settings;
use crate::inspect::SystemInspector;
use crate::quota::QuotaProber;
use crate::state::SharedStore;

/// Message sent from the monitor loop to its consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A refresh attempt completed; re-read the view
    Updated,
    /// Display tick for countdown re-rendering; no network activity
    Tick,
}

/// Periodic refresh driver.
///
/// Ticks at a granularity strictly shorter than the refresh interval.
/// When the store's deadline elapses, the refresh runs in its own task so
/// that a slow probe never freezes countdown rendering; otherwise a
/// display-only tick is emitted.
#[derive(Clone)]
pub struct Monitor {
    store: SharedStore,
    inspector: Arc<dyn SystemInspector>,
    prober: Arc<QuotaProber>,
    tick_interval: Duration,
}

impl Monitor {
    /// Create a monitor over the given store and inspector.
    pub fn new(settings: &Settings, store: SharedStore, inspector: Arc<dyn SystemInspector>) -> Self {
        Self {
            store,
            inspector,
            prober: Arc::new(QuotaProber::new(Duration::from_secs(
                settings.probe_timeout_secs,
            ))),
            tick_interval: Duration::from_secs(settings.tick_interval_secs),
        }
    }

    /// Start the timer loop in a background task.
    pub fn start(&self) -> mpsc::Receiver<MonitorEvent> {
        let (tx, rx) = mpsc::channel(32);
        let monitor = self.clone();

        tokio::spawn(async move {
            monitor.run(tx).await;
        });

        rx
    }

    /// Run the timer loop until the receiver is dropped.
    async fn run(self, tx: mpsc::Sender<MonitorEvent>) {
        loop {
            tokio::time::sleep(self.tick_interval).await;

            if self.store.is_due() {
                let monitor = self.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if monitor.refresh_now().await {
                        let _ = tx.send(MonitorEvent::Updated).await;
                    }
                });
            } else if tx.send(MonitorEvent::Tick).await.is_err() {
                break; // Receiver dropped
            }
        }
    }

    /// Run one refresh attempt to completion.
    ///
    /// Returns false without side effects when another attempt is already
    /// in flight. The store's guard is released on every path because the
    /// pipeline always returns a definite outcome.
    pub async fn refresh_now(&self) -> bool {
        if !self.store.begin_refresh() {
            debug!("refresh already in flight, skipping");
            return false;
        }
        let outcome = run_refresh(self.inspector.as_ref(), &self.prober).await;
        self.store.complete_refresh(outcome);
        true
    }

    /// User-triggered refresh: runs regardless of the deadline, subject to
    /// the same in-flight guard. Fire-and-forget; consumers observe the
    /// result through the store.
    pub fn manual_refresh(&self) {
        let monitor = self.clone();
        tokio::spawn(async move {
            monitor.refresh_now().await;
        });
    }

    /// Store this monitor feeds
    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}
