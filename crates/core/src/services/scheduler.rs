use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::services::price_sync_service::SyncReport;
use crate::HoldingsTracker;

/// Result of one timer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(SyncReport),
    /// The cycle ran but persisting its result failed
    Failed(String),
    /// Another cycle was still in flight; this tick did nothing
    Skipped,
}

/// Runs price sync cycles on a timer without ever overlapping them.
///
/// The tracker sits behind an async mutex so host actions (add, edit,
/// settings) and sync cycles are serialized. A tick that finds a cycle in
/// flight is skipped, not queued.
pub struct SyncScheduler {
    tracker: Arc<Mutex<HoldingsTracker>>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a cycle ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncScheduler {
    pub fn new(tracker: HoldingsTracker) -> Self {
        Self::from_shared(Arc::new(Mutex::new(tracker)))
    }

    pub fn from_shared(tracker: Arc<Mutex<HoldingsTracker>>) -> Self {
        Self {
            tracker,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Handle to the tracker for host actions between ticks.
    pub fn tracker(&self) -> Arc<Mutex<HoldingsTracker>> {
        Arc::clone(&self.tracker)
    }

    pub fn is_cycle_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one sync cycle unless one is already running.
    pub async fn tick(&self) -> CycleOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("Sync cycle still in flight, skipping tick");
            return CycleOutcome::Skipped;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let mut tracker = self.tracker.lock().await;
        match tracker.refresh_prices().await {
            Ok(report) => CycleOutcome::Completed(report),
            Err(e) => {
                warn!(error = %e, "Sync cycle failed");
                CycleOutcome::Failed(e.to_string())
            }
        }
    }

    /// Tick now, then every `refresh_mins` (re-read from settings before each
    /// wait) until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            self.tick().await;

            let period = self.tracker.lock().await.settings().refresh_interval();
            debug!(secs = period.as_secs(), "Next sync scheduled");

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Sync scheduler stopped");
                    break;
                }
                _ = tokio::time::sleep(period) => {}
            }
        }
    }
}
