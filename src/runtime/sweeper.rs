//! Background expiry of unanswered offers.
//!
//! Each sweep expires awaited offers older than the TTL and immediately tries to
//! re-offer the affected tasks. Re-offering obeys the dispatcher's offer limit,
//! so a task nobody accepts stops circulating once the limit is reached.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};

use super::Spawn;
use crate::core::{DispatchError, Dispatcher, TaskId};

/// Shortest sweep interval; smaller values are raised to it.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Tasks whose awaited offer expired.
    pub expired: Vec<TaskId>,
    /// Expired tasks offered to another scout.
    pub reoffered: Vec<TaskId>,
    /// Expired tasks left unassigned (no scout, limit reached, or pass-on disabled).
    pub unplaced: Vec<TaskId>,
}

impl SweepReport {
    /// True when nothing expired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty()
    }
}

/// Expire stale offers as of `now` and re-offer their tasks.
pub fn sweep_once(dispatcher: &Dispatcher, now: DateTime<Utc>, ttl: chrono::Duration) -> SweepReport {
    let mut report = SweepReport {
        expired: dispatcher.expire_stale(now, ttl),
        ..SweepReport::default()
    };
    for &task in &report.expired {
        match dispatcher.reoffer(task) {
            Ok(request) => {
                tracing::info!(task, scout = request.scout_id, "expired task re-offered");
                report.reoffered.push(task);
            }
            Err(
                e @ (DispatchError::NoEligibleScout
                | DispatchError::OfferLimitReached { .. }
                | DispatchError::ReofferNotAllowed(_)),
            ) => {
                tracing::warn!(task, reason = %e, "expired task left unassigned");
                report.unplaced.push(task);
            }
            Err(e) => {
                tracing::error!(task, error = %e, "re-offer after expiry failed");
                report.unplaced.push(task);
            }
        }
    }
    report
}

/// Control handle for a running sweeper.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    reports: mpsc::UnboundedReceiver<SweepReport>,
}

impl SweeperHandle {
    /// Ask the sweeper to stop after its current sweep.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Wait for the next non-empty sweep report; `None` once the sweeper stopped.
    pub async fn next_report(&mut self) -> Option<SweepReport> {
        self.reports.recv().await
    }
}

/// Run `sweep_once` every `interval` on the given spawner until stopped.
///
/// Each sweep runs on tokio's blocking pool since it takes task locks and may
/// write notifications to disk. `interval` is raised to [`MIN_SWEEP_INTERVAL`].
pub fn spawn_expiry_sweeper<S: Spawn>(
    dispatcher: Arc<Dispatcher>,
    spawner: &S,
    ttl: chrono::Duration,
    interval: Duration,
) -> SweeperHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);
    let (tx, reports) = mpsc::unbounded_channel();
    let interval = interval.max(MIN_SWEEP_INTERVAL);

    spawner.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        tracing::info!(ttl_secs = ttl.num_seconds(), ?interval, "expiry sweeper started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
            let sweeping = Arc::clone(&dispatcher);
            let report = match tokio::task::spawn_blocking(move || {
                sweep_once(&sweeping, Utc::now(), ttl)
            })
            .await
            {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %e, "expiry sweep failed");
                    continue;
                }
            };
            if !report.is_empty() && tx.send(report).is_err() {
                tracing::debug!("sweep report receiver dropped");
            }
        }
        tracing::info!("expiry sweeper stopped");
    });

    SweeperHandle { shutdown, reports }
}
