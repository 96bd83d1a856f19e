// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::gauge;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::coordinator::Coordinator;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval: Duration,
}

/// Wall-clock time of a ticker deadline.
fn wall_clock(deadline: Instant) -> Option<DateTime<Utc>> {
    let ahead = chrono::Duration::from_std(deadline.saturating_duration_since(Instant::now())).ok()?;
    Utc::now().checked_add_signed(ahead)
}

/// Refresh the coordinator every `interval`. The first tick fires one
/// interval from now; the eager refresh belongs to setup.
pub fn spawn_refresh_scheduler(coordinator: Arc<Coordinator>, cfg: SchedulerCfg) -> JoinHandle<()> {
    tokio::spawn(async move {
        crate::ingest::ensure_metrics_described();
        let Some(first) = Instant::now().checked_add(cfg.interval) else {
            tracing::error!(target: "ingest", interval = ?cfg.interval, "refresh interval out of range, scheduler not started");
            return;
        };
        let mut ticker = tokio::time::interval_at(first, cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        coordinator.set_next_refresh(wall_clock(first));

        loop {
            let fired = ticker.tick().await;

            // Pin the next deadline to this tick so refresh time does not
            // push the schedule back. A tick that is already overdue restarts
            // the grid from now.
            let now = Instant::now();
            let next = match fired.checked_add(cfg.interval) {
                Some(n) if n > now => Some(n),
                _ => now.checked_add(cfg.interval),
            };
            if let Some(next) = next {
                ticker.reset_at(next);
                coordinator.set_next_refresh(wall_clock(next));
            }

            let tick_ts = Utc::now().timestamp().max(0) as u64;
            gauge!("wiki_scheduler_last_tick_ts").set(tick_ts as f64);

            // Failures are already recorded on the coordinator state.
            let ok = coordinator.refresh().await.is_ok();

            tracing::debug!(
                target: "ingest",
                ok,
                interval_secs = cfg.interval.as_secs(),
                "scheduled refresh tick"
            );
        }
    })
}
