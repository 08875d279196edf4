use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::progress::ProgressFn;
use super::stats::{Snapshot, StatsAggregator};

/// Emits snapshots on a fixed cadence, starting one interval after run start.
pub struct Reporter {
    ticker: Interval,
    progress: Option<ProgressFn>,
    emitted: u64,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("emitted", &self.emitted)
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}

impl Reporter {
    pub fn new(report_interval: Duration, start: Instant, progress: Option<ProgressFn>) -> Self {
        let mut ticker = tokio::time::interval_at(start + report_interval, report_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            ticker,
            progress,
            emitted: 0,
        }
    }

    /// Waits for the next report. Cancel-safe.
    pub async fn tick(&mut self) {
        self.ticker.tick().await;
    }

    pub fn emit(&mut self, stats: &StatsAggregator, in_flight: u64) -> Snapshot {
        self.emitted = self.emitted.saturating_add(1);
        let snapshot = stats.snapshot(Instant::now(), in_flight, self.emitted);
        if let Some(progress) = &self.progress {
            progress(snapshot.clone());
        }
        snapshot
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}
