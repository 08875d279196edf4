use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::error::{Error, Result};
use super::workload::{Remaining, WorkItem, WorkloadSource};

/// Paces draws from a workload source to `rate_per_tick` items every `tick_interval`.
///
/// The cadence never waits on dispatched work. The first tick is due at `start`; ticks
/// missed while the controller was busy are caught up so the long-run rate stays exact.
#[derive(Debug)]
pub struct RateScheduler<S> {
    source: S,
    rate_per_tick: u64,
    ticker: Interval,
}

impl<S: WorkloadSource> RateScheduler<S> {
    pub fn new(source: S, rate_per_tick: u64, tick_interval: Duration, start: Instant) -> Self {
        let mut ticker = tokio::time::interval_at(start, tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        Self {
            source,
            rate_per_tick,
            ticker,
        }
    }

    /// Waits for the next tick. Cancel-safe.
    pub async fn tick(&mut self) {
        self.ticker.tick().await;
    }

    /// Draws up to `rate_per_tick` items; fewer if the source has fewer left.
    pub fn draw_batch(&mut self) -> Result<Vec<WorkItem>> {
        let want = match self.source.remaining() {
            Remaining::Finite(remaining) => remaining.min(self.rate_per_tick),
            Remaining::Unbounded => self.rate_per_tick,
        };

        let mut batch = Vec::new();
        for _ in 0..want {
            match self.source.next_item() {
                Some(item) => batch.push(item),
                None => {
                    let remaining = match self.source.remaining() {
                        Remaining::Finite(n) => n,
                        Remaining::Unbounded => u64::MAX,
                    };
                    return Err(Error::SourceContract { remaining });
                }
            }
        }
        Ok(batch)
    }

    pub fn is_exhausted(&self) -> bool {
        self.source.is_exhausted()
    }
}
