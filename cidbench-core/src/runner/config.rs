use std::time::Duration;

use super::error::{Error, Result};

/// Largest accepted `rate_per_tick`.
pub const MAX_RATE_PER_TICK: u64 = 1_000_000;

/// Pacing and reporting parameters of a single run.
///
/// The total amount of work is a property of the workload source, not of the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Operations dispatched per scheduler tick.
    pub rate_per_tick: u64,
    pub tick_interval: Duration,
    pub report_interval: Duration,
    /// Upper bound for a single operation; slower operations count as failed.
    pub op_timeout: Duration,
    /// Stop dispatching after this long, then drain.
    pub max_duration: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            rate_per_tick: 1,
            tick_interval: Duration::from_secs(1),
            report_interval: Duration::from_secs(1),
            op_timeout: Duration::from_secs(10),
            max_duration: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rate_per_tick == 0 || self.rate_per_tick > MAX_RATE_PER_TICK {
            return Err(Error::InvalidRate);
        }
        if self.tick_interval.is_zero() {
            return Err(Error::InvalidTickInterval);
        }
        if self.report_interval.is_zero() {
            return Err(Error::InvalidReportInterval);
        }
        if self.op_timeout.is_zero() {
            return Err(Error::InvalidTimeout);
        }
        if self.max_duration.is_some_and(|d| d.is_zero()) {
            return Err(Error::InvalidDuration);
        }
        Ok(())
    }

    /// Nominal dispatch rate in operations per second.
    #[must_use]
    pub fn target_rate_per_sec(&self) -> f64 {
        self.rate_per_tick as f64 / self.tick_interval.as_secs_f64()
    }
}
