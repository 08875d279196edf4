use std::time::Duration;

use hdrhistogram::Histogram;
use tokio::time::Instant;

use super::executor::ExecutionResult;

/// Point-in-time view of the run statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// 1-based report counter; the final summary snapshot carries the count of reports
    /// emitted before it.
    pub tick: u64,
    pub elapsed: Duration,
    pub requests_sent: u64,
    pub completed: u64,
    pub failed: u64,
    pub in_flight: u64,
    /// `None` until at least one operation succeeded.
    pub average_latency_ms: Option<f64>,
    /// Successful operations per second since run start.
    pub throughput_per_sec: f64,
    pub latency_p50_ms: Option<f64>,
    pub latency_p90_ms: Option<f64>,
    pub latency_p99_ms: Option<f64>,
    pub latency_max_ms: Option<f64>,
}

#[derive(Debug)]
pub struct StatsAggregator {
    started: Instant,
    requests_sent: u64,
    completed: u64,
    failed: u64,
    total_latency: Duration,
    latency_us: Histogram<u64>,
}

impl StatsAggregator {
    pub fn new(started: Instant) -> Self {
        // Track up to one hour in microseconds (with 3 sigfigs).
        let latency_us = Histogram::<u64>::new_with_bounds(1, 3_600_000_000, 3)
            .unwrap_or_else(|err| panic!("failed to init histogram: {err}"));

        Self {
            started,
            requests_sent: 0,
            completed: 0,
            failed: 0,
            total_latency: Duration::ZERO,
            latency_us,
        }
    }

    pub fn record_dispatch(&mut self) {
        self.requests_sent = self.requests_sent.saturating_add(1);
    }

    pub fn record(&mut self, result: &ExecutionResult) {
        debug_assert!(self.completed + self.failed < self.requests_sent);

        if result.success {
            self.completed = self.completed.saturating_add(1);
            self.total_latency = self.total_latency.saturating_add(result.latency);
            let us = u64::try_from(result.latency.as_micros()).unwrap_or(u64::MAX);
            self.latency_us.saturating_record(us.max(1));
        } else {
            self.failed = self.failed.saturating_add(1);
        }
    }

    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn average_latency(&self) -> Option<Duration> {
        if self.completed == 0 {
            return None;
        }
        let nanos = self.total_latency.as_nanos() / u128::from(self.completed);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    pub fn throughput(&self, elapsed: Duration) -> f64 {
        self.completed as f64 / elapsed.as_secs_f64().max(1e-9)
    }

    /// Latency at quantile `q` (0..=1) of successful operations.
    pub fn percentile(&self, q: f64) -> Option<Duration> {
        if self.latency_us.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.latency_us.value_at_quantile(q)))
    }

    pub fn snapshot(&self, now: Instant, in_flight: u64, tick: u64) -> Snapshot {
        let elapsed = now.saturating_duration_since(self.started);
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;

        Snapshot {
            tick,
            elapsed,
            requests_sent: self.requests_sent,
            completed: self.completed,
            failed: self.failed,
            in_flight,
            average_latency_ms: self.average_latency().map(ms),
            throughput_per_sec: self.throughput(elapsed),
            latency_p50_ms: self.percentile(0.50).map(ms),
            latency_p90_ms: self.percentile(0.90).map(ms),
            latency_p99_ms: self.percentile(0.99).map(ms),
            latency_max_ms: (!self.latency_us.is_empty())
                .then(|| ms(Duration::from_micros(self.latency_us.max()))),
        }
    }
}
