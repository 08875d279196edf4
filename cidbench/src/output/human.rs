use std::sync::Arc;
use std::time::Duration;

mod format;
mod progress;
mod summary;

use format::{format_bytes, format_duration, format_latency, format_rate};
use progress::HumanProgress;
use summary::render;

use super::{OutputFormatter, Persisted, RunHeader};
use crate::ops::Operation;

pub(crate) struct HumanReadableOutput {
    operation: Operation,
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new(operation: Operation, max_duration: Option<Duration>) -> Self {
        Self {
            operation,
            progress: Arc::new(HumanProgress::new(operation, max_duration)),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, header: &RunHeader) {
        println!("operation: {} target={}", header.operation, header.target);
        println!("workload: {}", header.workload);

        let mut pacing = format!(
            "pacing: {}/tick every {} (~{} ops/s)",
            header.rate_per_tick,
            format_duration(header.tick),
            format_rate(header.target_rate_per_sec)
        );
        if let Some(d) = header.max_duration {
            pacing.push_str(&format!(" for at most {}", format_duration(d)));
        }
        println!("{pacing}");
        println!();
    }

    fn progress(&self) -> Option<cidbench_core::ProgressFn> {
        let progress = self.progress.clone();

        Some(Arc::new(move |snap| {
            let message = format!(
                "sent={} ok={} failed={} in_flight={} avg={} ops/s={}",
                snap.requests_sent,
                snap.completed,
                snap.failed,
                snap.in_flight,
                format_latency(snap.average_latency_ms),
                format_rate(snap.throughput_per_sec)
            );
            progress.update(snap.elapsed, message);
        }))
    }

    fn print_summary(
        &self,
        summary: &cidbench_core::RunSummary,
        persisted: Option<&Persisted>,
    ) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render(self.operation, summary, persisted));
        Ok(())
    }
}

/// Describes a payload workload for the header line.
pub(crate) fn describe_payloads(size: u64, count: Option<u64>) -> String {
    match count {
        Some(n) => format!("{n} random payloads of {}", format_bytes(size)),
        None => format!("random payloads of {} until stopped", format_bytes(size)),
    }
}
