use std::path::PathBuf;
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::ops::Operation;

mod human;
mod json;

pub(crate) use human::describe_payloads;

/// What a run is about to do, printed before the first tick.
#[derive(Debug, Clone)]
pub(crate) struct RunHeader {
    pub operation: Operation,
    pub target: String,
    pub workload: String,
    pub rate_per_tick: u64,
    pub tick: Duration,
    pub target_rate_per_sec: f64,
    pub max_duration: Option<Duration>,
}

/// Where the identifiers produced by a run were written.
#[derive(Debug, Clone)]
pub(crate) struct Persisted {
    pub path: PathBuf,
    pub count: usize,
}

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, header: &RunHeader);
    fn progress(&self) -> Option<cidbench_core::ProgressFn>;
    fn print_summary(
        &self,
        summary: &cidbench_core::RunSummary,
        persisted: Option<&Persisted>,
    ) -> anyhow::Result<()>;
}

pub(crate) fn formatter(
    format: OutputFormat,
    operation: Operation,
    max_duration: Option<Duration>,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => {
            Box::new(human::HumanReadableOutput::new(operation, max_duration))
        }
        OutputFormat::Json => Box::new(json::JsonOutput::new(operation)),
    }
}
