use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;

use cidbench_core::{RunSummary, Snapshot};

use super::{OutputFormatter, Persisted, RunHeader};
use crate::ops::Operation;

const SCHEMA: &str = "cidbench.ndjson.v1";

pub(crate) struct JsonOutput {
    operation: Operation,
}

impl JsonOutput {
    pub(crate) fn new(operation: Operation) -> Self {
        Self { operation }
    }
}

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _header: &RunHeader) {}

    fn progress(&self) -> Option<cidbench_core::ProgressFn> {
        let operation = self.operation;
        Some(Arc::new(move |snap| {
            let line = JsonProgressLine {
                schema: SCHEMA,
                kind: "progress",
                operation,
                stats: JsonStats::from(&snap),
            };
            emit_json_line(&line);
        }))
    }

    fn print_summary(
        &self,
        summary: &RunSummary,
        persisted: Option<&Persisted>,
    ) -> anyhow::Result<()> {
        let line = build_summary_line(self.operation, summary, persisted);
        emit_json_line(&line);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonStats {
    pub tick: u64,
    pub elapsed_ms: u64,
    pub requests_sent: u64,
    pub completed: u64,
    pub failed: u64,
    pub in_flight: u64,
    pub average_latency_ms: Option<f64>,
    pub throughput_per_sec: f64,
    pub latency_p50_ms: Option<f64>,
    pub latency_p90_ms: Option<f64>,
    pub latency_p99_ms: Option<f64>,
    pub latency_max_ms: Option<f64>,
}

impl From<&Snapshot> for JsonStats {
    fn from(s: &Snapshot) -> Self {
        Self {
            tick: s.tick,
            elapsed_ms: u64::try_from(s.elapsed.as_millis()).unwrap_or(u64::MAX),
            requests_sent: s.requests_sent,
            completed: s.completed,
            failed: s.failed,
            in_flight: s.in_flight,
            average_latency_ms: s.average_latency_ms,
            throughput_per_sec: s.throughput_per_sec,
            latency_p50_ms: s.latency_p50_ms,
            latency_p90_ms: s.latency_p90_ms,
            latency_p99_ms: s.latency_p99_ms,
            latency_max_ms: s.latency_max_ms,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonProgressLine {
    pub schema: &'static str,
    pub kind: &'static str,
    #[serde(serialize_with = "serialize_display")]
    pub operation: Operation,
    #[serde(flatten)]
    pub stats: JsonStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonSummaryLine {
    pub schema: &'static str,
    pub kind: &'static str,
    #[serde(serialize_with = "serialize_display")]
    pub operation: Operation,
    pub stop_cause: String,
    pub reports_emitted: u64,
    #[serde(flatten)]
    pub stats: JsonStats,
    pub identifiers: Option<JsonIdentifiers>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonIdentifiers {
    pub path: String,
    pub count: usize,
}

fn build_summary_line(
    operation: Operation,
    summary: &RunSummary,
    persisted: Option<&Persisted>,
) -> JsonSummaryLine {
    JsonSummaryLine {
        schema: SCHEMA,
        kind: "summary",
        operation,
        stop_cause: summary.cause.to_string(),
        reports_emitted: summary.reports_emitted,
        stats: JsonStats::from(&summary.snapshot),
        identifiers: persisted.map(|p| JsonIdentifiers {
            path: p.path.display().to_string(),
            count: p.count,
        }),
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &Operation,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
