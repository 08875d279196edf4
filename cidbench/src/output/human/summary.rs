use std::fmt::Write as _;

use cidbench_core::RunSummary;

use super::format::{format_duration, format_latency, format_rate};
use crate::output::Persisted;
use crate::ops::Operation;

pub(crate) fn render(
    operation: Operation,
    summary: &RunSummary,
    persisted: Option<&Persisted>,
) -> String {
    let s = &summary.snapshot;
    let mut out = String::new();

    writeln!(&mut out, "summary: {operation}").ok();
    writeln!(
        &mut out,
        "  stopped: {} after {} ({} reports)",
        summary.cause,
        format_duration(s.elapsed),
        summary.reports_emitted
    )
    .ok();
    writeln!(
        &mut out,
        "  requests: {} (completed {}, failed {})",
        s.requests_sent, s.completed, s.failed
    )
    .ok();

    if s.average_latency_ms.is_some() {
        writeln!(
            &mut out,
            "  latency = avg={} p50={} p90={} p99={} max={}",
            format_latency(s.average_latency_ms),
            format_latency(s.latency_p50_ms),
            format_latency(s.latency_p90_ms),
            format_latency(s.latency_p99_ms),
            format_latency(s.latency_max_ms)
        )
        .ok();
    } else {
        out.push_str("  latency: n/a\n");
    }

    writeln!(
        &mut out,
        "  throughput: {} ops/s",
        format_rate(s.throughput_per_sec)
    )
    .ok();

    if let Some(p) = persisted {
        writeln!(
            &mut out,
            "  identifiers: {} written to {}",
            p.count,
            p.path.display()
        )
        .ok();
    }

    out
}
