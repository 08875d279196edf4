use std::time::Duration;

pub(crate) fn format_bytes(b: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * 1024 * 1024;

    if b >= GIB {
        return format!("{:.2}GiB", (b as f64) / (GIB as f64));
    }
    if b >= MIB {
        return format!("{:.2}MiB", (b as f64) / (MIB as f64));
    }
    if b >= KIB {
        return format!("{:.2}KiB", (b as f64) / (KIB as f64));
    }

    format!("{b}B")
}

pub(crate) fn format_rate(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    if v < 10.0 {
        format!("{v:.2}")
    } else {
        format!("{v:.0}")
    }
}

/// Renders a latency in milliseconds; undefined latencies print as `n/a`, never `0`.
pub(crate) fn format_latency(ms: Option<f64>) -> String {
    match ms {
        Some(ms) if ms.is_finite() && ms >= 1000.0 => format!("{:.2}s", ms / 1000.0),
        Some(ms) if ms.is_finite() => format!("{ms:.2}ms"),
        _ => "n/a".to_string(),
    }
}

/// Single rounded component in one of: us, ms, s, m.
pub(crate) fn format_duration(d: Duration) -> String {
    let total_ns = d.as_nanos();

    const NS_PER_US: u128 = 1_000;
    const NS_PER_MS: u128 = 1_000_000;
    const NS_PER_S: u128 = 1_000_000_000;
    const NS_PER_MIN: u128 = 60 * NS_PER_S;

    fn round_div(value: u128, unit: u128) -> u128 {
        // Round to nearest integer (ties round up).
        (value + (unit / 2)) / unit
    }

    if total_ns >= NS_PER_MIN && total_ns % NS_PER_MIN == 0 {
        return format!("{}m", total_ns / NS_PER_MIN);
    }
    if total_ns >= NS_PER_S {
        return format!("{}s", round_div(total_ns, NS_PER_S));
    }
    if total_ns >= NS_PER_MS {
        return format!("{}ms", round_div(total_ns, NS_PER_MS));
    }

    format!("{}us", round_div(total_ns, NS_PER_US))
}
