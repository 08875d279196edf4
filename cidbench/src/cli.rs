use cidbench_core::runner::MAX_RATE_PER_TICK;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }

    let (value, unit) = split_number(s)
        .ok_or_else(|| format!("invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"))?;

    let d = match unit {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Duration::from_secs(value),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => Duration::from_millis(value),
        "us" | "µs" | "usec" | "usecs" | "microsecond" | "microseconds" => {
            Duration::from_micros(value)
        }
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Duration::from_secs(secs)
        }
        "h" | "hr" | "hrs" | "hour" | "hours" => {
            let secs = value
                .checked_mul(60 * 60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(format!(
                "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
            ));
        }
    };

    if d.is_zero() {
        return Err(format!("duration '{s}' must be positive"));
    }
    Ok(d)
}

/// Parses byte sizes such as `1024`, `4KiB`, `1MB` or `256k` (binary multiples).
fn parse_size(input: &str) -> Result<u64, String> {
    let s = input.trim();
    let (value, unit) = split_number(s)
        .ok_or_else(|| format!("invalid size '{s}' (expected e.g. 1024, 4KiB, 1MiB)"))?;

    let multiplier: u64 = match unit.to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        "g" | "gb" | "gib" => 1024 * 1024 * 1024,
        _ => return Err(format!("invalid size '{s}' (expected e.g. 1024, 4KiB, 1MiB)")),
    };

    let bytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size '{s}' is too large"))?;
    if bytes == 0 {
        return Err(format!("size '{s}' must be positive"));
    }
    Ok(bytes)
}

fn split_number(s: &str) -> Option<(u64, &str)> {
    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);
    if number_end == 0 {
        return None;
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value = number_str.parse().ok()?;
    Some((value, unit_str.trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable progress and summary.
    HumanReadable,
    /// Emit JSON progress lines (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "cidbench",
    author,
    version,
    about = "Rate-controlled benchmarks for content-addressed storage gateways",
    long_about = "cidbench paces operations against an IPFS (Kubo) RPC endpoint or an IPNI indexer at a fixed rate per tick and reports latency and throughput.\n\nEvery operation is timed individually; failures are counted but never enter the latency averages. Ctrl-C stops dispatching and waits for in-flight operations before printing the summary.",
    after_help = "Examples:\n  cidbench upload --count 100 --rate 5\n  cidbench download --cids cids.txt --rate 10 --tick 500ms\n  cidbench find-providers --duration 1m --output json\n  cidbench indexer-lookup --indexer https://cid.contact"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add random payloads through the node's RPC API and record the returned CIDs
    Upload(UploadArgs),

    /// Fetch every CID in a list through the node's RPC API
    Download(DownloadArgs),

    /// Ask the node's content router for providers of every CID in a list
    FindProviders(FindProvidersArgs),

    /// Look up every CID in a list against an IPNI indexer
    IndexerLookup(IndexerLookupArgs),
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Base URL of the node's RPC API
    #[arg(long, env = "CIDBENCH_API", default_value = "http://127.0.0.1:5001")]
    pub api: String,

    /// Operations dispatched per tick
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=MAX_RATE_PER_TICK))]
    pub rate: u64,

    /// Scheduler tick interval (e.g. 1s, 250ms)
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub tick: Duration,

    /// Interval between progress reports
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub report_interval: Duration,

    /// Per-operation timeout
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Stop dispatching after this long, then drain (e.g. 30s, 5m)
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct CidListArgs {
    /// File with one CID per line
    #[arg(long, default_value = "cids.txt")]
    pub cids: PathBuf,

    /// Keep the file order instead of shuffling it
    #[arg(long)]
    pub no_shuffle: bool,

    /// Seed for the shuffle, for reproducible orderings
    #[arg(long, conflicts_with = "no_shuffle")]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Payload size per upload (e.g. 1024, 4KiB, 1MiB)
    #[arg(long, default_value = "256KiB", value_parser = parse_size)]
    pub size: u64,

    /// Number of uploads; 0 keeps going until interrupted or --duration elapses
    #[arg(long, default_value_t = 0)]
    pub count: u64,

    /// Where the CIDs of successful uploads are written
    #[arg(long, default_value = "cids.txt")]
    pub cids_out: PathBuf,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub list: CidListArgs,
}

#[derive(Debug, Args)]
pub struct FindProvidersArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub list: CidListArgs,

    /// Maximum number of providers the node should look for
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..))]
    pub num_providers: u32,
}

#[derive(Debug, Args)]
pub struct IndexerLookupArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub list: CidListArgs,

    /// Base URL of the IPNI indexer
    #[arg(long, default_value = "https://cid.contact")]
    pub indexer: String,
}
