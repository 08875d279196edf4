use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use anyhow::Context as _;
use cidbench_testserver::TestServer;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    tick: u64,
    requests_sent: u64,
    completed: u64,
    failed: u64,
    in_flight: u64,
    average_latency_ms: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Identifiers {
    path: String,
    count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryLine {
    schema: String,
    operation: String,
    stop_cause: String,
    #[serde(flatten)]
    stats: Stats,
    identifiers: Option<Identifiers>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressLine {
    schema: String,
    #[serde(flatten)]
    stats: Stats,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind")]
enum JsonLine {
    #[serde(rename = "progress")]
    Progress(ProgressLine),

    #[serde(rename = "summary")]
    Summary(SummaryLine),
}

async fn cidbench(args: Vec<String>) -> anyhow::Result<Output> {
    let exe = env!("CARGO_BIN_EXE_cidbench");
    tokio::task::spawn_blocking(move || Command::new(exe).args(&args).output())
        .await
        .context("spawn_blocking join")?
        .context("run cidbench binary")
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

fn ensure_success(out: &Output) -> anyhow::Result<()> {
    anyhow::ensure!(
        out.status.success(),
        "cidbench failed: {:?}\nstdout:\n{}\nstderr:\n{}",
        out.status.code(),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

fn parse_lines(out: &Output) -> anyhow::Result<(Vec<ProgressLine>, SummaryLine)> {
    let stdout = String::from_utf8_lossy(&out.stdout);
    let mut progress = Vec::new();
    let mut summary = None;

    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        anyhow::ensure!(summary.is_none(), "output after summary line: {line}");
        match serde_json::from_str::<JsonLine>(line)
            .with_context(|| format!("parse json line: {line}"))?
        {
            JsonLine::Progress(p) => progress.push(p),
            JsonLine::Summary(s) => summary = Some(s),
        }
    }

    let summary = summary.context("missing summary line")?;
    anyhow::ensure!(summary.schema == "cidbench.ndjson.v1", "schema={}", summary.schema);
    for p in &progress {
        anyhow::ensure!(p.schema == summary.schema, "schema mismatch");
        anyhow::ensure!(
            p.stats.completed + p.stats.failed <= p.stats.requests_sent,
            "completed exceeds sent: {:?}",
            p.stats
        );
    }
    Ok((progress, summary))
}

fn write_cids(path: &Path, cids: &[&str]) -> anyhow::Result<()> {
    std::fs::write(path, cids.join("\n") + "\n").context("write cid list")
}

#[tokio::test]
async fn upload_then_download_round_trips() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let api = server.base_url().to_string();
    let dir = tempfile::tempdir().context("tempdir")?;
    let cids_path = dir.path().join("out").join("cids.txt");
    let cids_arg = cids_path.to_string_lossy().to_string();

    let out = cidbench(args(&[
        "upload", "--api", api.as_str(), "--count", "4", "--rate", "2", "--tick", "100ms", "--size",
        "1KiB", "--cids-out", cids_arg.as_str(), "--output", "json",
    ]))
    .await?;
    ensure_success(&out)?;

    let (_, summary) = parse_lines(&out)?;
    anyhow::ensure!(summary.operation == "upload", "operation={}", summary.operation);
    anyhow::ensure!(summary.stop_cause == "exhausted", "cause={}", summary.stop_cause);
    anyhow::ensure!(summary.stats.requests_sent == 4, "{:?}", summary.stats);
    anyhow::ensure!(summary.stats.completed == 4, "{:?}", summary.stats);
    anyhow::ensure!(summary.stats.in_flight == 0, "{:?}", summary.stats);
    anyhow::ensure!(summary.stats.average_latency_ms.is_some(), "{:?}", summary.stats);

    let written = summary.identifiers.context("missing identifiers")?;
    anyhow::ensure!(written.count == 4, "count={}", written.count);
    anyhow::ensure!(written.path == cids_arg, "path={}", written.path);

    let text = std::fs::read_to_string(&cids_path).context("read cids file")?;
    let cids: Vec<&str> = text.lines().collect();
    anyhow::ensure!(cids.len() == 4, "cids file: {text}");
    for cid in &cids {
        anyhow::ensure!(server.contains(cid), "server does not know {cid}");
    }
    anyhow::ensure!(server.stats().adds_total() == 4);

    let out = cidbench(args(&[
        "download", "--api", api.as_str(), "--cids", cids_arg.as_str(), "--rate", "4", "--tick", "100ms",
        "--output", "json",
    ]))
    .await?;
    ensure_success(&out)?;

    let (_, summary) = parse_lines(&out)?;
    anyhow::ensure!(summary.stats.completed == 4, "{:?}", summary.stats);
    anyhow::ensure!(summary.stats.failed == 0, "{:?}", summary.stats);
    anyhow::ensure!(summary.identifiers.is_none());
    anyhow::ensure!(server.stats().cats_total() == 4);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unknown_cids_fail_without_an_average() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let api = server.base_url().to_string();
    let dir = tempfile::tempdir().context("tempdir")?;
    let list = dir.path().join("cids.txt");
    write_cids(&list, &["bafymissing1", "bafymissing2", "bafymissing3"])?;
    let list_arg = list.to_string_lossy().to_string();

    let out = cidbench(args(&[
        "download", "--api", api.as_str(), "--cids", list_arg.as_str(), "--rate", "3", "--tick", "100ms",
        "--output", "json",
    ]))
    .await?;
    ensure_success(&out)?;

    let (_, summary) = parse_lines(&out)?;
    anyhow::ensure!(summary.stats.requests_sent == 3, "{:?}", summary.stats);
    anyhow::ensure!(summary.stats.completed == 0, "{:?}", summary.stats);
    anyhow::ensure!(summary.stats.failed == 3, "{:?}", summary.stats);
    anyhow::ensure!(summary.stats.average_latency_ms.is_none(), "{:?}", summary.stats);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn find_providers_times_empty_lookups_as_completed() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let api = server.base_url().to_string();
    let known_a = server.insert(&b"block-a"[..]);
    let known_b = server.insert(&b"block-b"[..]);

    let dir = tempfile::tempdir().context("tempdir")?;
    let list = dir.path().join("cids.txt");
    write_cids(&list, &[known_a.as_str(), "bafyunknown", known_b.as_str()])?;
    let list_arg = list.to_string_lossy().to_string();

    let out = cidbench(args(&[
        "find-providers", "--api", api.as_str(), "--cids", list_arg.as_str(), "--rate", "1", "--tick",
        "100ms", "--num-providers", "1", "--seed", "42", "--output", "json",
    ]))
    .await?;
    ensure_success(&out)?;

    let (_, summary) = parse_lines(&out)?;
    anyhow::ensure!(summary.operation == "find-providers");
    anyhow::ensure!(summary.stats.completed == 3, "{:?}", summary.stats);
    anyhow::ensure!(summary.stats.failed == 0, "{:?}", summary.stats);
    anyhow::ensure!(summary.stats.average_latency_ms.is_some(), "{:?}", summary.stats);
    anyhow::ensure!(server.stats().findprovs_total() == 3);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn indexer_lookup_reports_progress_on_its_own_cadence() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let indexer = server.base_url().to_string();
    let cids: Vec<String> = (0..5)
        .map(|i| server.insert(format!("block-{i}").into_bytes()))
        .collect();

    let dir = tempfile::tempdir().context("tempdir")?;
    let list = dir.path().join("cids.txt");
    let refs: Vec<&str> = cids.iter().map(String::as_str).collect();
    write_cids(&list, &refs)?;
    let list_arg = list.to_string_lossy().to_string();

    let out = cidbench(args(&[
        "indexer-lookup", "--indexer", indexer.as_str(), "--cids", list_arg.as_str(), "--no-shuffle", "--rate",
        "1", "--tick", "200ms", "--report-interval", "300ms", "--output", "json",
    ]))
    .await?;
    ensure_success(&out)?;

    let (progress, summary) = parse_lines(&out)?;
    anyhow::ensure!(summary.stats.completed == 5, "{:?}", summary.stats);
    anyhow::ensure!(server.stats().indexer_lookups_total() == 5);

    // Ticks at 0..=800ms, reports every 300ms while dispatching.
    anyhow::ensure!(
        (1..=3).contains(&progress.len()),
        "unexpected report count: {}",
        progress.len()
    );
    let ticks: Vec<u64> = progress.iter().map(|p| p.stats.tick).collect();
    let expected: Vec<u64> = (1..=progress.len() as u64).collect();
    anyhow::ensure!(ticks == expected, "ticks={ticks:?}");
    anyhow::ensure!(summary.stats.tick == progress.len() as u64);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unbounded_upload_stops_at_the_duration_cap() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let api = server.base_url().to_string();
    let dir = tempfile::tempdir().context("tempdir")?;
    let cids_path = dir.path().join("cids.txt");
    let cids_arg = cids_path.to_string_lossy().to_string();

    let out = cidbench(args(&[
        "upload", "--api", api.as_str(), "--rate", "1", "--tick", "100ms", "--duration", "450ms",
        "--size", "512", "--cids-out", cids_arg.as_str(), "--output", "json",
    ]))
    .await?;
    ensure_success(&out)?;

    let (_, summary) = parse_lines(&out)?;
    anyhow::ensure!(summary.stop_cause == "deadline_reached", "cause={}", summary.stop_cause);
    anyhow::ensure!(
        (4..=6).contains(&summary.stats.requests_sent),
        "{:?}",
        summary.stats
    );
    anyhow::ensure!(
        summary.stats.completed + summary.stats.failed == summary.stats.requests_sent,
        "{:?}",
        summary.stats
    );

    let text = std::fs::read_to_string(&cids_path).context("read cids file")?;
    anyhow::ensure!(
        text.lines().count() as u64 == summary.stats.completed,
        "cids file: {text}"
    );

    server.shutdown().await;
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn interrupted_upload_prints_summary_and_persists_cids() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let api = server.base_url().to_string();
    let dir = tempfile::tempdir().context("tempdir")?;
    let cids_path = dir.path().join("cids.txt");
    let cids_arg = cids_path.to_string_lossy().to_string();

    let child = Command::new(env!("CARGO_BIN_EXE_cidbench"))
        .args(args(&[
            "upload", "--api", api.as_str(), "--count", "0", "--rate", "2", "--tick", "100ms",
            "--size", "512", "--cids-out", cids_arg.as_str(), "--output", "json",
        ]))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawn cidbench")?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while server.stats().adds_total() < 3 {
        anyhow::ensure!(
            tokio::time::Instant::now() < deadline,
            "uploads never reached the server"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let kill = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .context("send SIGINT")?;
    anyhow::ensure!(kill.success(), "kill exited with {kill}");

    let out = tokio::task::spawn_blocking(move || child.wait_with_output())
        .await
        .context("spawn_blocking join")?
        .context("wait for cidbench")?;
    ensure_success(&out)?;

    let (_, summary) = parse_lines(&out)?;
    anyhow::ensure!(summary.stop_cause == "interrupted", "cause={}", summary.stop_cause);
    anyhow::ensure!(summary.stats.in_flight == 0, "{:?}", summary.stats);
    anyhow::ensure!(summary.stats.completed > 0, "{:?}", summary.stats);

    let ids = summary.identifiers.context("missing identifiers")?;
    anyhow::ensure!(ids.count as u64 == summary.stats.completed, "count={}", ids.count);

    let text = std::fs::read_to_string(&cids_path).context("read cids file")?;
    anyhow::ensure!(text.lines().count() == ids.count, "cids file: {text}");
    for cid in text.lines() {
        anyhow::ensure!(server.contains(cid), "unknown cid {cid}");
    }

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn failed_upload_keeps_the_previous_cid_list() -> anyhow::Result<()> {
    // Nothing listens on the discard port, so every add fails to connect.
    let api = "http://127.0.0.1:9";
    let dir = tempfile::tempdir().context("tempdir")?;
    let cids_path = dir.path().join("cids.txt");
    std::fs::write(&cids_path, "bafyPrevious1\nbafyPrevious2\n").context("seed cids file")?;
    let cids_arg = cids_path.to_string_lossy().to_string();

    let out = cidbench(args(&[
        "upload", "--api", api, "--rate", "1", "--tick", "100ms", "--duration", "250ms",
        "--timeout", "1s", "--size", "512", "--cids-out", cids_arg.as_str(), "--output", "json",
    ]))
    .await?;
    ensure_success(&out)?;

    let (_, summary) = parse_lines(&out)?;
    anyhow::ensure!(summary.stats.completed == 0, "{:?}", summary.stats);
    anyhow::ensure!(summary.identifiers.is_none(), "{:?}", summary.identifiers);

    let text = std::fs::read_to_string(&cids_path).context("read cids file")?;
    anyhow::ensure!(text == "bafyPrevious1\nbafyPrevious2\n", "cids file: {text}");
    Ok(())
}

#[tokio::test]
async fn human_output_prints_header_and_summary() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let api = server.base_url().to_string();
    let dir = tempfile::tempdir().context("tempdir")?;
    let list = dir.path().join("cids.txt");
    write_cids(&list, &["bafymissing"])?;
    let list_arg = list.to_string_lossy().to_string();

    let out = cidbench(args(&[
        "download", "--api", api.as_str(), "--cids", list_arg.as_str(), "--tick", "100ms",
    ]))
    .await?;
    ensure_success(&out)?;

    let stdout = String::from_utf8_lossy(&out.stdout);
    anyhow::ensure!(stdout.contains("operation: download"), "stdout:\n{stdout}");
    anyhow::ensure!(stdout.contains("1 CIDs from"), "stdout:\n{stdout}");
    anyhow::ensure!(stdout.contains("summary: download"), "stdout:\n{stdout}");
    anyhow::ensure!(stdout.contains("requests: 1 (completed 0, failed 1)"), "stdout:\n{stdout}");
    anyhow::ensure!(stdout.contains("latency: n/a"), "stdout:\n{stdout}");

    server.shutdown().await;
    Ok(())
}
