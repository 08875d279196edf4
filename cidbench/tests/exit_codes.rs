use std::process::Command;

use anyhow::Context as _;

fn status_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn expect_exit(args: &[&str], expected: i32) -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_cidbench");
    let out = Command::new(exe)
        .args(args)
        .output()
        .context("run cidbench binary")?;

    anyhow::ensure!(
        status_code(out.status) == expected,
        "expected exit code {expected}, got {}\nstdout:\n{}\nstderr:\n{}",
        status_code(out.status),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

#[test]
fn invalid_duration_exits_30() -> anyhow::Result<()> {
    expect_exit(&["download", "--tick", "10x"], 30)
}

#[test]
fn zero_rate_exits_30() -> anyhow::Result<()> {
    expect_exit(&["upload", "--rate", "0"], 30)
}

#[test]
fn missing_cid_list_exits_30() -> anyhow::Result<()> {
    let dir = tempfile::tempdir().context("tempdir")?;
    let missing = dir.path().join("nope.txt");
    let missing = missing.to_string_lossy();
    expect_exit(&["find-providers", "--cids", &*missing], 30)
}

#[test]
fn bad_api_url_exits_30() -> anyhow::Result<()> {
    expect_exit(&["upload", "--count", "1", "--api", "ftp://127.0.0.1"], 30)
}

#[test]
fn help_exits_0() -> anyhow::Result<()> {
    expect_exit(&["--help"], 0)
}
