//! Executors for each benchmarked operation.
//!
//! Every executor turns one work item into a single HTTP exchange, times it, and decides
//! from the response whether the operation succeeded.

use std::time::Duration;

use anyhow::Context as _;
use cidbench_core::ExecutionResult;
use cidbench_http::{HttpClient, HttpRequest, HttpResponse};
use tokio::time::Instant;

mod download;
mod find_providers;
mod indexer;
mod upload;

pub(crate) use download::Download;
pub(crate) use find_providers::FindProviders;
pub(crate) use indexer::IndexerLookup;
pub(crate) use upload::Upload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub(crate) enum Operation {
    Upload,
    Download,
    FindProviders,
    IndexerLookup,
}

/// Parses a base URL and appends `path` to it, keeping any path prefix of the base.
pub(crate) fn endpoint(base: &str, path: &str) -> anyhow::Result<url::Url> {
    let mut url = url::Url::parse(base).with_context(|| format!("invalid base url: {base}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("unsupported scheme in {base} (expected http or https)");
    }

    let joined = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    Ok(url)
}

/// Sends `req` and measures the full exchange, response body included.
async fn timed(
    client: &HttpClient,
    req: HttpRequest,
) -> (Duration, cidbench_http::Result<HttpResponse>) {
    let started = Instant::now();
    let res = client.request(req).await;
    (started.elapsed(), res)
}

/// Maps a finished exchange onto an [`ExecutionResult`], logging why it failed.
///
/// `accept` sees only 2xx responses and may still reject them (e.g. an empty provider set).
fn outcome<F>(
    op: Operation,
    subject: &str,
    latency: Duration,
    res: cidbench_http::Result<HttpResponse>,
    accept: F,
) -> ExecutionResult
where
    F: FnOnce(&HttpResponse) -> Result<Option<String>, String>,
{
    let res = match res {
        Ok(res) => res,
        Err(err) => {
            tracing::warn!(
                %op,
                subject,
                kind = err.kind(),
                error = %err,
                "request failed"
            );
            return ExecutionResult::failed(latency);
        }
    };

    if !res.is_success() {
        tracing::warn!(
            %op,
            subject,
            status = res.status,
            body = res.body_utf8().map(|b| b.trim()).unwrap_or(""),
            "unexpected status"
        );
        return ExecutionResult::failed(latency);
    }

    match accept(&res) {
        Ok(Some(id)) => ExecutionResult::succeeded(latency).with_produced(id),
        Ok(None) => ExecutionResult::succeeded(latency),
        Err(reason) => {
            tracing::warn!(%op, subject, reason, "rejected response");
            ExecutionResult::failed(latency)
        }
    }
}
