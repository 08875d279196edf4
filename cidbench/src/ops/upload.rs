use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use cidbench_core::{ExecutionResult, Executor, WorkItem};
use cidbench_http::{HttpClient, HttpRequest, Multipart};
use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng as _};
use serde::Deserialize;

use super::{Operation, endpoint, outcome, timed};

/// Adds a fresh random payload per work item via `POST /api/v0/add`.
///
/// Payloads are pinned so later download and provider runs over the same CID list
/// find them after a garbage collection.
#[derive(Debug, Clone)]
pub(crate) struct Upload {
    client: HttpClient,
    url: String,
}

/// One line of the `add` response stream; the last object names the root CID.
#[derive(Debug, Deserialize)]
struct AddedObject {
    #[serde(rename = "Hash")]
    hash: String,
}

impl Upload {
    pub(crate) fn new(client: HttpClient, api: &str) -> anyhow::Result<Self> {
        let mut url = endpoint(api, "/api/v0/add")?;
        url.query_pairs_mut()
            .append_pair("cid-version", "1")
            .append_pair("pin", "true");
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Executor for Upload {
    fn execute(
        &self,
        item: WorkItem,
        timeout: Duration,
    ) -> impl Future<Output = ExecutionResult> + Send {
        let client = self.client.clone();
        let url = self.url.clone();

        async move {
            let WorkItem::Payload { seq, size } = item else {
                tracing::warn!(?item, "upload expects payload items");
                return ExecutionResult::failed(Duration::ZERO);
            };

            let filename = format!("payload-{seq}.bin");
            let form = Multipart::new().file("file", &filename, &random_payload(size));
            let content_type = form.content_type();
            let req = HttpRequest::post(url, form.finish())
                .header("content-type", content_type)
                .timeout(timeout);

            let (latency, res) = timed(&client, req).await;
            outcome(Operation::Upload, &filename, latency, res, |res| {
                root_cid(&res.body).map(Some)
            })
        }
    }
}

fn random_payload(size: u64) -> Bytes {
    let mut rng = SmallRng::from_rng(&mut rand::rng());
    let mut buf = vec![0u8; usize::try_from(size).unwrap_or(usize::MAX)];
    rng.fill(buf.as_mut_slice());
    Bytes::from(buf)
}

/// Extracts the CID from an `add` response, which may carry several NDJSON objects.
fn root_cid(body: &[u8]) -> Result<String, String> {
    let text = std::str::from_utf8(body).map_err(|_| "response is not utf-8".to_string())?;

    text.lines()
        .rev()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .find_map(|line| serde_json::from_str::<AddedObject>(line).ok())
        .map(|obj| obj.hash)
        .filter(|hash| !hash.is_empty())
        .ok_or_else(|| "response carries no Hash".to_string())
}
