use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use cidbench_core::{ExecutionResult, Executor, WorkItem};
use cidbench_http::{HttpClient, HttpRequest};
use serde::Deserialize;

use super::{Operation, endpoint, outcome, timed};

/// Routing event type carrying provider records.
const PROVIDER_EVENT: u8 = 4;

/// Runs a content-routing lookup via `POST /api/v0/routing/findprovs`.
///
/// Any 2xx response counts as a completed lookup, including one that found no providers.
#[derive(Debug, Clone)]
pub(crate) struct FindProviders {
    client: HttpClient,
    base: url::Url,
    num_providers: u32,
}

#[derive(Debug, Deserialize)]
struct RoutingEvent {
    #[serde(rename = "Type")]
    kind: u8,
    #[serde(rename = "Responses", default)]
    responses: Option<Vec<serde_json::Value>>,
}

impl FindProviders {
    pub(crate) fn new(client: HttpClient, api: &str, num_providers: u32) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            base: endpoint(api, "/api/v0/routing/findprovs")?,
            num_providers,
        })
    }

    fn url_for(&self, cid: &str) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("arg", cid)
            .append_pair("verbose", "false")
            .append_pair("num-providers", &self.num_providers.to_string());
        url.into()
    }
}

impl Executor for FindProviders {
    fn execute(
        &self,
        item: WorkItem,
        timeout: Duration,
    ) -> impl Future<Output = ExecutionResult> + Send {
        let client = self.client.clone();
        let target = item.key().map(|cid| (cid.to_string(), self.url_for(cid)));

        async move {
            let Some((cid, url)) = target else {
                tracing::warn!("find-providers expects CID items");
                return ExecutionResult::failed(Duration::ZERO);
            };

            let req = HttpRequest::post(url, Bytes::new()).timeout(timeout);
            let (latency, res) = timed(&client, req).await;
            outcome(Operation::FindProviders, &cid, latency, res, |res| {
                let providers = count_providers(&res.body);
                tracing::debug!(cid, providers, "lookup finished");
                Ok(None)
            })
        }
    }
}

/// Counts provider records across the NDJSON event stream. Unparseable lines are skipped.
fn count_providers(body: &[u8]) -> usize {
    let Ok(text) = std::str::from_utf8(body) else {
        return 0;
    };

    text.lines()
        .filter_map(|line| serde_json::from_str::<RoutingEvent>(line.trim()).ok())
        .filter(|ev| ev.kind == PROVIDER_EVENT)
        .map(|ev| ev.responses.map_or(0, |r| r.len()))
        .sum()
}
