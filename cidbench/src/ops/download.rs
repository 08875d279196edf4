use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use cidbench_core::{ExecutionResult, Executor, WorkItem};
use cidbench_http::{HttpClient, HttpRequest};

use super::{Operation, endpoint, outcome, timed};

/// Fetches the full content behind a CID via `POST /api/v0/cat?arg=<cid>`.
#[derive(Debug, Clone)]
pub(crate) struct Download {
    client: HttpClient,
    base: url::Url,
}

impl Download {
    pub(crate) fn new(client: HttpClient, api: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            base: endpoint(api, "/api/v0/cat")?,
        })
    }

    fn url_for(&self, cid: &str) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair("arg", cid);
        url.into()
    }
}

impl Executor for Download {
    fn execute(
        &self,
        item: WorkItem,
        timeout: Duration,
    ) -> impl Future<Output = ExecutionResult> + Send {
        let client = self.client.clone();
        let target = item.key().map(|cid| (cid.to_string(), self.url_for(cid)));

        async move {
            let Some((cid, url)) = target else {
                tracing::warn!("download expects CID items");
                return ExecutionResult::failed(Duration::ZERO);
            };

            let req = HttpRequest::post(url, Bytes::new()).timeout(timeout);
            let (latency, res) = timed(&client, req).await;
            outcome(Operation::Download, &cid, latency, res, |res| {
                tracing::debug!(cid, bytes = res.body.len(), "content received");
                Ok(None)
            })
        }
    }
}
