use std::future::Future;
use std::time::Duration;

use cidbench_core::{ExecutionResult, Executor, WorkItem};
use cidbench_http::{HttpClient, HttpRequest};

use super::{Operation, endpoint, outcome, timed};

/// Resolves a CID against an IPNI indexer via `GET <indexer>/cid/<cid>`.
///
/// Indexers answer 404 for unknown CIDs, which counts as a failed lookup.
#[derive(Debug, Clone)]
pub(crate) struct IndexerLookup {
    client: HttpClient,
    base: url::Url,
}

impl IndexerLookup {
    pub(crate) fn new(client: HttpClient, indexer: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            base: endpoint(indexer, "/cid")?,
        })
    }

    fn url_for(&self, cid: &str) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(cid);
        }
        url.into()
    }
}

impl Executor for IndexerLookup {
    fn execute(
        &self,
        item: WorkItem,
        timeout: Duration,
    ) -> impl Future<Output = ExecutionResult> + Send {
        let client = self.client.clone();
        let target = item.key().map(|cid| (cid.to_string(), self.url_for(cid)));

        async move {
            let Some((cid, url)) = target else {
                tracing::warn!("indexer-lookup expects CID items");
                return ExecutionResult::failed(Duration::ZERO);
            };

            let req = HttpRequest::get(url)
                .header("accept", "application/json")
                .timeout(timeout);
            let (latency, res) = timed(&client, req).await;
            outcome(Operation::IndexerLookup, &cid, latency, res, |_| Ok(None))
        }
    }
}
