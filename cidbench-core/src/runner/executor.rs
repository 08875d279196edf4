use std::future::Future;
use std::time::Duration;

use super::workload::WorkItem;

/// Outcome of one timed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    /// Wall-clock time of the operation. Only successful latencies enter the averages.
    pub latency: Duration,
    /// An identifier created by the operation, such as the CID of an uploaded payload.
    pub produced: Option<String>,
}

impl ExecutionResult {
    pub fn succeeded(latency: Duration) -> Self {
        Self {
            success: true,
            latency,
            produced: None,
        }
    }

    pub fn failed(latency: Duration) -> Self {
        Self {
            success: false,
            latency,
            produced: None,
        }
    }

    #[must_use]
    pub fn with_produced(mut self, id: impl Into<String>) -> Self {
        self.produced = Some(id.into());
        self
    }
}

/// Performs one unit of work against the collaborator under test.
///
/// Ordinary failures (transport errors, timeouts, unexpected responses) are reported
/// through [`ExecutionResult::failed`], never by panicking.
pub trait Executor: Send + Sync + 'static {
    fn execute(
        &self,
        item: WorkItem,
        timeout: Duration,
    ) -> impl Future<Output = ExecutionResult> + Send;
}
