//! Rate-controlled load generation and latency statistics for content-addressed
//! storage gateways.
//!
//! The engine in [`runner`] paces work items drawn from a [`runner::WorkloadSource`]
//! into an [`runner::Executor`], tracks in-flight operations, aggregates timings and
//! reports snapshots until the workload is exhausted or the run is interrupted.

pub mod runner;

pub use runner::{
    Error, ExecutionResult, Executor, ProgressFn, Result, RunConfig, RunSummary, Snapshot,
    StopCause, WorkItem, WorkloadSource, run,
};
