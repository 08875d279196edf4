mod config;
mod error;
mod executor;
mod lifecycle;
mod outputs;
mod progress;
mod reporter;
mod run;
mod scheduler;
mod stats;
mod tracker;
mod workload;

pub use config::{MAX_RATE_PER_TICK, RunConfig};
pub use error::{Error, Result};
pub use executor::{ExecutionResult, Executor};
pub use lifecycle::{Lifecycle, StopCause};
pub use outputs::{IdentifierSink, read_identifiers, write_identifiers};
pub use progress::ProgressFn;
pub use reporter::Reporter;
pub use run::{RunSummary, run};
pub use scheduler::RateScheduler;
pub use stats::{Snapshot, StatsAggregator};
pub use tracker::ConcurrencyTracker;
pub use workload::{ListSource, Remaining, SyntheticSource, WorkItem, WorkloadSource};
