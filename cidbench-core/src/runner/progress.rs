use super::stats::Snapshot;

/// Receives intermediate snapshots while the run is in its `RUNNING` phase.
pub type ProgressFn = std::sync::Arc<dyn Fn(Snapshot) + Send + Sync + 'static>;
