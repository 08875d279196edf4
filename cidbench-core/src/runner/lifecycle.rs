use super::tracker::ConcurrencyTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Dispatching and reporting.
    Running,
    /// No new dispatch; waiting for in-flight operations.
    Draining,
    Terminated,
}

/// Why dispatch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StopCause {
    /// The workload source ran out of items.
    Exhausted,
    /// An external interrupt (e.g. Ctrl-C) arrived.
    Interrupted,
    /// The configured maximum run duration elapsed.
    DeadlineReached,
}

/// `RUNNING -> DRAINING -> TERMINATED`.
///
/// Every stop trigger funnels through [`Lifecycle::begin_drain`]; only the first one is
/// recorded. [`Lifecycle::try_terminate`] reports the transition to `TERMINATED` exactly
/// once, which is what gates the final summary and persistence.
#[derive(Debug)]
pub struct Lifecycle {
    phase: Phase,
    cause: Option<StopCause>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: Phase::Running,
            cause: None,
        }
    }

    pub fn cause(&self) -> Option<StopCause> {
        self.cause
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Stops dispatch. Returns `false` if the run had already stopped.
    pub fn begin_drain(&mut self, cause: StopCause, tracker: &mut ConcurrencyTracker) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.phase = Phase::Draining;
        self.cause = Some(cause);
        tracker.mark_source_exhausted();
        true
    }

    /// Returns `true` on the single transition into `TERMINATED`.
    pub fn try_terminate(&mut self, tracker: &ConcurrencyTracker) -> bool {
        if self.phase != Phase::Draining || !tracker.is_complete() {
            return false;
        }
        self.phase = Phase::Terminated;
        true
    }
}
