use super::error::{Error, Result};

/// Counts in-flight operations and decides when a run has nothing left to wait for.
#[derive(Debug, Default)]
pub struct ConcurrencyTracker {
    active: u64,
    source_exhausted: bool,
}

impl ConcurrencyTracker {
    pub fn dispatched(&mut self) {
        self.active = self.active.saturating_add(1);
    }

    pub fn completed(&mut self) -> Result<()> {
        self.active = self.active.checked_sub(1).ok_or(Error::TrackerUnderflow)?;
        Ok(())
    }

    /// No further dispatch will happen, either because the source ran dry or the run
    /// was told to stop.
    pub fn mark_source_exhausted(&mut self) {
        self.source_exhausted = true;
    }

    pub fn active(&self) -> u64 {
        self.active
    }

    pub fn is_complete(&self) -> bool {
        self.source_exhausted && self.active == 0
    }
}
