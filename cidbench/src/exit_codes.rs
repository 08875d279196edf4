#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// The run reached termination, whatever the individual operation outcomes.
    Success = 0,

    /// Invalid CLI/config/options (bad flags, unreadable CID list, non-positive rate, etc.).
    InvalidInput = 30,

    /// Internal/runtime error (IO errors while persisting results, broken engine invariants).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
