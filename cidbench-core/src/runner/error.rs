pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("`rate` must be between 1 and {max}", max = super::config::MAX_RATE_PER_TICK)]
    InvalidRate,

    #[error("`tick` must be a positive duration")]
    InvalidTickInterval,

    #[error("`report_interval` must be a positive duration")]
    InvalidReportInterval,

    #[error("`timeout` must be a positive duration")]
    InvalidTimeout,

    #[error("`duration` must be a positive duration")]
    InvalidDuration,

    #[error("payload `size` must be a positive number of bytes")]
    InvalidPayloadSize,

    #[error("workload source reported {remaining} remaining items but yielded none")]
    SourceContract { remaining: u64 },

    #[error("completion received with no operation in flight")]
    TrackerUnderflow,

    #[error("completion channel closed with {active} operations in flight")]
    ChannelClosed { active: u64 },
}

impl Error {
    /// Whether the error stems from the run configuration rather than a fault during the run.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidRate
                | Self::InvalidTickInterval
                | Self::InvalidReportInterval
                | Self::InvalidTimeout
                | Self::InvalidDuration
                | Self::InvalidPayloadSize
        )
    }
}
