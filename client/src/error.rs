use srs_shared::{RemoteError, Topic};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to subscribe to {topic}: {source}")]
    Subscribe {
        topic: Topic,
        #[source]
        source: RemoteError,
    },

    #[error("poll interval must be non-zero")]
    ZeroPollInterval,

    #[error("{0} session is no longer running")]
    SessionClosed(&'static str),
}

/// Field errors raised when a frequency is submitted
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FrequencyError {
    #[error("Minimum is 000.001 (got {0:.3})")]
    BelowMinimum(f64),

    #[error("Maximum is 999.999 (got {0:.3})")]
    AboveMaximum(f64),

    #[error("Frequency must be a number")]
    NotANumber,
}
