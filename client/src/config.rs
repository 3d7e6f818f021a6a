use std::time::Duration;

use crate::notifications::NOTIFICATION_TTL;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Timing knobs for the sync sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Interval of the periodic pull for every domain
    pub poll_interval: Duration,
    /// Lifetime of a notification after it arrives
    pub notification_ttl: Duration,
}

impl SyncConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_notification_ttl(mut self, notification_ttl: Duration) -> Self {
        self.notification_ttl = notification_ttl;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            notification_ttl: NOTIFICATION_TTL,
        }
    }
}
