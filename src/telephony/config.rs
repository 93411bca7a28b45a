use std::time::Duration;

use crate::poll::PollPolicy;

/// Timing knobs for a call session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimings {
    /// Delay between call-status fetches
    /// Default: 5 seconds
    pub poll_interval: Duration,

    /// Give up on the call if it is not terminal after this long
    /// Default: 180 seconds (3 minutes)
    pub max_wait: Duration,

    /// Wait before fetching recording media, which is not always finalized
    /// the instant the call completes
    /// Default: 10 seconds
    pub recording_grace: Duration,
}

impl CallTimings {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::bounded(self.poll_interval, self.max_wait)
    }
}

impl Default for CallTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(180),
            recording_grace: Duration::from_secs(10),
        }
    }
}
