//! Configuration for the Connectivity Monitor.

use std::time::Duration;

/// Default interval between periodic probe cycles.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Default timeout for a single liveness request.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of retries in a burst before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between retries within a burst.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Configuration for a [`super::ConnectivityMonitor`].
#[derive(Debug, Clone)]
pub struct ConnectivityConfig {
    /// Interval between periodic probe cycles.
    pub probe_interval: Duration,

    /// Timeout for a single liveness request.
    pub probe_timeout: Duration,

    /// Retries within a burst before transitioning to Disconnected.
    /// This is a bounded burst with a fixed delay, not backoff.
    pub max_retries: u32,

    /// Delay between retries within a burst.
    pub retry_delay: Duration,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_interval: DEFAULT_PROBE_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}
