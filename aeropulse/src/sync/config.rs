//! Configuration for the Incremental Sync Engine.

use std::time::Duration;

/// Default interval between incremental polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(45);

/// Default record limit per incremental poll.
pub const DEFAULT_BATCH_LIMIT: usize = 100;

/// Default number of consecutive failures before the persistent-failure
/// signal fires.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Configuration for a [`super::SyncEngine`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How often to poll for new records while foregrounded.
    pub poll_interval: Duration,

    /// Record limit per incremental poll.
    pub batch_limit: usize,

    /// Consecutive failures at which the persistent-failure signal
    /// fires. Polling continues regardless.
    pub persistent_failure_threshold: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            batch_limit: DEFAULT_BATCH_LIMIT,
            persistent_failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}
