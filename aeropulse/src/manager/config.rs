//! Configuration for the Source Manager.

use std::time::Duration;

/// Default time-to-live for cached fetch results (15 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Default maximum number of records per bulk fetch.
pub const DEFAULT_RESULT_LIMIT: usize = 8000;

/// Configuration for a [`super::SourceManager`].
#[derive(Debug, Clone)]
pub struct SourceManagerConfig {
    /// How long a cached fetch result stays servable.
    pub cache_ttl: Duration,

    /// Record limit passed to remote bulk fetches.
    pub result_limit: usize,
}

impl Default for SourceManagerConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }
}
