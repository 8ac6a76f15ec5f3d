//! Sync engine state snapshot.

use chrono::{DateTime, Utc};

/// The sync engine's view of its own progress.
///
/// Owned by the engine's polling task; external readers get copies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncState {
    /// Highest record id already incorporated into the series.
    pub watermark: u64,

    /// Wall-clock time of the last successful poll.
    pub last_synced_at: Option<DateTime<Utc>>,

    /// Failed polls since the last success. Reset to zero on any
    /// successful poll, including an empty one.
    pub consecutive_failures: u32,
}

impl SyncState {
    pub fn new(watermark: u64) -> Self {
        Self {
            watermark,
            last_synced_at: None,
            consecutive_failures: 0,
        }
    }
}
