//! Incremental Sync Engine.
//!
//! Polls the remote feed for records newer than the current watermark
//! and merges them into the running in-memory series without reloading
//! the whole dataset. Subscribers are notified of new data over a
//! broadcast channel; persistent failure is reported as one aggregated
//! signal rather than one event per failed poll.

mod config;
mod engine;
mod state;

pub use config::{SyncConfig, DEFAULT_BATCH_LIMIT, DEFAULT_FAILURE_THRESHOLD, DEFAULT_POLL_INTERVAL};
pub use engine::{SyncEngine, SyncEvent, SyncHandle};
pub use state::SyncState;
