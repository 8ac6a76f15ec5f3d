//! Connectivity Monitor.
//!
//! Periodically probes a liveness endpoint to track backend
//! reachability through a small state machine:
//!
//! ```text
//! Unknown -> Checking -> Connected          (probe succeeded)
//!                     -> Limited            (probe failed, retries left)
//!                     -> Disconnected       (retry burst exhausted)
//! ```
//!
//! The monitor is an advisory signal for UI collaborators; it never
//! gates Source Manager operations. Environment online/offline signals
//! pre-empt the schedule: offline forces `Disconnected` and suspends
//! the periodic timer, online forces an immediate probe and resumes it.

mod config;
mod monitor;
mod probe;

pub use config::{
    ConnectivityConfig, DEFAULT_MAX_RETRIES, DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_TIMEOUT,
    DEFAULT_RETRY_DELAY,
};
pub use monitor::{ConnectivityHandle, ConnectivityMonitor, ConnectivityStatus, StatusChange};
pub use probe::{HttpLivenessProbe, LivenessProbe, ProbeError};
