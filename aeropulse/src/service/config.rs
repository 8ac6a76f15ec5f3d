//! Service-level configuration.

use std::path::PathBuf;

use crate::connectivity::ConnectivityConfig;
use crate::manager::SourceManagerConfig;
use crate::provider::RemoteConfig;
use crate::sync::SyncConfig;

/// Default width of the initial bulk-load window, in days.
pub const DEFAULT_INITIAL_WINDOW_DAYS: i64 = 7;

/// Everything needed to construct a [`super::DashboardService`].
///
/// Component configurations default to their documented values and can
/// be overridden field by field.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Remote feed endpoint and credentials.
    pub remote: RemoteConfig,

    /// Path of the local snapshot file.
    pub snapshot_path: PathBuf,

    /// Liveness endpoint URL for the connectivity monitor.
    pub liveness_url: String,

    /// Days of history to request in the initial bulk load.
    pub initial_window_days: i64,

    pub manager: SourceManagerConfig,
    pub sync: SyncConfig,
    pub connectivity: ConnectivityConfig,
}

impl DashboardConfig {
    pub fn new(
        remote: RemoteConfig,
        snapshot_path: impl Into<PathBuf>,
        liveness_url: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            snapshot_path: snapshot_path.into(),
            liveness_url: liveness_url.into(),
            initial_window_days: DEFAULT_INITIAL_WINDOW_DAYS,
            manager: SourceManagerConfig::default(),
            sync: SyncConfig::default(),
            connectivity: ConnectivityConfig::default(),
        }
    }
}
