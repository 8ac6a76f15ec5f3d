//! The service facade itself.

use super::config::DashboardConfig;
use super::error::ServiceError;
use crate::connectivity::{ConnectivityHandle, ConnectivityMonitor, HttpLivenessProbe};
use crate::manager::{LoadError, LoadOutcome, LoadRequest, SourceCache, SourceManager};
use crate::measurement::{DateRange, Series};
use crate::provider::{CsvSnapshotProvider, FeedApiProvider, ReqwestClient, SourceKind};
use crate::sync::{SyncEngine, SyncHandle};

type RemoteProvider = FeedApiProvider<ReqwestClient>;

/// A running dashboard data engine.
///
/// Owns the Source Manager and the two background loops. Bulk loads go
/// through [`DashboardService::load`], which re-seeds the sync engine's
/// running view whenever fresh data arrives; incremental updates and
/// connectivity changes are consumed through the respective handles.
pub struct DashboardService {
    manager: SourceManager<RemoteProvider, CsvSnapshotProvider>,
    sync: SyncHandle,
    connectivity: ConnectivityHandle,
}

impl DashboardService {
    /// Construct every component from `config`, run the initial bulk
    /// load, and start the background loops.
    ///
    /// A failed initial load is not fatal: the sync engine starts from
    /// an empty view and fills up as polls succeed.
    pub async fn start(config: DashboardConfig) -> Result<Self, ServiceError> {
        let http = ReqwestClient::new(config.remote.timeout)?;
        let remote = FeedApiProvider::new(http, config.remote.clone());
        let snapshot = CsvSnapshotProvider::new(&config.snapshot_path);
        let manager = SourceManager::new(
            remote.clone(),
            snapshot,
            SourceCache::new(),
            config.manager.clone(),
        );

        let request = LoadRequest::new(SourceKind::Remote)
            .with_range(DateRange::last_days(config.initial_window_days));
        let initial = match manager.load(request).await {
            Ok(LoadOutcome::Loaded(loaded)) => {
                tracing::info!(
                    source = %loaded.source,
                    records = loaded.series.len(),
                    "initial bulk load complete"
                );
                loaded.series
            }
            // A fresh manager has no competing loads; kept for completeness.
            Ok(LoadOutcome::Pending) => Series::new(),
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "initial bulk load failed; sync starts from an empty view"
                );
                Series::new()
            }
        };

        let sync = SyncEngine::new(remote, initial, config.sync.clone()).start();

        let probe =
            HttpLivenessProbe::new(config.liveness_url.as_str(), config.connectivity.probe_timeout)?;
        let connectivity = ConnectivityMonitor::new(probe, config.connectivity.clone()).start();

        Ok(Self {
            manager,
            sync,
            connectivity,
        })
    }

    /// Bulk or filtered load through the Source Manager.
    ///
    /// A fresh (non-cached) result replaces the sync engine's running
    /// view so subsequent incremental polls continue from the new
    /// watermark.
    pub async fn load(&self, request: LoadRequest) -> Result<LoadOutcome, LoadError> {
        let outcome = self.manager.load(request).await?;

        if let LoadOutcome::Loaded(loaded) = &outcome {
            if !loaded.from_cache {
                self.sync.replace_series(loaded.series.clone());
            }
        }

        Ok(outcome)
    }

    pub fn manager(&self) -> &SourceManager<RemoteProvider, CsvSnapshotProvider> {
        &self.manager
    }

    pub fn sync(&self) -> &SyncHandle {
        &self.sync
    }

    pub fn connectivity(&self) -> &ConnectivityHandle {
        &self.connectivity
    }

    /// Stop both background loops and wait for them to finish.
    pub async fn stop(self) {
        self.sync.stop().await;
        self.connectivity.stop().await;
    }
}
