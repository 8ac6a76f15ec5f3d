//! Poll loop and merge logic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::SyncConfig;
use super::state::SyncState;
use crate::measurement::{Measurement, Series};
use crate::provider::{FeedPage, FeedQuery, ProviderError, RemoteFeed};

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Notifications published by the sync engine.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// New records were merged into the series.
    NewRecords {
        count: usize,
        records: Vec<Measurement>,
    },

    /// Consecutive poll failures reached the configured threshold.
    /// Fires once per degradation episode, not once per failed poll.
    PersistentFailure { consecutive_failures: u32 },

    /// A poll succeeded after a persistent failure had been reported.
    Recovered,
}

/// State shared between the polling task and handle readers.
///
/// The polling task is the only writer of `series` and `state`; the
/// mutexes exist for the snapshot accessors and for bulk re-seeding.
struct SyncShared {
    series: Mutex<Series>,
    state: Mutex<SyncState>,
    foreground: AtomicBool,
    /// True between a fired persistent-failure signal and the next
    /// successful poll.
    degraded: AtomicBool,
}

/// Incremental sync engine over a remote feed.
///
/// Construct with the series from an initial bulk load, then call
/// [`SyncEngine::start`] to spawn the polling loop.
pub struct SyncEngine<R> {
    provider: R,
    shared: Arc<SyncShared>,
    events: broadcast::Sender<SyncEvent>,
    config: SyncConfig,
    cancel: CancellationToken,
}

impl<R: RemoteFeed + 'static> SyncEngine<R> {
    /// Spawn the polling loop and return a handle to it.
    pub fn start(self) -> SyncHandle {
        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run());

        SyncHandle {
            shared,
            events,
            cancel,
            task: Some(task),
        }
    }
}

impl<R: RemoteFeed> SyncEngine<R> {
    /// Create an engine seeded with `initial` (typically the result of a
    /// bulk load through the Source Manager). The watermark starts at
    /// the seed's highest record id.
    pub fn new(provider: R, initial: Series, config: SyncConfig) -> Self {
        let watermark = initial.watermark().unwrap_or(0);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            provider,
            shared: Arc::new(SyncShared {
                series: Mutex::new(initial),
                state: Mutex::new(SyncState::new(watermark)),
                foreground: AtomicBool::new(true),
                degraded: AtomicBool::new(false),
            }),
            events,
            config,
            cancel: CancellationToken::new(),
        }
    }

    async fn run(self) {
        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            watermark = self.shared.state.lock().unwrap().watermark,
            "incremental sync engine started"
        );

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            let running = tokio::select! {
                _ = self.cancel.cancelled() => false,
                _ = interval.tick() => true,
            };
            if !running {
                break;
            }

            if !self.shared.foreground.load(Ordering::Acquire) {
                tracing::trace!("session backgrounded; skipping poll");
                continue;
            }

            self.poll_once().await;
        }

        tracing::info!("incremental sync engine stopped");
    }

    /// Run a single incremental poll: fetch records above the watermark
    /// and merge them. One poll is in flight at a time by construction -
    /// the loop awaits each poll before scheduling the next.
    async fn poll_once(&self) {
        let watermark = self.shared.state.lock().unwrap().watermark;
        let query = FeedQuery::new(self.config.batch_limit).since(watermark);

        let result = self.provider.fetch_window(query).await;

        // The session may have been torn down while the fetch was in
        // flight; let it complete but discard the result.
        if self.cancel.is_cancelled() {
            tracing::debug!("discarding poll result after shutdown");
            return;
        }

        match result {
            Ok(page) => self.apply_page(watermark, page),
            Err(error) => self.record_failure(&error),
        }
    }

    fn apply_page(&self, polled_watermark: u64, page: FeedPage) {
        if let Some(last_entry_id) = page.last_entry_id {
            if last_entry_id < polled_watermark {
                tracing::warn!(
                    provider_last_entry_id = last_entry_id,
                    watermark = polled_watermark,
                    "provider reports an older last entry than our watermark"
                );
            }
        }

        let appended_records;
        let report;
        {
            let mut series = self.shared.series.lock().unwrap();
            let mut state = self.shared.state.lock().unwrap();

            let before = series.len();
            report = series.merge_newer(page.records);

            if report.rejected > 0 {
                // A watermark-bounded query must not return records at
                // or below the watermark; filter and keep going.
                tracing::warn!(
                    rejected = report.rejected,
                    watermark = polled_watermark,
                    "dropped stale or duplicate records from incremental page"
                );
            }

            if report.appended > 0 {
                state.watermark = series.watermark().unwrap_or(state.watermark);
            }
            state.consecutive_failures = 0;
            state.last_synced_at = Some(Utc::now());

            appended_records = series.records()[before..].to_vec();
        }

        let was_degraded = self.shared.degraded.swap(false, Ordering::AcqRel);
        if was_degraded {
            tracing::info!("incremental sync recovered");
            let _ = self.events.send(SyncEvent::Recovered);
        }

        if report.appended > 0 {
            tracing::debug!(
                appended = report.appended,
                watermark = self.shared.state.lock().unwrap().watermark,
                "merged incremental records"
            );
            let _ = self.events.send(SyncEvent::NewRecords {
                count: report.appended,
                records: appended_records,
            });
        }
    }

    fn record_failure(&self, error: &ProviderError) {
        let failures = {
            let mut state = self.shared.state.lock().unwrap();
            state.consecutive_failures += 1;
            state.consecutive_failures
        };

        tracing::warn!(
            error = %error,
            consecutive_failures = failures,
            "incremental poll failed"
        );

        if failures == self.config.persistent_failure_threshold {
            self.shared.degraded.store(true, Ordering::Release);
            tracing::warn!(
                threshold = self.config.persistent_failure_threshold,
                "persistent sync failure; signalling subscribers"
            );
            let _ = self.events.send(SyncEvent::PersistentFailure {
                consecutive_failures: failures,
            });
        }
    }
}

/// Handle to a running sync engine.
pub struct SyncHandle {
    shared: Arc<SyncShared>,
    events: broadcast::Sender<SyncEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Subscribe to engine events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the engine's progress state.
    pub fn state(&self) -> SyncState {
        *self.shared.state.lock().unwrap()
    }

    /// Highest record id incorporated so far.
    pub fn watermark(&self) -> u64 {
        self.shared.state.lock().unwrap().watermark
    }

    /// Snapshot of the running series.
    pub fn series(&self) -> Series {
        self.shared.series.lock().unwrap().clone()
    }

    /// Replace the running series after a bulk reload, re-deriving the
    /// watermark from the new data.
    pub fn replace_series(&self, series: Series) {
        let watermark = series.watermark().unwrap_or(0);
        let mut current = self.shared.series.lock().unwrap();
        let mut state = self.shared.state.lock().unwrap();
        *current = series;
        state.watermark = watermark;
        tracing::debug!(watermark, records = current.len(), "sync view replaced");
    }

    /// Foreground/background gate: polling is suspended entirely while
    /// backgrounded.
    pub fn set_foreground(&self, foreground: bool) {
        self.shared.foreground.store(foreground, Ordering::Release);
    }

    /// Cancel the polling loop and wait for it to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}
