//! Integration tests for the Incremental Sync Engine's polling loop.
//!
//! Deterministic merge/watermark behavior is covered by unit tests next
//! to the engine; these tests exercise the spawned loop end to end:
//! event delivery, the foreground gate, the aggregated failure signal,
//! and shutdown.
//!
//! Run with: `cargo test --test sync_integration`

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::time::timeout;

use aeropulse::measurement::{ChannelValues, Measurement, Series};
use aeropulse::provider::{FeedPage, FeedQuery, ProviderError, RemoteFeed};
use aeropulse::sync::{SyncConfig, SyncEngine, SyncEvent, SyncHandle};

// ============================================================================
// Test Helpers
// ============================================================================

/// Poll interval small enough to keep the tests fast but comfortably
/// above scheduling jitter.
const TEST_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Generous upper bound for waiting on an expected event.
const EVENT_TIMEOUT: Duration = Duration::from_millis(500);

fn ts(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 12, 10, minute, 0).unwrap()
}

fn record(id: u64) -> Measurement {
    Measurement::new(id, ts(id as u32), ChannelValues::default())
}

struct ScriptedFeed {
    script: Mutex<VecDeque<Result<FeedPage, ProviderError>>>,
    last: Mutex<Result<FeedPage, ProviderError>>,
    calls: AtomicUsize,
}

impl ScriptedFeed {
    fn new(script: Vec<Result<FeedPage, ProviderError>>) -> Arc<Self> {
        let last = script.last().cloned().unwrap_or(Ok(FeedPage::default()));
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
        })
    }

    fn page(records: Vec<Measurement>) -> Result<FeedPage, ProviderError> {
        let last_entry_id = records.iter().map(|r| r.id).max();
        Ok(FeedPage {
            records,
            last_entry_id,
        })
    }
}

impl RemoteFeed for ScriptedFeed {
    async fn fetch_window(&self, _query: FeedQuery) -> Result<FeedPage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(step) => {
                *self.last.lock().unwrap() = step.clone();
                step
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

fn start_engine(feed: &Arc<ScriptedFeed>, initial: Series, threshold: u32) -> SyncHandle {
    let config = SyncConfig {
        poll_interval: TEST_POLL_INTERVAL,
        batch_limit: 100,
        persistent_failure_threshold: threshold,
    };
    SyncEngine::new(Arc::clone(feed), initial, config).start()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn new_records_reach_subscribers() {
    let feed = ScriptedFeed::new(vec![
        ScriptedFeed::page(vec![record(5), record(6)]),
        ScriptedFeed::page(vec![]),
    ]);
    let handle = start_engine(&feed, Series::from_records(vec![record(4)]), 3);
    let mut events = handle.subscribe();

    let event = timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for a sync event")
        .unwrap();

    match event {
        SyncEvent::NewRecords { count, records } => {
            assert_eq!(count, 2);
            let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
            assert_eq!(ids, vec![5, 6]);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    assert_eq!(handle.watermark(), 6);
    assert_eq!(handle.series().len(), 3);
    assert_eq!(handle.state().consecutive_failures, 0);

    handle.stop().await;
}

#[tokio::test]
async fn empty_polls_emit_nothing() {
    let feed = ScriptedFeed::new(vec![ScriptedFeed::page(vec![])]);
    let handle = start_engine(&feed, Series::from_records(vec![record(6)]), 3);
    let mut events = handle.subscribe();

    // Let several polls go by; absence of new data is not an event.
    tokio::time::sleep(TEST_POLL_INTERVAL * 4).await;
    assert!(events.try_recv().is_err());
    assert_eq!(handle.watermark(), 6);

    handle.stop().await;
}

#[tokio::test]
async fn persistent_failure_signals_once_and_polling_continues() {
    let feed = ScriptedFeed::new(vec![Err(ProviderError::Http("backend down".into()))]);
    let handle = start_engine(&feed, Series::new(), 3);
    let mut events = handle.subscribe();

    let event = timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for the persistent-failure signal")
        .unwrap();
    match event {
        SyncEvent::PersistentFailure {
            consecutive_failures,
        } => assert_eq!(consecutive_failures, 3),
        other => panic!("unexpected event: {other:?}"),
    }

    // Polling continues past the threshold, with no repeat signal.
    let calls_at_signal = feed.calls.load(Ordering::SeqCst);
    tokio::time::sleep(TEST_POLL_INTERVAL * 5).await;
    assert!(feed.calls.load(Ordering::SeqCst) > calls_at_signal);
    assert!(events.try_recv().is_err());

    handle.stop().await;
}

#[tokio::test]
async fn backgrounded_engine_does_not_poll() {
    let feed = ScriptedFeed::new(vec![ScriptedFeed::page(vec![])]);
    let handle = start_engine(&feed, Series::new(), 3);

    // Let the loop run, then background the session.
    tokio::time::sleep(TEST_POLL_INTERVAL * 2).await;
    handle.set_foreground(false);
    tokio::time::sleep(TEST_POLL_INTERVAL).await;

    let paused_at = feed.calls.load(Ordering::SeqCst);
    tokio::time::sleep(TEST_POLL_INTERVAL * 5).await;
    assert_eq!(feed.calls.load(Ordering::SeqCst), paused_at);

    // Foregrounding resumes polling.
    handle.set_foreground(true);
    tokio::time::sleep(TEST_POLL_INTERVAL * 3).await;
    assert!(feed.calls.load(Ordering::SeqCst) > paused_at);

    handle.stop().await;
}

#[tokio::test]
async fn stop_halts_polling() {
    let feed = ScriptedFeed::new(vec![ScriptedFeed::page(vec![])]);
    let handle = start_engine(&feed, Series::new(), 3);

    tokio::time::sleep(TEST_POLL_INTERVAL * 2).await;
    handle.stop().await;

    let stopped_at = feed.calls.load(Ordering::SeqCst);
    tokio::time::sleep(TEST_POLL_INTERVAL * 4).await;
    assert_eq!(feed.calls.load(Ordering::SeqCst), stopped_at);
}
