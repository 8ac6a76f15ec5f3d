//! Integration tests for the service facade.
//!
//! Uses the real providers: an unreachable remote endpoint (nothing
//! listens on the loopback port) and a snapshot file on disk, so the
//! initial bulk load exercises the genuine failover path end to end.
//!
//! Run with: `cargo test --test service_integration`

use chrono::{Duration, SecondsFormat, Utc};

use aeropulse::manager::{LoadOutcome, LoadRequest};
use aeropulse::provider::{RemoteConfig, SourceKind};
use aeropulse::service::{DashboardConfig, DashboardService};

/// A remote endpoint that refuses connections immediately.
const UNREACHABLE: &str = "http://127.0.0.1:9/channels";

fn write_test_snapshot(path: &std::path::Path, ids: std::ops::RangeInclusive<u64>) {
    let mut contents = String::from("created_at,entry_id,humidity,temperature,pm25,pm10\n");
    let base = Utc::now() - Duration::hours(2);
    for id in ids {
        let timestamp = (base + Duration::minutes(id as i64))
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        contents.push_str(&format!("{timestamp},{id},48.0,21.5,12.0,18.0\n"));
    }
    std::fs::write(path, contents).unwrap();
}

fn test_config(snapshot_path: &std::path::Path) -> DashboardConfig {
    let remote = RemoteConfig {
        base_url: UNREACHABLE.to_string(),
        channel_id: 1,
        read_api_key: None,
        timeout: std::time::Duration::from_secs(2),
    };
    DashboardConfig::new(remote, snapshot_path, "http://127.0.0.1:9/api/status")
}

#[tokio::test]
async fn initial_load_fails_over_to_snapshot_and_seeds_sync() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("air_quality_data.csv");
    write_test_snapshot(&path, 1..=20);

    let service = DashboardService::start(test_config(&path)).await.unwrap();

    // The remote is unreachable, so the initial bulk load fell back to
    // the snapshot and seeded the sync engine's running view.
    assert_eq!(service.sync().series().len(), 20);
    assert_eq!(service.sync().watermark(), 20);

    service.stop().await;
}

#[tokio::test]
async fn explicit_snapshot_load_annotates_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("air_quality_data.csv");
    write_test_snapshot(&path, 1..=5);

    let service = DashboardService::start(test_config(&path)).await.unwrap();

    let outcome = service
        .load(LoadRequest::new(SourceKind::Snapshot))
        .await
        .unwrap();

    match outcome {
        LoadOutcome::Loaded(loaded) => {
            assert_eq!(loaded.source, SourceKind::Snapshot);
            assert_eq!(loaded.series.len(), 5);
        }
        LoadOutcome::Pending => panic!("unexpected pending outcome"),
    }

    service.stop().await;
}

#[tokio::test]
async fn missing_snapshot_and_dead_remote_still_starts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does_not_exist.csv");

    // Both sources are unavailable; the service starts with an empty
    // sync view rather than failing.
    let service = DashboardService::start(test_config(&path)).await.unwrap();
    assert_eq!(service.sync().series().len(), 0);
    assert_eq!(service.sync().watermark(), 0);

    service.stop().await;
}
