//! Aeropulse CLI - command-line interface
//!
//! This binary provides a command-line interface to the aeropulse
//! library: a one-shot `fetch` (with optional snapshot export) and a
//! live `watch` mode that runs the full engine and logs events.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use aeropulse::manager::{
    LoadOutcome, LoadRequest, SourceCache, SourceManager, SourceManagerConfig,
};
use aeropulse::measurement::DateRange;
use aeropulse::provider::{
    write_snapshot, CsvSnapshotProvider, FeedApiProvider, RemoteConfig, ReqwestClient, SourceKind,
    DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT,
};
use aeropulse::service::{DashboardConfig, DashboardService};
use aeropulse::sync::SyncEvent;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    /// The remote telemetry service's channel feed
    Remote,
    /// The local snapshot file
    Snapshot,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Remote => SourceKind::Remote,
            SourceArg::Snapshot => SourceKind::Snapshot,
        }
    }
}

#[derive(Debug, Args)]
struct ConnectionArgs {
    /// Channel feed base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Telemetry channel to read from
    #[arg(long, env = "AEROPULSE_CHANNEL_ID")]
    channel_id: u64,

    /// Read API key for private channels
    #[arg(long, env = "AEROPULSE_READ_API_KEY")]
    api_key: Option<String>,

    /// Path of the local snapshot file
    #[arg(long, default_value = "data/air_quality_data.csv")]
    snapshot: PathBuf,
}

impl ConnectionArgs {
    fn remote_config(&self) -> RemoteConfig {
        RemoteConfig {
            base_url: self.base_url.clone(),
            channel_id: self.channel_id,
            read_api_key: self.api_key.clone(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

#[derive(Parser)]
#[command(name = "aeropulse")]
#[command(about = "Air-quality dashboard data engine", long_about = None)]
#[command(version = aeropulse::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch measurements once and print a JSON summary
    Fetch {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Source to try first
        #[arg(long, value_enum, default_value = "remote")]
        source: SourceArg,

        /// Days of history to fetch
        #[arg(long, default_value_t = 7)]
        days: i64,

        /// Only check that data is available; do not write anything
        #[arg(long)]
        check_only: bool,

        /// Write the fetched series to this snapshot file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run the sync engine and connectivity monitor until Ctrl-C
    Watch {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Liveness endpoint probed by the connectivity monitor
        #[arg(long, default_value = "http://localhost:8000/api/status")]
        liveness_url: String,
    },
}

#[derive(Serialize)]
struct SummaryRange {
    start: String,
    end: String,
}

#[derive(Serialize)]
struct FetchSummary {
    success: bool,
    records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_range: Option<SummaryRange>,
    elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FetchSummary {
    fn failure(error: String, elapsed_seconds: f64) -> Self {
        Self {
            success: false,
            records: 0,
            source_used: None,
            date_range: None,
            elapsed_seconds,
            output: None,
            error: Some(error),
        }
    }
}

async fn run_fetch(
    connection: ConnectionArgs,
    source: SourceArg,
    days: i64,
    check_only: bool,
    output: Option<PathBuf>,
) -> FetchSummary {
    let started = Instant::now();
    let elapsed = |t: Instant| t.elapsed().as_secs_f64();

    let http = match ReqwestClient::new(DEFAULT_HTTP_TIMEOUT) {
        Ok(http) => http,
        Err(e) => return FetchSummary::failure(e.to_string(), elapsed(started)),
    };
    let remote = FeedApiProvider::new(http, connection.remote_config());
    let snapshot = CsvSnapshotProvider::new(&connection.snapshot);
    let manager = SourceManager::new(
        remote,
        snapshot,
        SourceCache::new(),
        SourceManagerConfig::default(),
    );

    let request = LoadRequest::new(source.into()).with_range(DateRange::last_days(days));
    let loaded = match manager.load(request).await {
        Ok(LoadOutcome::Loaded(loaded)) => loaded,
        Ok(LoadOutcome::Pending) => {
            return FetchSummary::failure("another load is in flight".into(), elapsed(started));
        }
        Err(e) => return FetchSummary::failure(e.to_string(), elapsed(started)),
    };

    let date_range = loaded
        .series
        .first()
        .zip(loaded.series.latest())
        .map(|(first, last)| SummaryRange {
            start: first.timestamp.to_rfc3339(),
            end: last.timestamp.to_rfc3339(),
        });

    let mut summary = FetchSummary {
        success: true,
        records: loaded.series.len(),
        source_used: Some(loaded.source.to_string()),
        date_range,
        elapsed_seconds: 0.0,
        output: None,
        error: None,
    };

    if let Some(path) = output {
        if check_only {
            tracing::info!(path = %path.display(), "check-only: skipping snapshot export");
        } else if let Err(e) = write_snapshot(&path, &loaded.series) {
            summary.success = false;
            summary.error = Some(e.to_string());
        } else {
            summary.output = Some(path.display().to_string());
        }
    }

    summary.elapsed_seconds = elapsed(started);
    summary
}

async fn run_watch(
    connection: ConnectionArgs,
    liveness_url: String,
) -> Result<(), aeropulse::service::ServiceError> {
    let config = DashboardConfig::new(
        connection.remote_config(),
        &connection.snapshot,
        liveness_url,
    );
    let service = DashboardService::start(config).await?;

    let mut sync_events = service.sync().subscribe();
    let mut status_events = service.connectivity().subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received; shutting down");
                break;
            }
            event = sync_events.recv() => match event {
                Ok(SyncEvent::NewRecords { count, records }) => {
                    tracing::info!(
                        count,
                        watermark = records.last().map(|r| r.id),
                        "new measurements"
                    );
                }
                Ok(SyncEvent::PersistentFailure { consecutive_failures }) => {
                    tracing::warn!(consecutive_failures, "sync is persistently failing");
                }
                Ok(SyncEvent::Recovered) => {
                    tracing::info!("sync recovered");
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "sync event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            change = status_events.recv() => match change {
                Ok(change) => {
                    tracing::info!(from = %change.from, to = %change.to, "connectivity changed");
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "status event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    service.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _guard = match aeropulse::logging::init_logging("logs", "aeropulse.log") {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: failed to initialize logging: {e}");
            None
        }
    };

    match cli.command {
        Command::Fetch {
            connection,
            source,
            days,
            check_only,
            output,
        } => {
            let summary = run_fetch(connection, source, days, check_only, output).await;
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("failed to serialize summary: {e}"),
            }
            if !summary.success {
                process::exit(1);
            }
        }
        Command::Watch {
            connection,
            liveness_url,
        } => {
            if let Err(e) = run_watch(connection, liveness_url).await {
                tracing::error!(error = %e, "watch failed");
                process::exit(1);
            }
        }
    }
}
