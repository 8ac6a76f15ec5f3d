//! Snapshot file provider.
//!
//! The snapshot is a comma-separated tabular file with a header row, as
//! exported by the fetch tooling (see [`write_snapshot`]). Columns are
//! located by header name: `entry_id` and `created_at` are required;
//! channel columns are looked up by their canonical names with a
//! fallback to the raw `field1`..`field4` keys older exports used.
//!
//! Row-level problems never fail the whole file: a row with a garbled id
//! or timestamp is skipped with a warning, and a channel cell that does
//! not parse as a number becomes `None`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use super::error::{ProviderError, SnapshotParseError};
use super::types::SnapshotSource;
use crate::measurement::{ChannelName, ChannelValues, Measurement, Series};

/// Timestamp formats accepted in snapshot rows, tried in order after
/// RFC 3339: offset-bearing and naive exports.
const OFFSET_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";
const NAIVE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Snapshot provider reading a tabular file from disk.
#[derive(Debug, Clone)]
pub struct CsvSnapshotProvider {
    path: PathBuf,
}

impl CsvSnapshotProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for CsvSnapshotProvider {
    async fn fetch_all(&self) -> Result<Vec<Measurement>, ProviderError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ProviderError::Io(format!("{}: {e}", self.path.display())))?;

        let records = parse_snapshot(&contents)?;

        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            "loaded snapshot file"
        );

        Ok(records)
    }
}

/// Column positions resolved from the header row.
struct ColumnMap {
    entry_id: usize,
    created_at: usize,
    channels: [(ChannelName, Option<usize>); 4],
}

impl ColumnMap {
    fn from_header(header: &str) -> Result<Self, SnapshotParseError> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let position = |name: &str| names.iter().position(|n| *n == name);

        let entry_id = position("entry_id").ok_or(SnapshotParseError::MissingColumn("entry_id"))?;
        let created_at =
            position("created_at").ok_or(SnapshotParseError::MissingColumn("created_at"))?;

        let mut channels = [(ChannelName::Humidity, None); 4];
        for (slot, channel) in channels.iter_mut().zip(ChannelName::ALL) {
            *slot = (
                channel,
                position(channel.as_str()).or_else(|| position(channel.field_key())),
            );
        }

        Ok(Self {
            entry_id,
            created_at,
            channels,
        })
    }
}

/// Parse a complete snapshot file.
///
/// Returns an error only for structural problems (no header, missing
/// required columns); malformed rows are skipped with a warning.
pub fn parse_snapshot(contents: &str) -> Result<Vec<Measurement>, SnapshotParseError> {
    let mut lines = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or(SnapshotParseError::MissingHeader)?;
    let columns = ColumnMap::from_header(header)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (index, line) in lines {
        match parse_row(line, &columns) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                tracing::warn!(line = index + 1, "skipping malformed snapshot row");
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, kept = records.len(), "snapshot had malformed rows");
    }

    Ok(records)
}

fn parse_row(line: &str, columns: &ColumnMap) -> Option<Measurement> {
    let cells: Vec<&str> = line.split(',').map(str::trim).collect();
    let cell = |index: usize| cells.get(index).copied().unwrap_or("");

    let id: u64 = cell(columns.entry_id).parse().ok()?;
    let timestamp = parse_timestamp(cell(columns.created_at))?;

    let mut values = ChannelValues::default();
    for (channel, position) in columns.channels {
        let raw = position.map(cell).unwrap_or("");
        values.set(channel, raw.parse::<f64>().ok());
    }

    Some(Measurement::new(id, timestamp, values))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(raw, OFFSET_TIME_FORMAT) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, NAIVE_TIME_FORMAT) {
        return Some(t.and_utc());
    }
    None
}

/// Write a series to a snapshot file in the format [`parse_snapshot`]
/// reads back.
pub fn write_snapshot(path: &Path, series: &Series) -> Result<(), ProviderError> {
    let mut out = String::from("created_at,entry_id,humidity,temperature,pm25,pm10\n");

    for record in series.iter() {
        let timestamp = record
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        out.push_str(&timestamp);
        out.push(',');
        out.push_str(&record.id.to_string());
        for channel in ChannelName::ALL {
            out.push(',');
            if let Some(value) = record.value(channel) {
                out.push_str(&value.to_string());
            }
        }
        out.push('\n');
    }

    std::fs::write(path, out).map_err(|e| ProviderError::Io(format!("{}: {e}", path.display())))?;

    tracing::debug!(
        path = %path.display(),
        records = series.len(),
        "wrote snapshot file"
    );

    Ok(())
}
