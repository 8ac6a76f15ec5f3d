//! Provider traits and shared request/response types.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::error::ProviderError;
use crate::measurement::{DateRange, Measurement};

/// Which origin a series of measurements came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The remote telemetry service's channel feed.
    Remote,
    /// A local snapshot file exported earlier.
    Snapshot,
}

impl SourceKind {
    /// The other source, for failover.
    pub fn other(&self) -> SourceKind {
        match self {
            SourceKind::Remote => SourceKind::Snapshot,
            SourceKind::Snapshot => SourceKind::Remote,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Remote => "remote",
            SourceKind::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a bounded window fetch from the remote feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedQuery {
    /// Maximum number of records to return.
    pub results: usize,
    /// Only return records with id strictly greater than this.
    pub since_id: Option<u64>,
    /// Restrict records to a time window.
    pub range: Option<DateRange>,
}

impl FeedQuery {
    pub fn new(results: usize) -> Self {
        Self {
            results,
            since_id: None,
            range: None,
        }
    }

    pub fn since(mut self, id: u64) -> Self {
        self.since_id = Some(id);
        self
    }

    pub fn range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }
}

/// One page of records from the remote feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    /// Records in the window, in the provider's arrival order.
    pub records: Vec<Measurement>,
    /// The provider's own notion of its most recent record id, when
    /// reported. Used to validate the sync engine's watermark.
    pub last_entry_id: Option<u64>,
}

/// A remote origin serving bounded windows of measurements.
///
/// Implementations fetch from the telemetry service's REST feed; tests
/// substitute scripted fakes.
pub trait RemoteFeed: Send + Sync {
    /// Fetch a window of measurements described by `query`.
    fn fetch_window(
        &self,
        query: FeedQuery,
    ) -> impl Future<Output = Result<FeedPage, ProviderError>> + Send;
}

/// A local origin serving its entire contents at once.
pub trait SnapshotSource: Send + Sync {
    /// Fetch every record the snapshot holds.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Measurement>, ProviderError>> + Send;
}

impl<T: RemoteFeed> RemoteFeed for std::sync::Arc<T> {
    fn fetch_window(
        &self,
        query: FeedQuery,
    ) -> impl Future<Output = Result<FeedPage, ProviderError>> + Send {
        (**self).fetch_window(query)
    }
}

impl<T: SnapshotSource> SnapshotSource for std::sync::Arc<T> {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Measurement>, ProviderError>> + Send {
        (**self).fetch_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_source_flips() {
        assert_eq!(SourceKind::Remote.other(), SourceKind::Snapshot);
        assert_eq!(SourceKind::Snapshot.other(), SourceKind::Remote);
    }

    #[test]
    fn query_builder_sets_fields() {
        let query = FeedQuery::new(100).since(42);
        assert_eq!(query.results, 100);
        assert_eq!(query.since_id, Some(42));
        assert_eq!(query.range, None);
    }
}
