//! Measurement source providers.
//!
//! This module provides traits and implementations for fetching bounded
//! windows of time-series measurements from the two origins the dashboard
//! knows about:
//!
//! - [`FeedApiProvider`] - the remote telemetry service's channel feed
//! - [`CsvSnapshotProvider`] - a local tabular snapshot file
//!
//! HTTP access goes through the [`AsyncHttpClient`] trait so providers can
//! be exercised against mock clients in tests.

mod error;
mod http;
mod remote;
mod snapshot;
mod types;

pub use error::{ProviderError, SnapshotParseError};
pub use http::{AsyncHttpClient, ReqwestClient};
pub use remote::{FeedApiProvider, RemoteConfig, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT};
pub use snapshot::{parse_snapshot, write_snapshot, CsvSnapshotProvider};
pub use types::{FeedPage, FeedQuery, RemoteFeed, SnapshotSource, SourceKind};

#[cfg(test)]
pub use http::tests::MockHttpClient;
