//! Remote telemetry feed provider.
//!
//! Fetches bounded windows of measurements from the telemetry service's
//! channel feed endpoint. The wire format is the service's JSON document:
//!
//! ```json
//! {
//!   "channel": { "id": 2863798, "last_entry_id": 1412 },
//!   "feeds": [
//!     { "created_at": "2025-04-12T10:00:00Z", "entry_id": 1410,
//!       "field1": "48.2", "field2": "21.7", "field3": "12.0", "field4": null }
//!   ]
//! }
//! ```
//!
//! Field values arrive as strings or null; anything that does not parse
//! as a number becomes `None`. Entries without a usable `entry_id` or
//! `created_at` are skipped with a warning rather than failing the fetch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::ProviderError;
use super::http::AsyncHttpClient;
use super::types::{FeedPage, FeedQuery, RemoteFeed};
use crate::measurement::{ChannelName, ChannelValues, Measurement};

/// Default channel feed base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.thingspeak.com/channels";

/// Default HTTP timeout for feed requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Time format the feed endpoint accepts for start/end bounds.
const RANGE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Configuration for the remote feed provider.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the channel feed API.
    pub base_url: String,

    /// Channel to read from.
    pub channel_id: u64,

    /// Read API key, if the channel is private.
    pub read_api_key: Option<String>,

    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            channel_id: 0,
            read_api_key: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl RemoteConfig {
    pub fn new(channel_id: u64) -> Self {
        Self {
            channel_id,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.read_api_key = Some(key.into());
        self
    }
}

/// Top-level feed document.
///
/// Only the fields we need are deserialized; everything else is ignored.
#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    channel: Option<ChannelInfo>,
    #[serde(default)]
    feeds: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    last_entry_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    entry_id: Option<u64>,
    created_at: Option<String>,
    field1: Option<String>,
    field2: Option<String>,
    field3: Option<String>,
    field4: Option<String>,
}

impl FeedEntry {
    fn raw_field(&self, channel: ChannelName) -> Option<&str> {
        match channel {
            ChannelName::Humidity => self.field1.as_deref(),
            ChannelName::Temperature => self.field2.as_deref(),
            ChannelName::Pm25 => self.field3.as_deref(),
            ChannelName::Pm10 => self.field4.as_deref(),
        }
    }
}

/// Remote feed provider over an injected HTTP client.
#[derive(Clone)]
pub struct FeedApiProvider<C> {
    http: C,
    config: RemoteConfig,
}

impl<C: AsyncHttpClient> FeedApiProvider<C> {
    pub fn new(http: C, config: RemoteConfig) -> Self {
        Self { http, config }
    }

    fn feeds_url(&self) -> String {
        format!(
            "{}/{}/feeds.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.channel_id
        )
    }

    fn build_query(&self, query: &FeedQuery) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(key) = &self.config.read_api_key {
            params.push(("api_key", key.clone()));
        }
        params.push(("results", query.results.to_string()));
        if let Some(since_id) = query.since_id {
            params.push(("since_id", since_id.to_string()));
        }
        if let Some(range) = &query.range {
            if let Some(start) = range.start {
                params.push(("start", start.format(RANGE_TIME_FORMAT).to_string()));
            }
            if let Some(end) = range.end {
                params.push(("end", end.format(RANGE_TIME_FORMAT).to_string()));
            }
        }
        params
    }
}

impl<C: AsyncHttpClient> RemoteFeed for FeedApiProvider<C> {
    async fn fetch_window(&self, query: FeedQuery) -> Result<FeedPage, ProviderError> {
        let url = self.feeds_url();
        let params = self.build_query(&query);

        let bytes = self.http.get(&url, &params).await?;

        let document: FeedDocument = serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let total = document.feeds.len();
        let mut records = Vec::with_capacity(total);
        for entry in &document.feeds {
            match parse_entry(entry) {
                Some(record) => records.push(record),
                None => {
                    tracing::warn!(
                        entry_id = ?entry.entry_id,
                        created_at = ?entry.created_at,
                        "skipping feed entry without usable id or timestamp"
                    );
                }
            }
        }

        let last_entry_id = document.channel.and_then(|c| c.last_entry_id);

        tracing::debug!(
            channel_id = self.config.channel_id,
            records = records.len(),
            skipped = total - records.len(),
            last_entry_id = ?last_entry_id,
            "fetched feed window"
        );

        Ok(FeedPage {
            records,
            last_entry_id,
        })
    }
}

/// Convert one feed entry into a [`Measurement`].
///
/// Returns `None` when the entry lacks an id or a parseable timestamp.
fn parse_entry(entry: &FeedEntry) -> Option<Measurement> {
    let id = entry.entry_id?;
    let timestamp = entry
        .created_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))?;

    let mut values = ChannelValues::default();
    for channel in ChannelName::ALL {
        values.set(channel, parse_value(entry.raw_field(channel)));
    }

    Some(Measurement::new(id, timestamp, values))
}

/// Parse a raw field value; anything non-numeric becomes `None`.
fn parse_value(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::super::http::tests::MockHttpClient;
    use super::*;

    fn provider_with(body: &str) -> FeedApiProvider<MockHttpClient> {
        let mock = MockHttpClient::always(Ok(body.as_bytes().to_vec()));
        FeedApiProvider::new(mock, RemoteConfig::new(2863798))
    }

    #[tokio::test]
    async fn parses_feed_document() {
        let body = r#"{
            "channel": { "id": 2863798, "last_entry_id": 1412 },
            "feeds": [
                { "created_at": "2025-04-12T10:00:00Z", "entry_id": 1410,
                  "field1": "48.2", "field2": "21.7", "field3": "12.0", "field4": "18.5" },
                { "created_at": "2025-04-12T10:05:00Z", "entry_id": 1411,
                  "field1": null, "field2": "garbled", "field3": " 13.1 ", "field4": "19.0" }
            ]
        }"#;

        let page = provider_with(body)
            .fetch_window(FeedQuery::new(100))
            .await
            .unwrap();

        assert_eq!(page.records.len(), 2);
        assert_eq!(page.last_entry_id, Some(1412));

        let first = &page.records[0];
        assert_eq!(first.id, 1410);
        assert_eq!(first.value(ChannelName::Humidity), Some(48.2));
        assert_eq!(first.value(ChannelName::Pm10), Some(18.5));

        // null and garbled values become None, trimmed values parse
        let second = &page.records[1];
        assert_eq!(second.value(ChannelName::Humidity), None);
        assert_eq!(second.value(ChannelName::Temperature), None);
        assert_eq!(second.value(ChannelName::Pm25), Some(13.1));
    }

    #[tokio::test]
    async fn skips_entries_without_id_or_timestamp() {
        let body = r#"{
            "channel": { "id": 1, "last_entry_id": 7 },
            "feeds": [
                { "created_at": "2025-04-12T10:00:00Z", "entry_id": 5 },
                { "created_at": "not a timestamp", "entry_id": 6 },
                { "created_at": "2025-04-12T10:10:00Z" }
            ]
        }"#;

        let page = provider_with(body)
            .fetch_window(FeedQuery::new(100))
            .await
            .unwrap();

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id, 5);
    }

    #[tokio::test]
    async fn empty_feed_is_not_an_error() {
        let body = r#"{ "channel": { "id": 1, "last_entry_id": 0 }, "feeds": [] }"#;

        let page = provider_with(body)
            .fetch_window(FeedQuery::new(100))
            .await
            .unwrap();

        assert!(page.records.is_empty());
    }

    #[tokio::test]
    async fn builds_query_parameters() {
        let mock = MockHttpClient::always(Ok(br#"{"feeds": []}"#.to_vec()));
        let config = RemoteConfig::new(42).with_api_key("SECRET");
        let provider = FeedApiProvider::new(mock, config);

        provider
            .fetch_window(FeedQuery::new(8000).since(1400))
            .await
            .unwrap();

        let queries = provider.http.queries.lock().unwrap();
        let params = &queries[0];
        assert!(params.contains(&("api_key".to_string(), "SECRET".to_string())));
        assert!(params.contains(&("results".to_string(), "8000".to_string())));
        assert!(params.contains(&("since_id".to_string(), "1400".to_string())));
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let mock = MockHttpClient::always(Err(ProviderError::Http("connection refused".into())));
        let provider = FeedApiProvider::new(mock, RemoteConfig::new(1));

        let result = provider.fetch_window(FeedQuery::new(10)).await;
        assert!(matches!(result, Err(ProviderError::Http(_))));
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_response() {
        let provider = provider_with("<html>backend error</html>");

        let result = provider.fetch_window(FeedQuery::new(10)).await;
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }
}
