//! The Source Manager itself.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use super::cache::SourceCache;
use super::config::SourceManagerConfig;
use super::error::{LoadError, SourceFailure};
use crate::measurement::{DateRange, Series};
use crate::provider::{FeedQuery, RemoteFeed, SnapshotSource, SourceKind};

/// Parameters for one load call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadRequest {
    /// Source to try first.
    pub preferred: SourceKind,
    /// Optional time bounds on the returned series.
    pub range: Option<DateRange>,
    /// Serve a non-expired cache entry for the preferred source without
    /// network I/O. `false` always revalidates.
    pub use_cached: bool,
}

impl LoadRequest {
    pub fn new(preferred: SourceKind) -> Self {
        Self {
            preferred,
            range: None,
            use_cached: false,
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn cached(mut self) -> Self {
        self.use_cached = true;
        self
    }
}

/// Why a particular source ended up being used.
///
/// Callers surface this to the end user, so every fallback is
/// distinguishable from a preferred-source success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// The preferred source answered with data.
    Preferred,
    /// The preferred source answered but was empty; the other source
    /// was used instead.
    FallbackAfterEmpty,
    /// The preferred source failed outright; the other source was used
    /// instead.
    FallbackAfterError,
}

/// A successfully loaded series plus its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSeries {
    pub series: Series,
    /// Source that actually produced the data.
    pub source: SourceKind,
    pub selection: SelectionReason,
    /// When the data was fetched (cache hits report the original fetch
    /// time, not the serve time).
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
}

/// Outcome of one load call.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Another load is already in flight; nothing was fetched. Callers
    /// are expected to retry later rather than queue.
    Pending,
    Loaded(LoadedSeries),
}

impl LoadOutcome {
    pub fn loaded(&self) -> Option<&LoadedSeries> {
        match self {
            LoadOutcome::Loaded(loaded) => Some(loaded),
            LoadOutcome::Pending => None,
        }
    }
}

/// Resets the in-flight flag when a load finishes, including early
/// returns and cancelled futures.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns both providers and decides which one is authoritative.
pub struct SourceManager<R, S> {
    remote: R,
    snapshot: S,
    cache: SourceCache,
    config: SourceManagerConfig,
    in_flight: AtomicBool,
}

impl<R: RemoteFeed, S: SnapshotSource> SourceManager<R, S> {
    /// Create a manager over the two providers.
    ///
    /// The cache is injected rather than created internally so callers
    /// can pre-warm or share inspection of it.
    pub fn new(remote: R, snapshot: S, cache: SourceCache, config: SourceManagerConfig) -> Self {
        Self {
            remote,
            snapshot,
            cache,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Load a series, preferring `request.preferred` and failing over to
    /// the other source on error or emptiness.
    ///
    /// At most one load runs at a time: a call that observes another
    /// load in flight returns [`LoadOutcome::Pending`] immediately
    /// instead of queuing or duplicating network calls.
    pub async fn load(&self, request: LoadRequest) -> Result<LoadOutcome, LoadError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(preferred = %request.preferred, "load already in flight; shedding");
            return Ok(LoadOutcome::Pending);
        }
        let _guard = InFlightGuard(&self.in_flight);

        if request.use_cached {
            if let Some((series, fetched_at)) =
                self.cache.fresh(request.preferred, self.config.cache_ttl)
            {
                let series = match &request.range {
                    Some(range) => series.filter_range(range),
                    None => series,
                };
                tracing::debug!(
                    source = %request.preferred,
                    records = series.len(),
                    "serving cached series"
                );
                return Ok(LoadOutcome::Loaded(LoadedSeries {
                    series,
                    source: request.preferred,
                    selection: SelectionReason::Preferred,
                    fetched_at,
                    from_cache: true,
                }));
            }
        }

        match self.fetch(request.preferred, request.range).await {
            Ok(series) if !series.is_empty() => {
                Ok(self.complete(request.preferred, series, SelectionReason::Preferred))
            }
            Ok(_) => {
                tracing::warn!(
                    source = %request.preferred,
                    "preferred source returned no records; failing over"
                );
                self.fall_back(request, SelectionReason::FallbackAfterEmpty)
                    .await
            }
            Err(error) => {
                tracing::warn!(
                    source = %request.preferred,
                    error = %error,
                    "preferred source failed; failing over"
                );
                self.fall_back(request, SelectionReason::FallbackAfterError)
                    .await
            }
        }
    }

    async fn fall_back(
        &self,
        request: LoadRequest,
        selection: SelectionReason,
    ) -> Result<LoadOutcome, LoadError> {
        let source = request.preferred.other();

        match self.fetch(source, request.range).await {
            Ok(series) if !series.is_empty() => Ok(self.complete(source, series, selection)),
            Ok(_) => Err(LoadError::BothSourcesUnavailable {
                source,
                cause: SourceFailure::Empty,
            }),
            Err(error) => Err(LoadError::BothSourcesUnavailable {
                source,
                cause: SourceFailure::Fetch(error),
            }),
        }
    }

    async fn fetch(
        &self,
        kind: SourceKind,
        range: Option<DateRange>,
    ) -> Result<Series, crate::provider::ProviderError> {
        match kind {
            SourceKind::Remote => {
                let mut query = FeedQuery::new(self.config.result_limit);
                if let Some(range) = range {
                    query = query.range(range);
                }
                let page = self.remote.fetch_window(query).await?;
                Ok(Series::from_records(page.records))
            }
            SourceKind::Snapshot => {
                let records = self.snapshot.fetch_all().await?;
                let series = Series::from_records(records);
                Ok(match range {
                    Some(range) => series.filter_range(&range),
                    None => series,
                })
            }
        }
    }

    fn complete(
        &self,
        source: SourceKind,
        series: Series,
        selection: SelectionReason,
    ) -> LoadOutcome {
        self.cache.store(source, series.clone());
        tracing::info!(
            source = %source,
            selection = ?selection,
            records = series.len(),
            "load complete"
        );
        LoadOutcome::Loaded(LoadedSeries {
            series,
            source,
            selection,
            fetched_at: Utc::now(),
            from_cache: false,
        })
    }

    /// Drop the cache entry for one source (force the next load to
    /// revalidate).
    pub fn invalidate(&self, kind: SourceKind) -> bool {
        self.cache.invalidate(kind)
    }

    /// Drop all cache entries.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Wall-clock time of the last successful fetch for `kind`.
    pub fn last_fetched_at(&self, kind: SourceKind) -> Option<DateTime<Utc>> {
        self.cache.last_fetched_at(kind)
    }
}
