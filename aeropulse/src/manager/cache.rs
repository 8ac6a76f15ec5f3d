//! TTL-bounded cache of fetched series, keyed by source kind.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::measurement::Series;
use crate::provider::SourceKind;

/// One cached fetch result.
#[derive(Debug, Clone)]
struct CacheEntry {
    series: Series,
    /// Monotonic fetch time, for TTL checks.
    fetched_at: Instant,
    /// Wall-clock fetch time, reported to callers.
    fetched_wall: DateTime<Utc>,
}

/// Cache of the most recent fetch result per source.
///
/// Constructed explicitly and injected into the Source Manager - there
/// is no ambient or global cache state. Entries expire lazily: a stale
/// entry is simply not served, and the next successful fetch overwrites
/// it.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: Mutex<HashMap<SourceKind, CacheEntry>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached series for `kind`, if present and younger than `ttl`.
    pub fn fresh(&self, kind: SourceKind, ttl: Duration) -> Option<(Series, DateTime<Utc>)> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(&kind)?;
        if entry.fetched_at.elapsed() >= ttl {
            return None;
        }
        Some((entry.series.clone(), entry.fetched_wall))
    }

    /// Store a fetch result for `kind`, replacing any previous entry.
    pub fn store(&self, kind: SourceKind, series: Series) {
        let entry = CacheEntry {
            series,
            fetched_at: Instant::now(),
            fetched_wall: Utc::now(),
        };
        self.entries.lock().unwrap().insert(kind, entry);
    }

    /// Drop the entry for `kind`. Returns true if one existed.
    pub fn invalidate(&self, kind: SourceKind) -> bool {
        self.entries.lock().unwrap().remove(&kind).is_some()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Wall-clock time of the last stored fetch for `kind`, expired or not.
    pub fn last_fetched_at(&self, kind: SourceKind) -> Option<DateTime<Utc>> {
        self.entries
            .lock()
            .unwrap()
            .get(&kind)
            .map(|e| e.fetched_wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_served_within_ttl() {
        let cache = SourceCache::new();
        cache.store(SourceKind::Remote, Series::new());

        assert!(cache
            .fresh(SourceKind::Remote, Duration::from_secs(60))
            .is_some());
        assert!(cache
            .fresh(SourceKind::Snapshot, Duration::from_secs(60))
            .is_none());
    }

    #[test]
    fn expired_entry_is_not_served() {
        let cache = SourceCache::new();
        cache.store(SourceKind::Remote, Series::new());

        std::thread::sleep(Duration::from_millis(15));
        assert!(cache
            .fresh(SourceKind::Remote, Duration::from_millis(10))
            .is_none());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = SourceCache::new();
        cache.store(SourceKind::Remote, Series::new());

        assert!(cache.invalidate(SourceKind::Remote));
        assert!(!cache.invalidate(SourceKind::Remote));
        assert!(cache
            .fresh(SourceKind::Remote, Duration::from_secs(60))
            .is_none());
    }
}
