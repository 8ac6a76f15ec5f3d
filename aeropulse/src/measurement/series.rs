//! Ordered, duplicate-free measurement series.

use super::record::{DateRange, Measurement};

/// Result of merging an incremental batch into a [`Series`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Records appended to the series.
    pub appended: usize,
    /// Records dropped because their id was at or below the watermark,
    /// or duplicated another id within the same batch.
    pub rejected: usize,
}

/// An ordered sequence of measurements.
///
/// Records are kept oldest-first, sorted by source-assigned id (ids are
/// monotonic in arrival order, so id order is chronological order). The
/// series never contains two records with the same id; merges preserve
/// both invariants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    records: Vec<Measurement>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from records in arbitrary order.
    ///
    /// Records are sorted by id; for duplicate ids the first occurrence
    /// wins and the rest are dropped.
    pub fn from_records(mut records: Vec<Measurement>) -> Self {
        records.sort_by_key(|r| r.id);
        records.dedup_by_key(|r| r.id);
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Measurement] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.records.iter()
    }

    /// Oldest record in the series.
    pub fn first(&self) -> Option<&Measurement> {
        self.records.first()
    }

    /// Newest record in the series.
    pub fn latest(&self) -> Option<&Measurement> {
        self.records.last()
    }

    /// Highest record id incorporated so far; `None` for an empty series.
    pub fn watermark(&self) -> Option<u64> {
        self.records.last().map(|r| r.id)
    }

    /// Merge an incremental batch of records into the series.
    ///
    /// Only records with id strictly above the current watermark are
    /// appended; the rest are counted as rejected. The batch may arrive
    /// unordered and may contain duplicates - the merge is idempotent, so
    /// re-merging the same batch is a no-op.
    pub fn merge_newer(&mut self, records: Vec<Measurement>) -> MergeReport {
        let total = records.len();
        let watermark = self.watermark().unwrap_or(0);

        let mut fresh: Vec<Measurement> = if self.is_empty() {
            records
        } else {
            records.into_iter().filter(|r| r.id > watermark).collect()
        };
        fresh.sort_by_key(|r| r.id);
        fresh.dedup_by_key(|r| r.id);

        let appended = fresh.len();
        self.records.append(&mut fresh);

        MergeReport {
            appended,
            rejected: total - appended,
        }
    }

    /// A copy of the series restricted to records inside `range`.
    pub fn filter_range(&self, range: &DateRange) -> Series {
        Series {
            records: self
                .records
                .iter()
                .filter(|r| range.contains(r.timestamp))
                .cloned()
                .collect(),
        }
    }

    pub fn into_records(self) -> Vec<Measurement> {
        self.records
    }
}

impl IntoIterator for Series {
    type Item = Measurement;
    type IntoIter = std::vec::IntoIter<Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::ChannelValues;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 12, 10, minute, 0).unwrap()
    }

    fn record(id: u64) -> Measurement {
        Measurement::new(id, ts(id as u32), ChannelValues::default())
    }

    #[test]
    fn from_records_sorts_and_dedups() {
        let series = Series::from_records(vec![record(3), record(1), record(3), record(2)]);
        let ids: Vec<u64> = series.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(series.watermark(), Some(3));
    }

    #[test]
    fn merge_appends_newer_records_in_order() {
        let mut series = Series::from_records(vec![record(1), record(2)]);
        let report = series.merge_newer(vec![record(4), record(3)]);

        assert_eq!(report.appended, 2);
        assert_eq!(report.rejected, 0);
        let ids: Vec<u64> = series.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(series.watermark(), Some(4));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut series = Series::from_records(vec![record(1), record(2)]);
        let batch = vec![record(3), record(4)];

        let first = series.merge_newer(batch.clone());
        let after_first = series.clone();
        let second = series.merge_newer(batch);

        assert_eq!(first.appended, 2);
        assert_eq!(second.appended, 0);
        assert_eq!(second.rejected, 2);
        assert_eq!(series, after_first);
    }

    #[test]
    fn merge_rejects_stale_and_duplicate_ids() {
        let mut series = Series::from_records(vec![record(5)]);
        let report = series.merge_newer(vec![record(4), record(5), record(6), record(6)]);

        assert_eq!(report.appended, 1);
        assert_eq!(report.rejected, 3);
        assert_eq!(series.watermark(), Some(6));
    }

    #[test]
    fn merge_into_empty_series_accepts_everything() {
        let mut series = Series::new();
        let report = series.merge_newer(vec![record(2), record(1)]);

        assert_eq!(report.appended, 2);
        assert_eq!(series.watermark(), Some(2));
    }

    #[test]
    fn watermark_never_decreases_across_merges() {
        let mut series = Series::from_records(vec![record(4)]);
        series.merge_newer(vec![record(2), record(3)]);
        assert_eq!(series.watermark(), Some(4));

        series.merge_newer(vec![record(6)]);
        assert_eq!(series.watermark(), Some(6));
    }

    #[test]
    fn filter_range_keeps_inner_records() {
        let series = Series::from_records(vec![record(1), record(5), record(9)]);
        let range = DateRange::new(Some(ts(2)), Some(ts(8)));
        let filtered = series.filter_range(&range);

        let ids: Vec<u64> = filtered.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5]);
    }
}
