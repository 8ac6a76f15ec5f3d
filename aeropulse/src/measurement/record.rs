//! Measurement records and time-range filters.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::channel::{ChannelName, ChannelValues};

/// One immutable record from a measurement source.
///
/// `id` is assigned by the source, unique within that source, and
/// non-decreasing in arrival order. It is the basis for the sync
/// engine's watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Source-assigned monotonic record identifier.
    pub id: u64,
    /// When the station took the reading.
    pub timestamp: DateTime<Utc>,
    /// Per-channel readings; missing readings are `None`.
    pub values: ChannelValues,
}

impl Measurement {
    pub fn new(id: u64, timestamp: DateTime<Utc>, values: ChannelValues) -> Self {
        Self {
            id,
            timestamp,
            values,
        }
    }

    /// Convenience lookup of a single channel's reading.
    pub fn value(&self, channel: ChannelName) -> Option<f64> {
        self.values.get(channel)
    }
}

/// Optional start/end bounds for filtered loads.
///
/// Both bounds are inclusive; an unset bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// A range covering the last `days` days up to now.
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        Self {
            start: Some(end - Duration::days(days)),
            end: Some(end),
        }
    }

    /// True if `instant` falls inside the range.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if instant < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if instant > end {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 12, hour, 0, 0).unwrap()
    }

    #[test]
    fn range_contains_inclusive_bounds() {
        let range = DateRange::new(Some(at(8)), Some(at(12)));
        assert!(range.contains(at(8)));
        assert!(range.contains(at(10)));
        assert!(range.contains(at(12)));
        assert!(!range.contains(at(7)));
        assert!(!range.contains(at(13)));
    }

    #[test]
    fn open_ended_range() {
        let from = DateRange::new(Some(at(8)), None);
        assert!(from.contains(at(23)));
        assert!(!from.contains(at(7)));

        let all = DateRange::default();
        assert!(all.contains(at(0)));
    }

    #[test]
    fn last_days_spans_requested_window() {
        let range = DateRange::last_days(7);
        let start = range.start.unwrap();
        let end = range.end.unwrap();
        assert_eq!(end - start, Duration::days(7));
    }
}
