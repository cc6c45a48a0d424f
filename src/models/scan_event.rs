use chrono::DateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScanEvent {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub qr_id: String,   // Reference to the scanned QR record; events may outlive it
    pub scanned_at: i64, // Set once at creation, never mutated
}

impl ScanEvent {
    pub fn new(qr_id: String, scanned_at: i64) -> Self {
        Self {
            id: None,
            qr_id,
            scanned_at,
        }
    }
}

/// Time-bucket size used to group scan events for reporting.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Label format for a bucket. Understood by both chrono's strftime and
    /// Mongo's `$dateToString`, so every backend produces identical labels.
    ///
    /// Weekly buckets use ISO 8601 week numbering (`2025-W07`), which is
    /// deterministic across locales.
    pub fn format_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "%Y-%m-%d %H:00",
            Granularity::Day => "%Y-%m-%d",
            Granularity::Week => "%G-W%V",
            Granularity::Month => "%Y-%m",
        }
    }

    /// Render the bucket label for a UTC timestamp in epoch milliseconds.
    pub fn label(&self, ts_ms: i64) -> String {
        let dt = DateTime::from_timestamp_millis(ts_ms).unwrap_or_default();
        dt.format(self.format_str()).to_string()
    }
}

/// One bucket of the `scans_by_period` breakdown.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PeriodCount {
    pub period: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn hour_label_truncates_minutes() {
        assert_eq!(
            Granularity::Hour.label(ts(2025, 3, 9, 14, 37)),
            "2025-03-09 14:00"
        );
    }

    #[test]
    fn day_label_is_calendar_date() {
        assert_eq!(Granularity::Day.label(ts(2025, 3, 9, 23, 59)), "2025-03-09");
    }

    #[test]
    fn week_label_uses_iso_week_numbering() {
        // 2024-12-30 is a Monday belonging to ISO week 1 of 2025
        assert_eq!(Granularity::Week.label(ts(2024, 12, 30, 8, 0)), "2025-W01");
        assert_eq!(Granularity::Week.label(ts(2025, 2, 12, 8, 0)), "2025-W07");
    }

    #[test]
    fn month_label_is_year_and_month() {
        assert_eq!(Granularity::Month.label(ts(2025, 11, 1, 0, 0)), "2025-11");
    }

    #[test]
    fn labels_in_one_bucket_are_identical() {
        let a = Granularity::Day.label(ts(2025, 6, 1, 0, 0));
        let b = Granularity::Day.label(ts(2025, 6, 1, 23, 59));
        assert_eq!(a, b);
    }

    #[test]
    fn default_granularity_is_day() {
        assert_eq!(Granularity::default(), Granularity::Day);
    }
}
