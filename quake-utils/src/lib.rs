//! Shared time utilities for the quake dashboard crates.
//!
//! Every timestamp that leaves the pipeline is epoch milliseconds (UTC). These
//! helpers convert between that representation and `chrono`, and do the
//! calendar flooring that bucket boundaries are built on.

/// Epoch-millisecond and calendar helpers
pub mod time {
    use crate::error::DateError;
    use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Timelike, Utc};

    /// Label format for hourly buckets: "2024-03-01T13:00Z"
    pub const HOUR_LABEL_FORMAT: &str = "%Y-%m-%dT%H:00Z";

    /// Label format for daily buckets: "2024-03-01"
    pub const DAY_LABEL_FORMAT: &str = "%Y-%m-%d";

    /// Label format for monthly buckets: "2024-03"
    pub const MONTH_LABEL_FORMAT: &str = "%Y-%m";

    /// Timestamp format accepted by the upstream query interface (UTC, no offset).
    pub const QUERY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub const MILLIS_PER_HOUR: i64 = 3_600_000;
    pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

    /// Convert epoch milliseconds into a UTC datetime.
    pub fn to_datetime(epoch_ms: i64) -> Result<DateTime<Utc>, DateError> {
        DateTime::from_timestamp_millis(epoch_ms).ok_or(DateError::OutOfRange(epoch_ms))
    }

    /// Convert a UTC datetime into epoch milliseconds.
    pub fn to_epoch_ms(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    /// Truncate to the start of the hour.
    pub fn floor_hour(dt: &DateTime<Utc>) -> Result<DateTime<Utc>, DateError> {
        dt.date_naive()
            .and_hms_opt(dt.hour(), 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| DateError::Calendar(format!("cannot floor {dt} to the hour")))
    }

    /// Truncate to midnight UTC.
    pub fn floor_day(dt: &DateTime<Utc>) -> DateTime<Utc> {
        dt.date_naive().and_time(NaiveTime::MIN).and_utc()
    }

    /// Truncate to midnight UTC on the first of the month.
    pub fn floor_month(dt: &DateTime<Utc>) -> Result<DateTime<Utc>, DateError> {
        NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1)
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
            .ok_or_else(|| DateError::Calendar(format!("cannot floor {dt} to the month")))
    }

    /// Shift by a whole number of calendar months (negative goes backwards).
    pub fn add_months(dt: &DateTime<Utc>, months: i32) -> Result<DateTime<Utc>, DateError> {
        let step = Months::new(months.unsigned_abs());
        let shifted = if months >= 0 {
            dt.checked_add_months(step)
        } else {
            dt.checked_sub_months(step)
        };
        shifted.ok_or_else(|| DateError::Calendar(format!("cannot shift {dt} by {months} months")))
    }

    /// Render an epoch-millisecond timestamp with a `chrono` format string.
    pub fn format_epoch_ms(epoch_ms: i64, fmt: &str) -> Result<String, DateError> {
        Ok(to_datetime(epoch_ms)?.format(fmt).to_string())
    }

}

/// Error types
pub mod error {
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum DateError {
        #[error("timestamp {0} ms is outside the supported range")]
        OutOfRange(i64),

        #[error("calendar error: {0}")]
        Calendar(String),
    }
}
