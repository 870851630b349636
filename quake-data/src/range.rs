use chrono::{DateTime, TimeDelta, Utc};
use quake_utils::{
    error::DateError,
    time::{
        add_months, floor_day, floor_hour, floor_month, to_epoch_ms, DAY_LABEL_FORMAT,
        HOUR_LABEL_FORMAT, MONTH_LABEL_FORMAT,
    },
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Width of one chart bucket.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketWidth {
    Hour,
    Day,
    Month,
}

impl BucketWidth {
    /// Start of the bucket containing `dt`.
    pub fn floor(&self, dt: &DateTime<Utc>) -> Result<DateTime<Utc>, DateError> {
        match self {
            BucketWidth::Hour => floor_hour(dt),
            BucketWidth::Day => Ok(floor_day(dt)),
            BucketWidth::Month => floor_month(dt),
        }
    }

    /// Move `steps` buckets forward (or backward when negative).
    pub fn advance(&self, dt: &DateTime<Utc>, steps: i32) -> Result<DateTime<Utc>, DateError> {
        let delta = match self {
            BucketWidth::Hour => TimeDelta::try_hours(steps.into()),
            BucketWidth::Day => TimeDelta::try_days(steps.into()),
            BucketWidth::Month => return add_months(dt, steps),
        };
        delta
            .and_then(|delta| dt.checked_add_signed(delta))
            .ok_or_else(|| DateError::Calendar(format!("cannot move {dt} by {steps} {self:?}")))
    }

    pub fn label_format(&self) -> &'static str {
        match self {
            BucketWidth::Hour => HOUR_LABEL_FORMAT,
            BucketWidth::Day => DAY_LABEL_FORMAT,
            BucketWidth::Month => MONTH_LABEL_FORMAT,
        }
    }
}

/// The fixed set of windows the dashboard can chart.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RangeKind {
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "5y")]
    Last5Years,
}

impl RangeKind {
    pub const ALL: [RangeKind; 4] = [
        RangeKind::Last24Hours,
        RangeKind::Last7Days,
        RangeKind::Last30Days,
        RangeKind::Last5Years,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            RangeKind::Last24Hours => "24h",
            RangeKind::Last7Days => "7d",
            RangeKind::Last30Days => "30d",
            RangeKind::Last5Years => "5y",
        }
    }

    pub fn width(&self) -> BucketWidth {
        match self {
            RangeKind::Last24Hours => BucketWidth::Hour,
            RangeKind::Last7Days | RangeKind::Last30Days => BucketWidth::Day,
            RangeKind::Last5Years => BucketWidth::Month,
        }
    }

    pub fn bucket_count(&self) -> i32 {
        match self {
            RangeKind::Last24Hours => 24,
            RangeKind::Last7Days => 7,
            RangeKind::Last30Days => 30,
            RangeKind::Last5Years => 60,
        }
    }

    /// Magnitude floor that keeps the window inside the feed's result cap.
    pub fn default_min_magnitude(&self) -> Option<f64> {
        match self {
            RangeKind::Last5Years => Some(5.0),
            _ => Some(2.5),
        }
    }

    /// Concrete window ending with the bucket that contains `now`.
    pub fn resolve(&self, now: &DateTime<Utc>) -> Result<TimeRange, DateError> {
        let width = self.width();
        let end = width.advance(&width.floor(now)?, 1)?;
        let start = width.advance(&end, -self.bucket_count())?;
        Ok(TimeRange {
            kind: *self,
            start: to_epoch_ms(&start),
            end: to_epoch_ms(&end),
            width,
        })
    }
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RangeKind::ALL
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown range '{s}' (expected one of 24h, 7d, 30d, 5y)"))
    }
}

/// A resolved half-open window `[start, end)` in epoch milliseconds.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub kind: RangeKind,
    pub start: i64,
    pub end: i64,
    pub width: BucketWidth,
}

impl TimeRange {
    pub fn contains(&self, epoch_ms: i64) -> bool {
        self.start <= epoch_ms && epoch_ms < self.end
    }
}
