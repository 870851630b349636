use crate::range::TimeRange;
use quake_feed::Event;
use quake_utils::{
    error::DateError,
    time::{to_datetime, to_epoch_ms},
};
use serde::{Deserialize, Serialize};

/// Count of events in the half-open window `[start, end)`.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct TimeBucket {
    pub label: String,
    pub start: i64,
    pub end: i64,
    pub count: u64,
}

/// Every bucket of `range`, in order, with zero counts.
///
/// Consecutive buckets share a boundary and the last one ends exactly at
/// `range.end`, so the list partitions the range.
pub fn generate_buckets(range: &TimeRange) -> Result<Vec<TimeBucket>, DateError> {
    let mut buckets = Vec::new();
    let mut cursor = to_datetime(range.start)?;
    let mut start = range.start;
    while start < range.end {
        let next = range.width.advance(&cursor, 1)?;
        let end = to_epoch_ms(&next).min(range.end);
        buckets.push(TimeBucket {
            label: cursor.format(range.width.label_format()).to_string(),
            start,
            end,
            count: 0,
        });
        cursor = next;
        start = end;
    }
    Ok(buckets)
}

/// Index of the bucket containing `epoch_ms`, if any.
pub fn bucket_index(buckets: &[TimeBucket], epoch_ms: i64) -> Option<usize> {
    let idx = buckets.partition_point(|bucket| bucket.end <= epoch_ms);
    buckets
        .get(idx)
        .filter(|bucket| bucket.start <= epoch_ms)
        .map(|_| idx)
}

/// Generate the buckets for `range` and count `events` into them.
///
/// Events outside the range are ignored. `events` must already be de-duplicated.
pub fn fill_buckets<'a, I>(range: &TimeRange, events: I) -> Result<Vec<TimeBucket>, DateError>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut buckets = generate_buckets(range)?;
    for event in events {
        if let Some(idx) = bucket_index(&buckets, event.occurred_at) {
            buckets[idx].count += 1;
        }
    }
    Ok(buckets)
}
