use crate::{bucket::fill_buckets, bucket::TimeBucket, range::TimeRange};
use log::debug;
use quake_feed::Event;
use quake_utils::error::DateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ranked entry of the magnitude leaderboard.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TopEntry {
    /// 1-based
    pub rank: usize,
    pub event: Event,
}

/// Buckets generated for one requested range.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RangeBuckets {
    pub range: TimeRange,
    pub buckets: Vec<TimeBucket>,
}

impl RangeBuckets {
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|bucket| bucket.count).sum()
    }
}

/// Everything derived from one de-duplicated event set.
#[derive(Debug, PartialEq, Clone)]
pub struct Aggregation {
    /// De-duplicated events, most recent first.
    pub events: Vec<Event>,
    pub buckets_by_range: Vec<RangeBuckets>,
    pub top_events: Vec<TopEntry>,
    pub most_recent: Option<Event>,
}

/// Collapse events sharing an id; the last one seen wins.
///
/// The result is ordered most recent first (ties by id) regardless of input order.
pub fn dedupe<I>(events: I) -> Vec<Event>
where
    I: IntoIterator<Item = Event>,
{
    let mut by_id: HashMap<String, Event> = HashMap::new();
    for event in events {
        by_id.insert(event.id.clone(), event);
    }
    let mut unique: Vec<Event> = by_id.into_values().collect();
    unique.sort_by(Event::cmp_recency);
    unique
}

/// The `n` largest events by magnitude; events without a magnitude never rank.
///
/// Ties go to the more recent event, then to the smaller id. Never padded.
pub fn top_n(events: &[Event], n: usize) -> Vec<TopEntry> {
    let mut ranked: Vec<&Event> = events.iter().filter(|e| e.magnitude.is_some()).collect();
    ranked.sort_by(|a, b| a.cmp_magnitude(b));
    ranked
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, event)| TopEntry {
            rank: idx + 1,
            event: event.clone(),
        })
        .collect()
}

/// Latest event by origin time, ties broken by the smaller id.
pub fn most_recent(events: &[Event]) -> Option<Event> {
    events.iter().min_by(|a, b| a.cmp_recency(b)).cloned()
}

/// De-duplicate `events`, bucket them for every range and rank them.
pub fn aggregate<I>(events: I, ranges: &[TimeRange], top: usize) -> Result<Aggregation, DateError>
where
    I: IntoIterator<Item = Event>,
{
    let events = dedupe(events);
    let buckets_by_range = ranges
        .iter()
        .map(|range| {
            Ok(RangeBuckets {
                range: *range,
                buckets: fill_buckets(range, &events)?,
            })
        })
        .collect::<Result<Vec<_>, DateError>>()?;
    let top_events = top_n(&events, top);
    let most_recent = most_recent(&events);
    debug!(
        "Aggregated {} events into {} ranges",
        events.len(),
        buckets_by_range.len()
    );
    Ok(Aggregation {
        events,
        buckets_by_range,
        top_events,
        most_recent,
    })
}
