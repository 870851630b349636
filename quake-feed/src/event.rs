use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Hypocenter position as reported by the feed.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
    /// Depth in kilometers
    pub depth: f64,
}

/// A single seismic occurrence after normalization.
///
/// Optional upstream fields are always present as keys; unknown values
/// serialize as `null`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub magnitude: Option<f64>,
    pub place: Option<String>,
    /// Epoch milliseconds, UTC
    pub occurred_at: i64,
    pub coordinates: Option<Coordinates>,
    pub detail_url: Option<String>,
}

impl Event {
    /// Ordering used for "most recent": later first, then `id` ascending.
    pub fn cmp_recency(&self, other: &Self) -> Ordering {
        other
            .occurred_at
            .cmp(&self.occurred_at)
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Ordering used for magnitude rankings: larger first, then by recency.
    ///
    /// Events without a magnitude sort after every event that has one.
    pub fn cmp_magnitude(&self, other: &Self) -> Ordering {
        match (self.magnitude, other.magnitude) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| self.cmp_recency(other))
    }
}
