use crate::bucket::TimeBucket;
use serde::{Deserialize, Serialize};

/// One chart point: axis label, bucket start and count.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    /// Epoch milliseconds
    pub start: i64,
    pub count: u64,
}

/// Chronologically ordered `(label, count)` pairs for a chart renderer.
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct Series {
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.count).sum()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.count).collect()
    }
}

/// Turn buckets into a series, oldest first.
pub fn build(buckets: &[TimeBucket]) -> Series {
    let mut points: Vec<SeriesPoint> = buckets
        .iter()
        .map(|bucket| SeriesPoint {
            label: bucket.label.clone(),
            start: bucket.start,
            count: bucket.count,
        })
        .collect();
    // stable: equal starts keep their input order
    points.sort_by_key(|p| p.start);
    Series { points }
}
