//! Coalescing of requested ranges into the fewest upstream queries.

use quake_data::TimeRange;
use quake_feed::FeedQuery;

/// One upstream query and the ranges (by position in the request) it serves.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedQuery {
    pub query: FeedQuery,
    pub members: Vec<usize>,
}

fn magnitude_key(min_magnitude: Option<f64>) -> f64 {
    min_magnitude.unwrap_or(f64::NEG_INFINITY)
}

/// Merge ranges that share a magnitude floor and overlap or touch.
///
/// `windows` pairs each request position with its resolved range and floor.
/// Ranges with different floors are never merged: a query with the higher
/// floor cannot answer for the lower one.
pub fn plan_queries(windows: &[(usize, TimeRange, Option<f64>)]) -> Vec<PlannedQuery> {
    let mut ordered: Vec<&(usize, TimeRange, Option<f64>)> = windows.iter().collect();
    ordered.sort_by(|a, b| {
        magnitude_key(a.2)
            .total_cmp(&magnitude_key(b.2))
            .then(a.1.start.cmp(&b.1.start))
            .then(a.0.cmp(&b.0))
    });

    let mut planned: Vec<PlannedQuery> = Vec::new();
    for (position, range, min_magnitude) in ordered {
        match planned.last_mut() {
            Some(current)
                if current.query.min_magnitude == *min_magnitude
                    && range.start <= current.query.end =>
            {
                current.query.end = current.query.end.max(range.end);
                current.members.push(*position);
            }
            _ => planned.push(PlannedQuery {
                query: FeedQuery::new(range.start, range.end).with_min_magnitude(*min_magnitude),
                members: vec![*position],
            }),
        }
    }
    for query in &mut planned {
        query.members.sort_unstable();
    }
    planned
}
