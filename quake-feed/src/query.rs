use crate::error::FeedError;
use quake_utils::time::{format_epoch_ms, QUERY_FORMAT};
use serde::{Deserialize, Serialize};

/// FDSN event query endpoint of the USGS earthquake catalog.
pub const DEFAULT_FEED_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

/// A request for every event in `[start, end)` at or above `min_magnitude`.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct FeedQuery {
    /// Epoch milliseconds, inclusive
    pub start: i64,
    /// Epoch milliseconds, exclusive
    pub end: i64,
    pub min_magnitude: Option<f64>,
    pub limit: Option<u32>,
}

impl FeedQuery {
    pub fn new(start: i64, end: i64) -> Self {
        FeedQuery {
            start,
            end,
            min_magnitude: None,
            limit: None,
        }
    }

    pub fn with_min_magnitude(mut self, min_magnitude: Option<f64>) -> Self {
        self.min_magnitude = min_magnitude;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a timestamp falls inside the half-open window.
    pub fn contains(&self, epoch_ms: i64) -> bool {
        self.start <= epoch_ms && epoch_ms < self.end
    }

    /// Query-string pairs understood by the FDSN event service.
    pub fn to_params(&self) -> Result<Vec<(&'static str, String)>, FeedError> {
        let mut params = vec![
            ("format", "geojson".to_string()),
            ("orderby", "time".to_string()),
            ("starttime", format_epoch_ms(self.start, QUERY_FORMAT)?),
            ("endtime", format_epoch_ms(self.end, QUERY_FORMAT)?),
        ];
        if let Some(min_magnitude) = self.min_magnitude {
            params.push(("minmagnitude", min_magnitude.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        Ok(params)
    }
}
