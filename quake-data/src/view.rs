use crate::{
    aggregate::TopEntry,
    range::{BucketWidth, RangeKind, TimeRange},
    series::SeriesPoint,
};
use quake_feed::Event;
use serde::{Deserialize, Serialize};

/// Overall health of a dashboard view.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    /// Every range was fetched.
    Complete,
    /// Some ranges are unavailable.
    Partial,
    /// No range could be fetched; the upstream is down, not quiet.
    Unavailable,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeriesStatus {
    Available { total: u64, points: Vec<SeriesPoint> },
    Unavailable { reason: String },
}

/// Chart data for one range plus the window it covers.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RangeSeries {
    pub range: RangeKind,
    pub bucket_width: BucketWidth,
    pub start: i64,
    pub end: i64,
    pub min_magnitude: Option<f64>,
    #[serde(flatten)]
    pub data: SeriesStatus,
}

impl RangeSeries {
    pub fn new(range: &TimeRange, min_magnitude: Option<f64>, data: SeriesStatus) -> Self {
        RangeSeries {
            range: range.kind,
            bucket_width: range.width,
            start: range.start,
            end: range.end,
            min_magnitude,
            data,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.data, SeriesStatus::Available { .. })
    }

    pub fn points(&self) -> Option<&[SeriesPoint]> {
        match &self.data {
            SeriesStatus::Available { points, .. } => Some(points.as_slice()),
            SeriesStatus::Unavailable { .. } => None,
        }
    }
}

/// Self-contained view model handed to the presentation layer.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub status: ViewStatus,
    pub series: Vec<RangeSeries>,
    pub top_events: Vec<TopEntry>,
    pub most_recent: Option<Event>,
    /// Epoch milliseconds at which the pipeline ran
    pub fetched_at: i64,
    pub skipped_records: usize,
}

impl DashboardView {
    /// Derive the overall status from the per-range outcomes.
    pub fn status_of(series: &[RangeSeries]) -> ViewStatus {
        let available = series.iter().filter(|s| s.is_available()).count();
        if available == series.len() {
            ViewStatus::Complete
        } else if available == 0 {
            ViewStatus::Unavailable
        } else {
            ViewStatus::Partial
        }
    }

    pub fn series_for(&self, kind: RangeKind) -> Option<&RangeSeries> {
        self.series.iter().find(|s| s.range == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_series(kind: RangeKind, data: SeriesStatus) -> RangeSeries {
        RangeSeries {
            range: kind,
            bucket_width: kind.width(),
            start: 0,
            end: 10,
            min_magnitude: None,
            data,
        }
    }

    fn available() -> SeriesStatus {
        SeriesStatus::Available {
            total: 0,
            points: Vec::new(),
        }
    }

    fn unavailable() -> SeriesStatus {
        SeriesStatus::Unavailable {
            reason: "transport failure: request timed out".to_string(),
        }
    }

    #[test]
    fn test_status_of() {
        let ok = range_series(RangeKind::Last30Days, available());
        let down = range_series(RangeKind::Last5Years, unavailable());
        assert_eq!(
            DashboardView::status_of(&[ok.clone(), ok.clone()]),
            ViewStatus::Complete
        );
        assert_eq!(
            DashboardView::status_of(&[ok, down.clone()]),
            ViewStatus::Partial
        );
        assert_eq!(DashboardView::status_of(&[down]), ViewStatus::Unavailable);
    }

    #[test]
    fn test_series_serialization_is_flat() {
        let json = serde_json::to_value(range_series(RangeKind::Last5Years, unavailable())).unwrap();
        assert_eq!(json["range"], "5y");
        assert_eq!(json["bucket_width"], "month");
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "transport failure: request timed out");
        assert!(json["min_magnitude"].is_null());

        let json = serde_json::to_value(range_series(RangeKind::Last30Days, available())).unwrap();
        assert_eq!(json["status"], "available");
        assert!(json["points"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_view_round_trips_through_json() {
        let view = DashboardView {
            status: ViewStatus::Partial,
            series: vec![
                range_series(RangeKind::Last30Days, available()),
                range_series(RangeKind::Last5Years, unavailable()),
            ],
            top_events: Vec::new(),
            most_recent: None,
            fetched_at: 1_700_000_000_000,
            skipped_records: 2,
        };
        let text = serde_json::to_string(&view).unwrap();
        let back: DashboardView = serde_json::from_str(&text).unwrap();
        assert_eq!(back, view);
        assert!(back.series_for(RangeKind::Last5Years).unwrap().points().is_none());
    }
}
