//! Raw feed features → canonical [`Event`]s.
//!
//! A feature without an id or an origin time cannot be placed or de-duplicated
//! and is skipped. Every other field degrades to `None` when absent or unusable.

use crate::{
    event::{Coordinates, Event},
    raw::RawRecord,
};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotAnObject,
    MissingId,
    MissingTime,
}

/// A feature the normalizer declined, kept for observability.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SkippedRecord {
    pub id: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Normalized {
    Event(Event),
    Skipped(SkippedRecord),
}

/// Outcome of normalizing a whole fetch.
#[derive(Debug, Default, Clone)]
pub struct NormalizedBatch {
    pub events: Vec<Event>,
    pub skipped: Vec<SkippedRecord>,
}

impl NormalizedBatch {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn finite_f64(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn epoch_ms(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value
        .as_i64()
        .or_else(|| finite_f64(Some(value)).map(|v| v as i64))
}

fn coordinates(geometry: Option<&Value>) -> Option<Coordinates> {
    let triple = geometry?.get("coordinates")?.as_array()?;
    match triple.as_slice() {
        [lon, lat, depth, ..] => Some(Coordinates {
            longitude: finite_f64(Some(lon))?,
            latitude: finite_f64(Some(lat))?,
            depth: finite_f64(Some(depth))?,
        }),
        _ => None,
    }
}

fn property<'a>(properties: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    properties.and_then(|p| p.get(key))
}

/// Normalize a single raw feature.
pub fn normalize(record: &RawRecord) -> Normalized {
    let Some(feature) = record.0.as_object() else {
        return Normalized::Skipped(SkippedRecord {
            id: None,
            reason: SkipReason::NotAnObject,
        });
    };
    let properties = feature.get("properties");

    let Some(id) = non_empty_str(feature.get("id")) else {
        return Normalized::Skipped(SkippedRecord {
            id: None,
            reason: SkipReason::MissingId,
        });
    };
    let Some(occurred_at) = epoch_ms(property(properties, "time")) else {
        return Normalized::Skipped(SkippedRecord {
            id: Some(id),
            reason: SkipReason::MissingTime,
        });
    };

    Normalized::Event(Event {
        id,
        magnitude: finite_f64(property(properties, "mag")),
        place: non_empty_str(property(properties, "place")),
        occurred_at,
        coordinates: coordinates(feature.get("geometry")),
        detail_url: non_empty_str(property(properties, "url"))
            .or_else(|| non_empty_str(property(properties, "detail"))),
    })
}

/// Normalize a fetch, collecting skips instead of failing.
pub fn normalize_batch(records: &[RawRecord]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for record in records {
        match normalize(record) {
            Normalized::Event(event) => batch.events.push(event),
            Normalized::Skipped(skipped) => {
                debug!("Skipping feed record {:?}: {:?}", skipped.id, skipped.reason);
                batch.skipped.push(skipped);
            }
        }
    }
    if !batch.skipped.is_empty() {
        warn!(
            "Skipped {} of {} feed records",
            batch.skipped.len(),
            records.len()
        );
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::parse_feed_body;
    use serde_json::json;

    // Trimmed from https://earthquake.usgs.gov/fdsnws/event/1/query?format=geojson&starttime=2024-01-01&endtime=2024-01-02&minmagnitude=6
    const FEED_BODY: &str = r#"{
  "type": "FeatureCollection",
  "metadata": {"generated": 1704240000000, "count": 4},
  "features": [
    {"type": "Feature",
     "properties": {"mag": 7.5, "place": "Noto Peninsula, Japan", "time": 1704093010095,
                    "url": "https://earthquake.usgs.gov/earthquakes/eventpage/us6000m0xl",
                    "detail": "https://earthquake.usgs.gov/fdsnws/event/1/query?eventid=us6000m0xl&format=geojson"},
     "geometry": {"type": "Point", "coordinates": [137.2395, 37.4874, 10]},
     "id": "us6000m0xl"},
    {"type": "Feature",
     "properties": {"mag": null, "place": "", "time": 1704100000000},
     "geometry": null,
     "id": "us6000m0zz"},
    {"type": "Feature",
     "properties": {"mag": 6.2, "place": "Somewhere", "time": null},
     "geometry": {"type": "Point", "coordinates": [1.0, 2.0, 3.0]},
     "id": "us6000m100"},
    {"type": "Feature",
     "properties": {"mag": 6.0, "time": 1704110000000},
     "geometry": {"type": "Point", "coordinates": [1.0, 2.0, 3.0]}}
  ]
}"#;

    #[test]
    fn test_normalize_full_feature() {
        let records = parse_feed_body(FEED_BODY).unwrap();
        let Normalized::Event(event) = normalize(&records[0]) else {
            panic!("expected an event");
        };
        assert_eq!(event.id, "us6000m0xl");
        assert_eq!(event.magnitude, Some(7.5));
        assert_eq!(event.place.as_deref(), Some("Noto Peninsula, Japan"));
        assert_eq!(event.occurred_at, 1704093010095);
        let coordinates = event.coordinates.unwrap();
        assert!((coordinates.longitude - 137.2395).abs() < f64::EPSILON);
        assert!((coordinates.latitude - 37.4874).abs() < f64::EPSILON);
        assert!((coordinates.depth - 10.0).abs() < f64::EPSILON);
        assert_eq!(
            event.detail_url.as_deref(),
            Some("https://earthquake.usgs.gov/earthquakes/eventpage/us6000m0xl")
        );
    }

    #[test]
    fn test_normalize_optional_fields_become_unknown() {
        let records = parse_feed_body(FEED_BODY).unwrap();
        let Normalized::Event(event) = normalize(&records[1]) else {
            panic!("expected an event");
        };
        assert_eq!(event.magnitude, None);
        assert_eq!(event.place, None);
        assert_eq!(event.coordinates, None);
        assert_eq!(event.detail_url, None);
    }

    #[test]
    fn test_normalize_batch_counts_skips() {
        let records = parse_feed_body(FEED_BODY).unwrap();
        let batch = normalize_batch(&records);
        assert_eq!(batch.events.len(), 2);
        assert_eq!(batch.skipped_count(), 2);
        assert_eq!(
            batch.skipped[0],
            SkippedRecord {
                id: Some("us6000m100".to_string()),
                reason: SkipReason::MissingTime,
            }
        );
        assert_eq!(batch.skipped[1].reason, SkipReason::MissingId);
    }

    #[test]
    fn test_normalize_tolerates_bad_field_types() {
        let record = RawRecord(json!({
            "id": "nc1",
            "properties": {"mag": "big", "place": 12, "time": 1.7e12},
            "geometry": {"coordinates": [1.0, "north"]}
        }));
        let Normalized::Event(event) = normalize(&record) else {
            panic!("expected an event");
        };
        assert_eq!(event.magnitude, None);
        assert_eq!(event.place, None);
        assert_eq!(event.occurred_at, 1_700_000_000_000);
        assert_eq!(event.coordinates, None);
    }

    #[test]
    fn test_normalize_non_object() {
        assert_eq!(
            normalize(&RawRecord(json!("garbage"))),
            Normalized::Skipped(SkippedRecord {
                id: None,
                reason: SkipReason::NotAnObject,
            })
        );
    }

    #[test]
    fn test_detail_url_falls_back_to_detail_link() {
        let record = RawRecord(json!({
            "id": "ak1",
            "properties": {"time": 1, "detail": "https://example.test/ak1.geojson"}
        }));
        let Normalized::Event(event) = normalize(&record) else {
            panic!("expected an event");
        };
        assert_eq!(event.detail_url.as_deref(), Some("https://example.test/ak1.geojson"));
    }
}
