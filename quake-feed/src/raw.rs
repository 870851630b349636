use crate::error::FeedError;
use serde::Deserialize;
use serde_json::Value;

/// One untyped feature exactly as the feed returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord(pub Value);

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Value>,
}

/// Split a GeoJSON feature-collection body into raw records.
///
/// Only the envelope is validated here; individual features are judged by the
/// normalizer so one bad record never sinks the batch.
pub fn parse_feed_body(body: &str) -> Result<Vec<RawRecord>, FeedError> {
    let collection: FeatureCollection =
        serde_json::from_str(body).map_err(|e| FeedError::InvalidPayload(e.to_string()))?;
    Ok(collection.features.into_iter().map(RawRecord).collect())
}
