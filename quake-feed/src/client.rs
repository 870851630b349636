use crate::{
    error::FeedError,
    query::FeedQuery,
    raw::{parse_feed_body, RawRecord},
    source::EventSource,
};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use quake_utils::time::MILLIS_PER_HOUR;
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;

/// HTTP client for the FDSN event query service.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    base_url: String,
    probe_timeout: Duration,
}

fn transport_error(err: reqwest::Error) -> FeedError {
    if err.is_timeout() {
        FeedError::Transport(format!("request timed out: {err}"))
    } else if err.is_connect() {
        FeedError::Transport(format!("connection failed: {err}"))
    } else {
        FeedError::Transport(err.to_string())
    }
}

impl FeedClient {
    /// Build a client whose requests give up after `fetch_timeout`.
    pub fn new(
        base_url: &str,
        fetch_timeout: Duration,
        probe_timeout: Duration,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(transport_error)?;
        Ok(FeedClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            probe_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, query: &FeedQuery, timeout: Option<Duration>) -> Result<String, FeedError> {
        let params = query.to_params()?;
        let mut request = self.client.get(&self.base_url).query(&params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            warn!("Feed answered {} for {:?}", status, query);
            return Err(FeedError::Upstream {
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(transport_error)
    }
}

#[async_trait]
impl EventSource for FeedClient {
    async fn fetch(&self, query: &FeedQuery) -> Result<Vec<RawRecord>, FeedError> {
        let started = Instant::now();
        let body = self.get(query, None).await?;
        let records = parse_feed_body(&body)?;
        info!(
            "Fetched {} records from {} in {} ms",
            records.len(),
            self.base_url,
            started.elapsed().as_millis()
        );
        Ok(records)
    }

    async fn probe(&self) -> Result<(), FeedError> {
        let end = Utc::now().timestamp_millis();
        let query = FeedQuery::new(end - MILLIS_PER_HOUR, end).with_limit(1);
        self.get(&query, Some(self.probe_timeout)).await?;
        debug!("Probe of {} succeeded", self.base_url);
        Ok(())
    }
}
