//! Dashboard pipeline: plan → fetch → normalize → aggregate → series → view.

use crate::{
    cache::{Cacheable, ViewCache},
    config::{DashboardConfig, RangeSpec},
    plan::{plan_queries, PlannedQuery},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{info, warn};
use quake_data::{
    aggregate::{dedupe, most_recent, top_n},
    bucket::fill_buckets,
    series, BucketWidth, DashboardView, RangeKind, RangeSeries, SeriesStatus, TimeRange,
    ViewStatus,
};
use quake_feed::{
    normalizer::normalize_batch, Event, EventSource, FeedError, FeedQuery, RawRecord,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::{sleep, Instant};

/// Cache key: the requested ranges and their bucket widths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<(RangeKind, BucketWidth)>);

/// Result of one pipeline execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub view: DashboardView,
    /// De-duplicated normalized events from every query that succeeded.
    pub events: Vec<Event>,
}

impl Cacheable for PipelineRun {
    fn is_cacheable(&self) -> bool {
        self.view.status == ViewStatus::Complete
    }
}

pub type PipelineCache = ViewCache<CacheKey, Arc<PipelineRun>>;

/// Upstream reachability as reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub reachable: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct DashboardService {
    source: Arc<dyn EventSource>,
    cache: Arc<PipelineCache>,
    config: DashboardConfig,
}

impl DashboardService {
    pub fn new(
        source: Arc<dyn EventSource>,
        cache: Arc<PipelineCache>,
        config: DashboardConfig,
    ) -> Self {
        DashboardService {
            source,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey(
            self.config
                .ranges
                .iter()
                .map(|spec| (spec.kind, spec.kind.width()))
                .collect(),
        )
    }

    /// The current pipeline result, from cache when fresh.
    pub async fn current(&self) -> Arc<PipelineRun> {
        self.cache
            .get_or_refresh(&self.cache_key(), || async {
                Arc::new(self.run_pipeline(Utc::now()).await)
            })
            .await
    }

    /// Drop the cached result and run the pipeline again.
    pub async fn refresh(&self) -> Arc<PipelineRun> {
        self.cache.invalidate(&self.cache_key());
        self.current().await
    }

    pub async fn dashboard(&self) -> DashboardView {
        self.current().await.view.clone()
    }

    pub async fn events(&self) -> Vec<Event> {
        self.current().await.events.clone()
    }

    /// Probe the feed without running any aggregation.
    pub async fn health(&self) -> Health {
        let started = Instant::now();
        let result = self.source.probe().await;
        let latency_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(()) => Health {
                reachable: true,
                latency_ms,
                error: None,
            },
            Err(err) => {
                warn!("Feed probe failed after {} ms: {}", latency_ms, err);
                Health {
                    reachable: false,
                    latency_ms,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn fetch_with_retry(&self, query: &FeedQuery) -> Result<Vec<RawRecord>, FeedError> {
        let attempts = self.config.retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.source.fetch(query).await {
                Ok(records) => return Ok(records),
                Err(err) if attempt < attempts && err.is_retryable() => {
                    let wait = self.config.retry_backoff * attempt;
                    warn!(
                        "Attempt {}/{}: {}; retrying in {} ms",
                        attempt,
                        attempts,
                        err,
                        wait.as_millis()
                    );
                    sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!("Giving up on {:?} after {} attempt(s): {}", query, attempt, err);
                    return Err(err);
                }
            }
        }
    }

    /// Run the whole pipeline once, as of `now`. Never fails: ranges that
    /// cannot be served are marked unavailable in the view.
    pub async fn run_pipeline(&self, now: DateTime<Utc>) -> PipelineRun {
        let specs: &[RangeSpec] = &self.config.ranges;
        let mut slots: Vec<Option<RangeSeries>> = vec![None; specs.len()];
        let mut windows: Vec<(usize, TimeRange, Option<f64>)> = Vec::new();
        let mut resolved: Vec<Option<TimeRange>> = Vec::with_capacity(specs.len());

        for (position, spec) in specs.iter().enumerate() {
            match spec.kind.resolve(&now) {
                Ok(range) => {
                    windows.push((position, range, spec.min_magnitude));
                    resolved.push(Some(range));
                }
                Err(err) => {
                    warn!("Cannot resolve range {}: {}", spec.kind, err);
                    resolved.push(None);
                    slots[position] = Some(unresolved_series(spec, &now, err.to_string()));
                }
            }
        }

        let plan = plan_queries(&windows);
        info!(
            "Running pipeline for {} ranges with {} upstream queries",
            specs.len(),
            plan.len()
        );
        let results = join_all(
            plan.iter()
                .map(|planned| self.fetch_with_retry(&planned.query)),
        )
        .await;

        let mut fetched: Vec<Event> = Vec::new();
        let mut skipped_records = 0;
        for (planned, result) in plan.iter().zip(results) {
            let member_ranges: Vec<TimeRange> = planned
                .members
                .iter()
                .filter_map(|position| resolved[*position])
                .collect();
            let records = match result {
                Ok(records) => records,
                Err(err) => {
                    mark_unavailable(&mut slots, specs, &member_ranges, planned, &err.to_string());
                    continue;
                }
            };
            let batch = normalize_batch(&records);
            skipped_records += batch.skipped_count();
            let unique = dedupe(batch.events);
            for (position, range) in planned.members.iter().zip(&member_ranges) {
                let spec = &specs[*position];
                let data = match fill_buckets(range, &unique) {
                    Ok(buckets) => {
                        let built = series::build(&buckets);
                        SeriesStatus::Available {
                            total: built.total(),
                            points: built.points,
                        }
                    }
                    Err(err) => {
                        warn!("Range {} unavailable: {}", spec.kind, err);
                        SeriesStatus::Unavailable {
                            reason: err.to_string(),
                        }
                    }
                };
                slots[*position] = Some(RangeSeries::new(range, spec.min_magnitude, data));
            }
            fetched.extend(unique);
        }

        let events = dedupe(fetched);
        let top_events = top_n(&events, self.config.top_n);
        let most_recent = most_recent(&events);

        let series: Vec<RangeSeries> = slots.into_iter().flatten().collect();
        let status = DashboardView::status_of(&series);
        match status {
            ViewStatus::Complete => info!("Pipeline complete: {} events", events.len()),
            ViewStatus::Partial => warn!("Pipeline degraded: some ranges unavailable"),
            ViewStatus::Unavailable => warn!("Pipeline failed: upstream feed unavailable"),
        }

        PipelineRun {
            view: DashboardView {
                status,
                series,
                top_events,
                most_recent,
                fetched_at: now.timestamp_millis(),
                skipped_records,
            },
            events,
        }
    }
}

fn mark_unavailable(
    slots: &mut [Option<RangeSeries>],
    specs: &[RangeSpec],
    member_ranges: &[TimeRange],
    planned: &PlannedQuery,
    reason: &str,
) {
    for (position, range) in planned.members.iter().zip(member_ranges) {
        warn!("Range {} unavailable: {}", specs[*position].kind, reason);
        slots[*position] = Some(RangeSeries::new(
            range,
            specs[*position].min_magnitude,
            SeriesStatus::Unavailable {
                reason: reason.to_string(),
            },
        ));
    }
}

fn unresolved_series(spec: &RangeSpec, now: &DateTime<Utc>, reason: String) -> RangeSeries {
    let at = now.timestamp_millis();
    RangeSeries {
        range: spec.kind,
        bucket_width: spec.kind.width(),
        start: at,
        end: at,
        min_magnitude: spec.min_magnitude,
        data: SeriesStatus::Unavailable { reason },
    }
}
