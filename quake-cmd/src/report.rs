//! One-shot subcommands and service construction.

use crate::{
    config::DashboardConfig,
    server,
    service::{DashboardService, PipelineCache},
};
use anyhow::Context;
use log::info;
use quake_data::ViewStatus;
use quake_feed::{client::FeedClient, Event};
use serde::Serialize;
use std::{io::Write, net::SocketAddr, sync::Arc};

/// Build a service backed by the live feed client.
pub fn build_service(config: DashboardConfig) -> anyhow::Result<DashboardService> {
    let client = FeedClient::new(&config.feed_url, config.fetch_timeout, config.probe_timeout)
        .context("Failed to build feed HTTP client")?;
    let cache = Arc::new(PipelineCache::new(config.cache_ttl));
    Ok(DashboardService::new(Arc::new(client), cache, config))
}

pub async fn run_serve(config: DashboardConfig, bind: SocketAddr) -> anyhow::Result<()> {
    let service = Arc::new(build_service(config)?);
    server::run_server(service, bind).await
}

/// Print the dashboard view; exits non-zero when the feed is unavailable.
pub async fn run_dashboard(config: DashboardConfig, pretty: bool) -> anyhow::Result<()> {
    let service = build_service(config)?;
    let view = service.dashboard().await;
    let text = if pretty {
        serde_json::to_string_pretty(&view)?
    } else {
        serde_json::to_string(&view)?
    };
    println!("{text}");
    if view.status == ViewStatus::Unavailable {
        anyhow::bail!("upstream feed unavailable: no range could be fetched");
    }
    Ok(())
}

/// Flat CSV row; unknown values are written as empty cells.
#[derive(Serialize)]
struct EventRow<'a> {
    id: &'a str,
    magnitude: Option<f64>,
    place: Option<&'a str>,
    occurred_at: i64,
    longitude: Option<f64>,
    latitude: Option<f64>,
    depth: Option<f64>,
    detail_url: Option<&'a str>,
}

impl<'a> From<&'a Event> for EventRow<'a> {
    fn from(event: &'a Event) -> Self {
        EventRow {
            id: &event.id,
            magnitude: event.magnitude,
            place: event.place.as_deref(),
            occurred_at: event.occurred_at,
            longitude: event.coordinates.map(|c| c.longitude),
            latitude: event.coordinates.map(|c| c.latitude),
            depth: event.coordinates.map(|c| c.depth),
            detail_url: event.detail_url.as_deref(),
        }
    }
}

/// Write events as CSV with a header row.
pub fn write_events_csv<W: Write>(writer: W, events: &[Event]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for event in events {
        wtr.serialize(EventRow::from(event))?;
    }
    wtr.flush()?;
    Ok(())
}

pub async fn run_events(config: DashboardConfig, csv_path: Option<&str>) -> anyhow::Result<()> {
    let service = build_service(config)?;
    let run = service.current().await;
    if run.view.status == ViewStatus::Unavailable {
        anyhow::bail!("upstream feed unavailable: no range could be fetched");
    }
    match csv_path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {path}"))?;
            write_events_csv(file, &run.events)?;
            info!("Wrote {} events to {}", run.events.len(), path);
        }
        None => println!("{}", serde_json::to_string(&run.events)?),
    }
    Ok(())
}

pub async fn run_health(config: DashboardConfig) -> anyhow::Result<()> {
    let service = build_service(config)?;
    let health = service.health().await;
    println!("{}", serde_json::to_string(&health)?);
    if !health.reachable {
        anyhow::bail!("upstream feed unreachable");
    }
    Ok(())
}
