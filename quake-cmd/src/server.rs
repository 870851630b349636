//! HTTP surface: dashboard view, raw events and upstream health as JSON.

use crate::{
    error::ApiError,
    service::{DashboardService, Health, PipelineRun},
};
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::info;
use quake_data::ViewStatus;
use quake_feed::Event;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub type AppState = Arc<DashboardService>;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/dashboard", get(dashboard_handler))
        .route("/events", get(events_handler))
        .route("/health", get(health_handler))
        .route("/refresh", post(refresh_handler));

    Router::new()
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

fn view_response(run: &PipelineRun) -> Response {
    let status = match run.view.status {
        ViewStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ViewStatus::Complete | ViewStatus::Partial => StatusCode::OK,
    };
    (status, Json(&run.view)).into_response()
}

async fn dashboard_handler(State(service): State<AppState>) -> Response {
    let run = service.current().await;
    view_response(&run)
}

async fn refresh_handler(State(service): State<AppState>) -> Response {
    let run = service.refresh().await;
    view_response(&run)
}

async fn events_handler(State(service): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    let run = service.current().await;
    if run.view.status == ViewStatus::Unavailable {
        return Err(ApiError::ServiceUnavailable(
            "upstream feed unavailable".to_string(),
        ));
    }
    Ok(Json(run.events.clone()))
}

async fn health_handler(State(service): State<AppState>) -> Json<Health> {
    Json(service.health().await)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}
