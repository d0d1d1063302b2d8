// HTTP request handlers
use crate::application::monitor_service::DashboardError;
use crate::application::reading_sink::{DashboardOutcome, ReadingSink};
use crate::domain::reading::InboundMessage;
use crate::infrastructure::sse::sse_response;
use crate::presentation::app_state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct ProgressResponse {
    pub dashboard: String,
    pub value: f64,
    pub target: f64,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Ingest one reading. The body is decoded leniently: anything that is not a
/// usable message is dropped and reported, never rejected.
pub async fn post_reading(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<Vec<DashboardOutcome>>) {
    let message = InboundMessage::from_json_slice(&body);
    let outcomes = state.monitor.ingest(message).await;
    (StatusCode::ACCEPTED, Json(outcomes))
}

pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.monitor.dashboard_ids())
}

/// Latest notification for a dashboard, `null` before the first reading.
pub async fn get_dashboard(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    match state.monitor.latest(&id).await {
        Ok(latest) => Json(latest).into_response(),
        Err(e) => error_response(e),
    }
}

/// Live notifications as server-sent events
pub async fn stream_dashboard(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    match state.monitor.subscribe(&id) {
        Ok(rx) => sse_response(rx).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_progress(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let target = match state.monitor.quality_target(&id) {
        Ok(rx) => *rx.borrow(),
        Err(e) => return error_response(e),
    };
    let value = state
        .progress
        .get(&id)
        .map(|progress| *progress.borrow())
        .unwrap_or(target);

    Json(ProgressResponse {
        dashboard: id,
        value,
        target,
    })
    .into_response()
}

pub async fn get_hmi(State(state): State<Arc<AppState>>) -> Response {
    let sample = state.hmi.borrow().clone();
    Json(sample).into_response()
}

fn error_response(error: DashboardError) -> Response {
    let status = match error {
        DashboardError::UnknownDashboard(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string()).into_response()
}
