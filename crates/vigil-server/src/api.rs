use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use vigil_types::{ResourceSnapshot, RunnerSnapshot, RuntimeSnapshot};

pub const MONITORING_PREFIX: &str = "/admin/monitoring";

const DEFAULT_ALERT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub limit: Option<usize>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let monitoring = Router::new()
        .route("/health", get(get_health))
        .route("/system", get(get_system))
        .route("/system/history", get(get_system_history))
        .route("/docker", get(get_docker))
        .route("/docker/history", get(get_docker_history))
        .route("/runners", get(get_runners))
        .route("/runners/history", get(get_runner_history))
        .route("/alerts", get(get_alerts))
        .route("/alerts/:id/acknowledge", post(acknowledge_alert))
        .route("/summary", get(get_summary));

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest(MONITORING_PREFIX, monitoring)
        .with_state(state)
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

async fn get_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.monitor.current_health().await)
}

async fn get_system(State(state): State<Arc<AppState>>) -> Response {
    match state.monitor.latest_resources() {
        Some(snapshot) => Json(snapshot.as_ref()).into_response(),
        None => not_found("no system metrics collected yet"),
    }
}

async fn get_system_history(State(state): State<Arc<AppState>>) -> Response {
    let history = state.monitor.resource_history();
    let items: Vec<&ResourceSnapshot> = history.iter().map(|s| s.as_ref()).collect();
    Json(items).into_response()
}

async fn get_docker(State(state): State<Arc<AppState>>) -> Response {
    match state.monitor.latest_runtime() {
        Some(snapshot) => Json(snapshot.as_ref()).into_response(),
        None => not_found("no docker status collected yet"),
    }
}

async fn get_docker_history(State(state): State<Arc<AppState>>) -> Response {
    let history = state.monitor.runtime_history();
    let items: Vec<&RuntimeSnapshot> = history.iter().map(|s| s.as_ref()).collect();
    Json(items).into_response()
}

async fn get_runners(State(state): State<Arc<AppState>>) -> Response {
    match state.monitor.latest_runners() {
        Some(snapshot) => Json(&snapshot.runners).into_response(),
        None => Json(Vec::<()>::new()).into_response(),
    }
}

async fn get_runner_history(State(state): State<Arc<AppState>>) -> Response {
    let history = state.monitor.runner_history();
    let items: Vec<&RunnerSnapshot> = history.iter().map(|s| s.as_ref()).collect();
    Json(items).into_response()
}

async fn get_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AlertsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_ALERT_LIMIT);
    Json(state.monitor.dispatcher().recent_alerts(limit).await)
}

async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
) -> impl IntoResponse {
    if state.monitor.dispatcher().acknowledge(&alert_id).await {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Alert acknowledged",
            })),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "success": false,
                "message": format!("Alert not found: {}", alert_id),
            })),
        )
    }
}

async fn get_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.monitor.summary().await)
}
