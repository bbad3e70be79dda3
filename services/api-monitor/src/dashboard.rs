//! HTTP API and overview page for the monitor registry

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::monitor::MonitorStatus;
use crate::registry::{MonitorRegistry, StartOutcome};
use crate::ApiMonitorError;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub registry: Arc<MonitorRegistry>,
}

/// Identifies a target in request bodies and query strings
#[derive(Debug, Deserialize)]
pub struct TargetParams {
    pub url: String,
}

/// Build the dashboard axum router
pub fn build_router(registry: Arc<MonitorRegistry>) -> Router {
    let dashboard_state = DashboardState { registry };

    Router::new()
        .route("/", get(index_handler))
        .route(
            "/api/monitors",
            get(list_handler).post(start_handler).delete(remove_handler),
        )
        .route("/api/monitors/stats", get(stats_handler))
        .route("/api/monitors/stop", post(stop_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(dashboard_state)
}

impl IntoResponse for ApiMonitorError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiMonitorError::Config(_) => StatusCode::BAD_REQUEST,
            ApiMonitorError::NotMonitoring(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let monitors = dashboard.registry.list().await;

    let mut monitor_rows = String::new();
    for info in &monitors {
        let snapshot = match dashboard.registry.stats(&info.target).await {
            Ok(snapshot) => snapshot,
            // Removed between list and lookup
            Err(_) => continue,
        };
        let (color, bg) = match info.status {
            MonitorStatus::Active => ("#155724", "#d4edda"),
            MonitorStatus::Stopped => ("#383d41", "#e2e3e5"),
            MonitorStatus::Created => ("#856404", "#fff3cd"),
        };
        let last_check = info
            .last_check
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "Never".to_string());
        monitor_rows.push_str(&format!(
            r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">
                        <span style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: {}; background-color: {};">{}</span>
                    </td>
                    <td style="padding: 0.5rem;">{:.3}s</td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                </tr>"#,
            escape_html(&info.target),
            color,
            bg,
            info.status,
            snapshot.average_response_time,
            snapshot.error_count,
            last_check
        ));
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>API Monitor</title>
    <meta http-equiv="refresh" content="30">
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>API Monitor</h1>
    <section>
        <h2>Targets</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Target</th>
                    <th style="padding: 0.5rem; text-align: left;">Status</th>
                    <th style="padding: 0.5rem; text-align: left;">Avg Response</th>
                    <th style="padding: 0.5rem; text-align: left;">Errors</th>
                    <th style="padding: 0.5rem; text-align: left;">Last Check</th>
                </tr>
            </thead>
            <tbody id="monitor-body">{monitor_rows}</tbody>
        </table>
    </section>
</body>
</html>"#,
        monitor_rows = monitor_rows,
    );

    Html(html)
}

async fn list_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.registry.list().await)
}

async fn start_handler(
    State(dashboard): State<DashboardState>,
    Json(params): Json<TargetParams>,
) -> Result<impl IntoResponse, ApiMonitorError> {
    let outcome = dashboard.registry.start(&params.url).await?;
    let (status, message) = match outcome {
        StartOutcome::Started => (StatusCode::CREATED, "started"),
        StartOutcome::AlreadyActive => (StatusCode::OK, "already_active"),
    };
    Ok((
        status,
        Json(serde_json::json!({ "url": params.url, "result": message })),
    ))
}

async fn stats_handler(
    State(dashboard): State<DashboardState>,
    Query(params): Query<TargetParams>,
) -> Result<impl IntoResponse, ApiMonitorError> {
    Ok(Json(dashboard.registry.stats(&params.url).await?))
}

async fn stop_handler(
    State(dashboard): State<DashboardState>,
    Json(params): Json<TargetParams>,
) -> Result<impl IntoResponse, ApiMonitorError> {
    Ok(Json(dashboard.registry.stop(&params.url).await?))
}

async fn remove_handler(
    State(dashboard): State<DashboardState>,
    Query(params): Query<TargetParams>,
) -> Result<impl IntoResponse, ApiMonitorError> {
    Ok(Json(dashboard.registry.remove(&params.url).await?))
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
