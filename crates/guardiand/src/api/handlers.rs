//! Route handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use chrono::Utc;
use guardian_core::{PipelineSnapshot, VERSION};
use guardian_state::IncidentMetrics;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::dto::{AnalyzeRequest, AnalyzeResponse, HealthResponse};
use super::AppState;
use crate::error::ApiResult;
use crate::registration::{describe, AgentDescriptor};

/// Agent name, status and endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "agent": "CI/CD Guardian",
        "status": "active",
        "version": VERSION,
        "endpoints": {
            "analyze": "/analyze",
            "metrics": "/metrics",
            "health": "/health",
            "register": "/register"
        }
    }))
}

/// Analyse one pipeline snapshot
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let Json(request) = payload?;
    if let Some(logs) = &request.logs {
        debug!(pipeline_id = %request.pipeline_id, log_bytes = logs.len(), "received build logs");
    }
    let snapshot = PipelineSnapshot::try_from(request)?;
    let outcome = state.analyze(snapshot).await;
    Ok(Json(outcome.into()))
}

/// Aggregate incident metrics
pub async fn metrics(State(state): State<AppState>) -> Json<IncidentMetrics> {
    Json(state.metrics().await)
}

/// Service and storage health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let memory = state.memory_health().await;
    Json(HealthResponse {
        status: if memory.is_healthy() { "healthy" } else { "degraded" }.to_string(),
        version: VERSION.to_string(),
        timestamp: Utc::now(),
        memory_status: memory,
        config_loaded: state.policy_source.is_file(),
        config_source: state.policy_source.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Capability descriptor for the Supervisor
pub async fn register(State(state): State<AppState>, headers: HeaderMap) -> Json<AgentDescriptor> {
    let base = base_url(&headers);
    let descriptor = describe(&base, &state.policy, &state.notifier.channel_names());
    info!(base_url = %base, "registration descriptor served");
    Json(descriptor)
}

/// Scheme and authority the caller used to reach us.
fn base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}")
}
