use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::ClientIp;
use crate::response::{HealthResponse, StatusResponse, TagResponse};
use crate::service::{TagService, DEFAULT_MAX_TAGS};
use crate::stats::ApiStats;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TagService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: TagService) -> Self {
        Self {
            service: Arc::new(service),
            started_at: Instant::now(),
        }
    }
}

fn default_max_tags() -> Option<u16> {
    Some(DEFAULT_MAX_TAGS as u16)
}

/// Body of `POST /api/generate-tags`.
#[derive(Debug, Deserialize, Validate)]
pub struct TagRequest {
    /// Text to analyze.
    #[validate(length(min = 1, max = 10000, message = "text must be between 1 and 10000 characters"))]
    pub text: String,
    /// Include placeholder confidence scores in the response.
    #[serde(default)]
    pub include_confidence: Option<bool>,
    /// Cap on the number of returned tags.
    #[serde(default = "default_max_tags")]
    #[validate(range(min = 1, max = 50, message = "max_tags must be between 1 and 50"))]
    pub max_tags: Option<u16>,
}

/// Generate tags for the submitted text.
pub async fn generate_tags(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    Json(request): Json<TagRequest>,
) -> ApiResult<Json<TagResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadInput(e.to_string()))?;

    let outcome = state
        .service
        .handle(
            &client_ip,
            &request.text,
            request.max_tags.map(usize::from),
            request.include_confidence.unwrap_or(false),
        )
        .await?;

    Ok(Json(TagResponse::from_outcome(outcome)))
}

/// Detailed health report.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::report(
        state.service.generator_ready(),
        state.started_at.elapsed(),
    ))
}

/// Aggregate usage statistics.
pub async fn get_stats(State(state): State<AppState>) -> Json<ApiStats> {
    Json(state.service.stats().await)
}

/// Minimal liveness probe.
pub async fn api_status() -> Json<StatusResponse> {
    Json(StatusResponse::online())
}

/// Service metadata and endpoint directory.
pub async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to the tagx API",
        "description": "NLP-powered tag generation with per-client rate limiting",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "generate_tags": "POST /api/generate-tags",
            "health": "GET /health",
            "stats": "GET /stats",
            "status": "GET /api/status"
        },
        "rate_limit": state.service.policy()
    }))
}
