use crate::service::TagOutcome;
use crate::stats::round2;
use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Body returned by `POST /api/generate-tags` on success.
#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub tags: Vec<String>,
    pub success: bool,
    pub message: String,
    pub processing_time_ms: f64,
    pub text_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_scores: Option<serde_json::Value>,
}

impl TagResponse {
    pub fn from_outcome(outcome: TagOutcome) -> Self {
        Self {
            message: format!("Successfully generated {} tags", outcome.tags.len()),
            success: true,
            processing_time_ms: outcome.processing_time_ms,
            text_length: outcome.text_length,
            confidence_scores: outcome.confidence_scores,
            tags: outcome.tags,
        }
    }
}

/// Body returned by `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: u64,
    pub nlp_processor: bool,
    pub uptime_seconds: f64,
}

impl HealthResponse {
    /// `healthy` when the tag generator initialized, `degraded` otherwise.
    pub fn report(generator_ready: bool, uptime: Duration) -> Self {
        Self {
            status: if generator_ready { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: unix_timestamp(),
            nlp_processor: generator_ready,
            uptime_seconds: round2(uptime.as_secs_f64()),
        }
    }
}

/// Body returned by `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
}

impl StatusResponse {
    pub fn online() -> Self {
        Self {
            status: "online".to_string(),
            timestamp: unix_timestamp(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
