use crate::error::{ApiError, ApiResult};
use crate::generator::TagGenerator;
use crate::rate_limiter::{Admission, LimiterPolicy, SlidingWindowLimiter};
use crate::stats::{round2, ApiStats, StatsCollector};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Longest accepted input text, in characters.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Cap on returned tags when the client does not send one.
pub const DEFAULT_MAX_TAGS: usize = 20;

/// Result of one successfully processed tagging request.
#[derive(Debug, Clone)]
pub struct TagOutcome {
    pub tags: Vec<String>,
    pub processing_time_ms: f64,
    pub text_length: usize,
    pub confidence_scores: Option<serde_json::Value>,
}

/// Coordinates a tagging request end to end: validation, admission,
/// generation and accounting.
///
/// Owns the limiter and the stats collector outright; callers reach both
/// only through this service.
pub struct TagService {
    limiter: Arc<SlidingWindowLimiter>,
    stats: StatsCollector,
    generator: Option<Arc<dyn TagGenerator>>,
    generation_timeout: Duration,
}

impl TagService {
    pub fn new(
        policy: LimiterPolicy,
        generator: Option<Arc<dyn TagGenerator>>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            limiter: Arc::new(SlidingWindowLimiter::new(policy)),
            stats: StatsCollector::new(),
            generator,
            generation_timeout,
        }
    }

    /// The admission component, shared so the server can run the idle sweep.
    pub fn limiter(&self) -> Arc<SlidingWindowLimiter> {
        self.limiter.clone()
    }

    pub fn policy(&self) -> &LimiterPolicy {
        self.limiter.policy()
    }

    /// Whether a tag-generation backend initialized at startup.
    pub fn generator_ready(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn stats(&self) -> ApiStats {
        self.stats.snapshot().await
    }

    /// Process one tagging request for `identity`.
    ///
    /// Validation runs before admission, so malformed input is counted as a
    /// failure without ever consulting the limiter. A rate-limited request
    /// touches neither the stats nor the identity's window. An admitted
    /// request that fails downstream keeps its window slot.
    pub async fn handle(
        &self,
        identity: &str,
        text: &str,
        max_tags: Option<usize>,
        include_confidence: bool,
    ) -> ApiResult<TagOutcome> {
        let text_length = text.chars().count();

        if text.trim().is_empty() {
            self.stats.record_failure().await;
            warn!(identity, "rejected request with empty text");
            return Err(ApiError::BadInput("Text cannot be empty".to_string()));
        }
        if text_length > MAX_TEXT_CHARS {
            self.stats.record_failure().await;
            warn!(identity, text_length, "rejected over-length text");
            return Err(ApiError::BadInput(format!(
                "Text exceeds the maximum length of {MAX_TEXT_CHARS} characters"
            )));
        }

        if let Admission::Rejected { retry_after } = self.limiter.admit(identity) {
            let retry_after_secs = retry_after.as_secs().max(1);
            let policy = self.limiter.policy();
            warn!(identity, retry_after_secs, "rate limit exceeded");
            return Err(ApiError::RateLimited {
                message: format!(
                    "Rate limit exceeded. Maximum {} requests per {} seconds per client. Retry after {} seconds.",
                    policy.max_requests,
                    policy.window.as_secs(),
                    retry_after_secs
                ),
                retry_after_secs,
            });
        }

        let Some(generator) = self.generator.as_ref() else {
            self.stats.record_failure().await;
            error!(identity, text_length, "tag generator not initialized");
            return Err(ApiError::Unavailable);
        };

        info!(identity, text_length, "processing tagging request");
        let started = Instant::now();
        let generated =
            tokio::time::timeout(self.generation_timeout, generator.generate_tags(text)).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut tags = match generated {
            Ok(Ok(tags)) => tags,
            Ok(Err(e)) => {
                self.stats.record_failure().await;
                error!(identity, text_length, elapsed_ms, error = %e, "tag generation failed");
                return Err(ApiError::Internal(e.to_string()));
            }
            Err(_) => {
                self.stats.record_failure().await;
                error!(identity, text_length, elapsed_ms, "tag generation timed out");
                return Err(ApiError::Internal(format!(
                    "Tag generation timed out after {} seconds",
                    self.generation_timeout.as_secs()
                )));
            }
        };

        if let Some(cap) = max_tags {
            if tags.len() > cap {
                tags.truncate(cap);
            }
        }

        let confidence_scores = include_confidence.then(|| {
            json!({ "note": "Confidence scores not yet implemented in current version" })
        });

        self.stats.record_success(elapsed_ms).await;
        info!(identity, tag_count = tags.len(), elapsed_ms, "generated tags");

        Ok(TagOutcome {
            tags,
            processing_time_ms: round2(elapsed_ms),
            text_length,
            confidence_scores,
        })
    }
}
