use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Latency samples retained for the rolling average.
pub const MAX_LATENCY_SAMPLES: usize = 1000;

/// Point-in-time view of the aggregate counters.
#[derive(Debug, Clone, Serialize)]
pub struct ApiStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_processing_time_ms: f64,
}

#[derive(Debug, Default)]
struct StatsInner {
    total: u64,
    successful: u64,
    failed: u64,
    latencies_ms: VecDeque<f64>,
}

/// Process-wide request counters plus a bounded latency window.
///
/// Each completed request lands in exactly one of `record_success` or
/// `record_failure`, and both bump the total under the same lock, so a
/// snapshot never observes the total ahead of its category counters.
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    inner: Arc<RwLock<StatsInner>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a successfully processed request and retain its latency,
    /// dropping the oldest sample once the window is full.
    pub async fn record_success(&self, latency_ms: f64) {
        let mut stats = self.inner.write().await;
        stats.total += 1;
        stats.successful += 1;
        stats.latencies_ms.push_back(latency_ms);
        if stats.latencies_ms.len() > MAX_LATENCY_SAMPLES {
            stats.latencies_ms.pop_front();
        }
    }

    /// Count a failed request. Latency samples are untouched.
    pub async fn record_failure(&self) {
        let mut stats = self.inner.write().await;
        stats.total += 1;
        stats.failed += 1;
    }

    /// Consistent snapshot of the counters and rolling average.
    pub async fn snapshot(&self) -> ApiStats {
        let stats = self.inner.read().await;
        let average = if stats.latencies_ms.is_empty() {
            0.0
        } else {
            stats.latencies_ms.iter().sum::<f64>() / stats.latencies_ms.len() as f64
        };

        ApiStats {
            total_requests: stats.total,
            successful_requests: stats.successful,
            failed_requests: stats.failed,
            average_processing_time_ms: round2(average),
        }
    }
}

/// Round to two decimal places for presentation.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
