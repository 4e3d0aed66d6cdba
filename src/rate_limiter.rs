use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Trailing window in which admissions are counted.
pub const WINDOW_DURATION: Duration = Duration::from_secs(3600);

/// Maximum admitted requests per identity within the window.
pub const MAX_REQUESTS_PER_WINDOW: usize = 100;

/// Windows idle for this many window lengths are dropped by the sweeper.
const IDLE_EVICTION_WINDOWS: u32 = 2;

/// Admission policy applied uniformly to every identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterPolicy {
    pub max_requests: usize,
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Default for LimiterPolicy {
    fn default() -> Self {
        Self {
            max_requests: MAX_REQUESTS_PER_WINDOW,
            window: WINDOW_DURATION,
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Rejected; `retry_after` is the time until the oldest recorded
    /// request leaves the window and a slot frees up.
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Per-identity record of admitted-request timestamps, oldest first.
#[derive(Debug)]
struct ClientWindow {
    timestamps: VecDeque<Instant>,
    last_seen: Instant,
}

impl ClientWindow {
    fn new(now: Instant) -> Self {
        Self {
            timestamps: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Drop timestamps that have fallen out of the trailing window.
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Sliding-window rate limiter over identity-keyed windows.
///
/// The prune-check-append sequence for one identity runs under that
/// identity's map entry guard, so concurrent requests from the same
/// identity serialize while distinct identities proceed independently.
/// Rejected requests are never recorded.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    windows: DashMap<String, ClientWindow>,
    policy: LimiterPolicy,
}

impl SlidingWindowLimiter {
    pub fn new(policy: LimiterPolicy) -> Self {
        Self {
            windows: DashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &LimiterPolicy {
        &self.policy
    }

    /// Admission check for `identity` against the current time.
    pub fn admit(&self, identity: &str) -> Admission {
        self.admit_at(identity, Instant::now())
    }

    /// Admission check at an explicit instant.
    pub fn admit_at(&self, identity: &str, now: Instant) -> Admission {
        let mut entry = self
            .windows
            .entry(identity.to_string())
            .or_insert_with(|| ClientWindow::new(now));
        let window = entry.value_mut();
        window.prune(now, self.policy.window);
        window.last_seen = now;

        if window.timestamps.len() >= self.policy.max_requests {
            let retry_after = window
                .timestamps
                .front()
                .map(|&oldest| {
                    self.policy
                        .window
                        .saturating_sub(now.saturating_duration_since(oldest))
                })
                .unwrap_or_default();
            return Admission::Rejected { retry_after };
        }

        window.timestamps.push_back(now);
        Admission::Admitted
    }

    /// Number of identities currently holding a window.
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    /// Drop windows idle for at least `IDLE_EVICTION_WINDOWS` window
    /// lengths. Returns how many were evicted.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    pub fn evict_idle_at(&self, now: Instant) -> usize {
        let idle_ttl = self.policy.window * IDLE_EVICTION_WINDOWS;
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.saturating_duration_since(window.last_seen) < idle_ttl);
        before.saturating_sub(self.windows.len())
    }

    /// Start the periodic idle-window sweep. Runs until the process exits.
    pub fn spawn_idle_eviction(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            loop {
                tick.tick().await;
                let evicted = self.evict_idle();
                if evicted > 0 {
                    debug!(
                        evicted,
                        tracked = self.tracked_identities(),
                        "evicted idle client windows"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_limiter(max_requests: usize, window_secs: u64) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(LimiterPolicy {
            max_requests,
            window: Duration::from_secs(window_secs),
        })
    }

    #[test]
    fn test_admits_up_to_the_cap() {
        let limiter = make_limiter(100, 3600);
        let now = Instant::now();
        for _ in 0..100 {
            assert!(limiter.admit_at("a", now).is_admitted());
        }
        assert!(!limiter.admit_at("a", now).is_admitted());
    }

    #[test]
    fn test_rejection_does_not_consume_a_slot() {
        let limiter = make_limiter(1, 3600);
        let now = Instant::now();
        assert!(limiter.admit_at("a", now).is_admitted());
        assert!(!limiter.admit_at("a", now).is_admitted());
        assert!(!limiter.admit_at("a", now).is_admitted());

        // Once the only recorded request expires, exactly one new request
        // fits. Had the rejections been recorded, this would still be full.
        let later = now + Duration::from_secs(3600);
        assert!(limiter.admit_at("a", later).is_admitted());
        assert!(!limiter.admit_at("a", later).is_admitted());
    }

    #[test]
    fn test_window_slides_with_time() {
        let limiter = make_limiter(100, 3600);
        let start = Instant::now();
        for i in 0..100 {
            let t = start + Duration::from_secs(i);
            assert!(limiter.admit_at("b", t).is_admitted());
        }

        assert!(!limiter.admit_at("b", start + Duration::from_secs(1800)).is_admitted());
        // One hour after the first admissions, their slots have expired.
        assert!(limiter.admit_at("b", start + Duration::from_secs(3601)).is_admitted());
    }

    #[test]
    fn test_rejection_reports_time_until_a_slot_frees() {
        let limiter = make_limiter(2, 60);
        let start = Instant::now();
        assert!(limiter.admit_at("c", start).is_admitted());
        assert!(limiter
            .admit_at("c", start + Duration::from_secs(10))
            .is_admitted());

        match limiter.admit_at("c", start + Duration::from_secs(20)) {
            Admission::Rejected { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(40));
            }
            Admission::Admitted => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_identities_do_not_share_windows() {
        let limiter = make_limiter(1, 3600);
        let now = Instant::now();
        assert!(limiter.admit_at("a", now).is_admitted());
        assert!(!limiter.admit_at("a", now).is_admitted());
        assert!(limiter.admit_at("b", now).is_admitted());
        assert_eq!(limiter.tracked_identities(), 2);
    }

    #[test]
    fn test_admissions_never_exceed_the_cap_under_contention() {
        let limiter = Arc::new(make_limiter(50, 3600));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|_| limiter.admit_at("shared", now).is_admitted())
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }

    #[test]
    fn test_idle_windows_are_evicted() {
        let limiter = make_limiter(10, 60);
        let start = Instant::now();
        limiter.admit_at("idle", start);
        limiter.admit_at("busy", start);
        limiter.admit_at("busy", start + Duration::from_secs(100));

        let evicted = limiter.evict_idle_at(start + Duration::from_secs(121));
        assert_eq!(evicted, 1);
        assert_eq!(limiter.tracked_identities(), 1);
    }

    #[test]
    fn test_eviction_keeps_recently_seen_windows() {
        let limiter = make_limiter(10, 60);
        let start = Instant::now();
        limiter.admit_at("fresh", start);

        assert_eq!(limiter.evict_idle_at(start + Duration::from_secs(119)), 0);
        assert_eq!(limiter.tracked_identities(), 1);
    }

    #[test]
    fn test_default_policy_matches_published_limits() {
        let policy = LimiterPolicy::default();
        assert_eq!(policy.max_requests, 100);
        assert_eq!(policy.window, Duration::from_secs(3600));
    }
}
