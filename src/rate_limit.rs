//! # Rate Limiting
//!
//! Sliding-window request counting keyed by client identifier. The limiter
//! runs before authentication so unauthenticated flooding is also bounded.
//!
//! The store is trait-bound: single-instance deployments use the in-memory
//! map below; a multi-instance deployment would substitute a shared external
//! counter behind the same interface. The in-memory store is accurate only
//! per process.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RateLimitConfig;

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Configured maximum requests per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// Seconds until a retry can succeed; set only when denied
    pub retry_after_seconds: Option<u64>,
    /// Instant at which the oldest counted request leaves the window
    pub reset_at: DateTime<Utc>,
}

/// Counter store consulted once per inbound request.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record a request from `identifier` at `now` and decide whether it may
    /// proceed. Append-then-evaluate is atomic per identifier.
    async fn check(&self, identifier: &str, now: DateTime<Utc>) -> RateDecision;

    /// Drop identifiers with no timestamps left in the window.
    async fn sweep(&self, now: DateTime<Utc>);
}

/// Process-local sliding-window store over a mutex-guarded map.
pub struct InMemoryRateLimitStore {
    window: Duration,
    max_requests: u32,
    windows: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl InMemoryRateLimitStore {
    /// Create a store from the configured window size and request cap.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::seconds(config.window_seconds as i64),
            max_requests: config.max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Number of identifiers currently tracked (test observability).
    pub fn tracked_identifiers(&self) -> usize {
        self.windows.lock().expect("rate limit map poisoned").len()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn check(&self, identifier: &str, now: DateTime<Utc>) -> RateDecision {
        let cutoff = now - self.window;
        let mut windows = self.windows.lock().expect("rate limit map poisoned");
        let timestamps = windows.entry(identifier.to_string()).or_default();

        while let Some(oldest) = timestamps.front() {
            if *oldest < cutoff {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        timestamps.push_back(now);
        let count = timestamps.len() as u32;
        // The front entry is the oldest retained timestamp; the window resets
        // when it ages out.
        let oldest = *timestamps.front().expect("window just received a push");
        let reset_at = oldest + self.window;

        if count > self.max_requests {
            // Rounded up: a caller retrying after this many whole seconds is
            // guaranteed to land past the oldest retained timestamp.
            let millis = (reset_at - now).num_milliseconds().max(0);
            let retry_after = (millis as u64).div_ceil(1000).max(1);
            debug!(identifier, count, "Rate limit exceeded");
            RateDecision {
                allowed: false,
                limit: self.max_requests,
                remaining: 0,
                retry_after_seconds: Some(retry_after),
                reset_at,
            }
        } else {
            RateDecision {
                allowed: true,
                limit: self.max_requests,
                remaining: self.max_requests - count,
                retry_after_seconds: None,
                reset_at,
            }
        }
    }

    async fn sweep(&self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        let mut windows = self.windows.lock().expect("rate limit map poisoned");
        let before = windows.len();
        windows.retain(|_, timestamps| {
            while let Some(oldest) = timestamps.front() {
                if *oldest < cutoff {
                    timestamps.pop_front();
                } else {
                    break;
                }
            }
            !timestamps.is_empty()
        });
        let evicted = before - windows.len();
        if evicted > 0 {
            debug!(evicted, remaining = windows.len(), "Swept idle rate windows");
        }
    }
}

/// Run the eviction sweep on an interval until the shutdown token fires.
pub async fn run_sweeper(
    store: std::sync::Arc<dyn RateLimitStore>,
    interval_seconds: u64,
    shutdown: CancellationToken,
) {
    info!(interval_seconds, "Starting rate-limit sweeper");
    let interval = StdDuration::from_secs(interval_seconds);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Rate-limit sweeper shutdown requested");
                break;
            }
            _ = sleep(interval) => {
                store.sweep(Utc::now()).await;
            }
        }
    }
}
