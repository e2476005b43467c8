//! Fixed-window request counting per client key.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Counter for a single client key.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    window_start: Instant,
}

/// Limits and rejection response of an active limiter.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_requests: u32,
    pub status: StatusCode,
    pub message: String,
}

impl RateLimitPolicy {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        let defaults = RateLimitConfig::default();
        Self {
            window,
            max_requests,
            status: StatusCode::TOO_MANY_REQUESTS,
            message: defaults.message,
        }
    }

    pub fn with_rejection(mut self, status: StatusCode, message: impl Into<String>) -> Self {
        self.status = status;
        self.message = message.into();
        self
    }
}

/// Per-client request limiter. Inert when constructed without a policy.
#[derive(Debug)]
pub struct RateLimiter {
    policy: Option<RateLimitPolicy>,
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy: Some(policy),
            buckets: DashMap::new(),
        }
    }

    /// A limiter that allows every request.
    pub fn disabled() -> Self {
        Self {
            policy: None,
            buckets: DashMap::new(),
        }
    }

    /// Build from configuration; disabled unless `enabled` is set.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        let status = StatusCode::from_u16(config.status_code).unwrap_or(StatusCode::TOO_MANY_REQUESTS);
        Self::new(
            RateLimitPolicy::new(Duration::from_secs(config.window_secs), config.max_requests)
                .with_rejection(status, config.message.clone()),
        )
    }

    pub fn policy(&self) -> Option<&RateLimitPolicy> {
        self.policy.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.policy.is_some()
    }

    /// Count a request from `key` and report whether it may proceed.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock.
    ///
    /// The shard guard is held for the whole check-and-increment.
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let Some(policy) = &self.policy else {
            return true;
        };

        let mut bucket = self.buckets.entry(key.to_owned()).or_insert(Bucket {
            count: 0,
            window_start: now,
        });

        // Arriving exactly on the boundary starts the new window.
        if now.saturating_duration_since(bucket.window_start) >= policy.window {
            bucket.count = 1;
            bucket.window_start = now;
            return true;
        }

        if bucket.count < policy.max_requests {
            bucket.count += 1;
            true
        } else {
            false
        }
    }

    /// Drop buckets whose window has elapsed. Returns how many were removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let Some(policy) = &self.policy else {
            return 0;
        };

        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.window_start) < policy.window);
        before.saturating_sub(self.buckets.len())
    }

    /// Number of tracked client keys.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Current count for `key`, if tracked.
    pub fn count(&self, key: &str) -> Option<u32> {
        self.buckets.get(key).map(|bucket| bucket.count)
    }
}
