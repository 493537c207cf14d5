//! Per-caller rate limiting on top of governor's keyed GCRA limiter.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DashMapStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use quill_core::ports::{RateLimitResult, RateLimiter};

type KeyedGovernor = GovernorRateLimiter<
    String,
    DashMapStateStore<String>,
    DefaultClock,
    StateInformationMiddleware,
>;

/// Idle keys are pruned once the table grows past this size.
const PRUNE_THRESHOLD: usize = 10_000;

/// Requests allowed per caller per window.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Reads `RATE_LIMIT_MAX_REQUESTS` and `RATE_LIMIT_WINDOW_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests),
            window: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }
}

/// In-process limiter keyed by caller (author id or client address).
///
/// Limits are per-process, not shared across instances.
pub struct KeyedRateLimiter {
    limiter: KeyedGovernor,
    clock: DefaultClock,
    burst: u32,
    replenish: Duration,
}

impl KeyedRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let burst = NonZeroU32::new(config.max_requests).unwrap_or(NonZeroU32::MIN);
        let replenish = config.window / burst.get();
        let quota = Quota::with_period(replenish)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        let clock = DefaultClock::default();
        let limiter = GovernorRateLimiter::dashmap_with_clock(quota, clock.clone())
            .with_middleware::<StateInformationMiddleware>();

        Self {
            limiter,
            clock,
            burst: burst.get(),
            replenish,
        }
    }

    pub fn from_env() -> Self {
        Self::new(RateLimitConfig::from_env())
    }
}

impl RateLimiter for KeyedRateLimiter {
    fn check(&self, key: &str) -> RateLimitResult {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        match self.limiter.check_key(&key.to_string()) {
            Ok(snapshot) => {
                let remaining = snapshot.remaining_burst_capacity();
                RateLimitResult {
                    allowed: true,
                    remaining,
                    reset_after: self.replenish * self.burst.saturating_sub(remaining),
                }
            }
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                tracing::debug!(key, wait_ms = wait.as_millis() as u64, "Rate limit exceeded");
                RateLimitResult {
                    allowed: false,
                    remaining: 0,
                    reset_after: wait,
                }
            }
        }
    }
}
