//! Rate limiting port.

use std::time::Duration;

/// Rate limiter trait - abstraction over rate limiting backends.
///
/// Checks are synchronous so request middleware can decide before
/// dispatching to the handler.
pub trait RateLimiter: Send + Sync {
    /// Record a request for `key` and report whether it may proceed.
    fn check(&self, key: &str) -> RateLimitResult;
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_after: Duration,
}
