//! Rate limiting implementations.

mod memory;

pub use memory::{KeyedRateLimiter, RateLimitConfig};
