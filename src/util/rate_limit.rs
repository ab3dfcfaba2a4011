//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Selection rate limit per connection
pub const SELECTION_RATE_LIMIT: u32 = 20; // Max 20 picks per second

/// Per-connection rate limiter state
#[derive(Clone)]
pub struct ConnectionRateLimiter {
    selection_limiter: Arc<Limiter>,
}

impl ConnectionRateLimiter {
    pub fn new() -> Self {
        Self {
            selection_limiter: create_limiter(SELECTION_RATE_LIMIT),
        }
    }

    /// Check if a selection message is allowed (returns true if allowed)
    pub fn check_selection(&self) -> bool {
        self.selection_limiter.check().is_ok()
    }
}

impl Default for ConnectionRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_beyond_quota_is_refused() {
        let limiter = ConnectionRateLimiter::new();
        let allowed = (0..SELECTION_RATE_LIMIT * 2)
            .filter(|_| limiter.check_selection())
            .count();
        assert!(allowed >= 1);
        assert!(allowed <= SELECTION_RATE_LIMIT as usize);
    }
}
