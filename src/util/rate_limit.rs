//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::time::Duration;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a limiter that admits one cell every `interval`, with no burst
pub fn create_interval_limiter(interval: Duration) -> Limiter {
    let quota = Quota::with_period(interval.max(Duration::from_millis(1)))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));
    RateLimiter::direct(quota)
}

/// Throttles outbound player-state snapshots to a fixed minimum interval
pub struct StateSendLimiter {
    limiter: Limiter,
}

impl StateSendLimiter {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            limiter: create_interval_limiter(Duration::from_millis(interval_ms)),
        }
    }

    /// Returns true if a snapshot may be sent now
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for StateSendLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSendLimiter").finish_non_exhaustive()
    }
}
