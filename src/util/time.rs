//! Time utilities for the frame loop

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Get current Unix timestamp in microseconds (for high precision)
pub fn unix_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_micros() as u64
}

/// Measures the real elapsed time between frames
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Instant,
    /// Upper bound on a single step, so a stalled loop does not teleport entities
    max_step: f64,
}

impl FrameTimer {
    pub fn new(max_step: f64) -> Self {
        Self {
            last: Instant::now(),
            max_step,
        }
    }

    /// Seconds since the previous call, clamped to `max_step`
    pub fn step(&mut self) -> f64 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        dt.min(self.max_step)
    }

    pub fn reset(&mut self) {
        self.last = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_clamped() {
        let mut timer = FrameTimer::new(0.0);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(timer.step(), 0.0);
    }

    #[test]
    fn clocks_are_consistent() {
        let millis = unix_millis();
        let micros = unix_micros();
        assert!(micros / 1000 >= millis);
    }
}
