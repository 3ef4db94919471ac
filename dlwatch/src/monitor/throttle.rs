//! Render throttling for high-frequency progress events.

use std::time::{Duration, Instant};

/// Default minimum gap between two DOWNLOADING renders.
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_millis(1000);

/// Gate that opens at most once per `interval`.
///
/// The first call always passes. Callers must serialize access; the monitor
/// keeps the throttle inside its session lock so check-and-update is atomic.
#[derive(Debug, Clone)]
pub struct RenderThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for RenderThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_INTERVAL)
    }
}

impl RenderThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` and records `now` if at least `interval` has elapsed
    /// since the last accepted render.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
