//! Transfer rate estimation.
//!
//! [`SpeedInfo`] samples a monotonically non-decreasing byte counter and
//! derives two rates from it:
//!
//! - **current**: bytes per second between the two most recent samples
//! - **average**: bytes per second over the whole session
//!
//! It knows nothing about downloads; the monitor keeps one instance per file.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use dlwatch::speed::SpeedInfo;
//!
//! let t0 = Instant::now();
//! let mut speed = SpeedInfo::start_at(0, t0);
//! speed.step_at(1000, t0 + Duration::from_secs(1));
//! assert_eq!(speed.current_speed(), 1000.0);
//!
//! speed.end_at(2000, t0 + Duration::from_secs(2));
//! assert_eq!(speed.average_speed(), 1000.0);
//! ```

mod format;

pub use format::{format_speed, round_half_up, GIB, KIB, MIB};

use std::time::{Duration, Instant};

/// Bytes per second for `bytes` moved in `elapsed`.
///
/// Returns `None` for a zero-length interval.
fn rate(bytes: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        Some(bytes as f64 / secs)
    } else {
        None
    }
}

/// Per-file speed estimator state.
#[derive(Debug, Clone)]
pub struct SpeedInfo {
    start_count: u64,
    start_time: Instant,
    last_count: u64,
    last_time: Instant,
    current: f64,
    average: f64,
}

impl SpeedInfo {
    /// Begin a session at `count` bytes, now.
    pub fn start(count: u64) -> Self {
        Self::start_at(count, Instant::now())
    }

    /// Begin a session at `count` bytes at the given instant.
    pub fn start_at(count: u64, now: Instant) -> Self {
        Self {
            start_count: count,
            start_time: now,
            last_count: count,
            last_time: now,
            current: 0.0,
            average: 0.0,
        }
    }

    /// Record a sample taken now.
    pub fn step(&mut self, count: u64) {
        self.step_at(count, Instant::now());
    }

    /// Record a sample taken at `now`.
    ///
    /// The current rate is only replaced when time has advanced and the
    /// counter grew; otherwise the previous figure is kept. The running
    /// session average is refreshed as well.
    pub fn step_at(&mut self, count: u64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_time);
        if elapsed.is_zero() {
            return;
        }

        if count > self.last_count {
            if let Some(r) = rate(count - self.last_count, elapsed) {
                self.current = r;
            }
        }

        self.last_count = count;
        self.last_time = now;
        self.refresh_average(count, now);
    }

    /// Finish the session now.
    pub fn end(&mut self, count: u64) {
        self.end_at(count, Instant::now());
    }

    /// Compute the session average at `now` over the full session span.
    ///
    /// Does not freeze the estimator; later samples keep updating it.
    pub fn end_at(&mut self, count: u64, now: Instant) {
        self.refresh_average(count, now);
    }

    fn refresh_average(&mut self, count: u64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.start_time);
        if let Some(r) = rate(count.saturating_sub(self.start_count), elapsed) {
            self.average = r;
        }
    }

    /// Rate between the two most recent samples, in bytes per second.
    pub fn current_speed(&self) -> f64 {
        self.current
    }

    /// Rate over the whole session, in bytes per second.
    pub fn average_speed(&self) -> f64 {
        self.average
    }
}
