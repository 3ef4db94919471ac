//! Per-session monitor state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};

use super::throttle::RenderThrottle;
use crate::resource::{FileDescriptor, FileId};
use crate::speed::SpeedInfo;

/// Mutable state guarded by the session lock.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    /// One estimator per file, created lazily and never removed.
    pub(crate) estimators: HashMap<FileId, SpeedInfo>,
    /// Gate for DOWNLOADING renders.
    pub(crate) throttle: RenderThrottle,
}

impl SessionState {
    /// Estimator for `file`, starting a new session at its current count if
    /// none exists yet.
    pub(crate) fn estimator(&mut self, file: &FileDescriptor, now: Instant) -> &mut SpeedInfo {
        self.estimators.entry(file.id).or_insert_with(|| {
            tracing::debug!(file = %file.id, count = file.count, "Starting speed session");
            SpeedInfo::start_at(file.count, now)
        })
    }
}

/// State for one download session, owned outside the monitor.
///
/// Holds the estimator map and the render throttle behind a single lock.
/// Create one per session and hand it to
/// [`ProgressMonitor`](super::ProgressMonitor); keep a clone of the `Arc` to
/// inspect rates afterwards.
#[derive(Debug, Default)]
pub struct SessionContext {
    state: Mutex<SessionState>,
}

impl SessionContext {
    /// Create a context with the default 1s render interval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a custom DOWNLOADING render interval.
    pub fn with_render_interval(interval: Duration) -> Self {
        Self {
            state: Mutex::new(SessionState {
                estimators: HashMap::new(),
                throttle: RenderThrottle::new(interval),
            }),
        }
    }

    pub fn render_interval(&self) -> Duration {
        self.state.lock().throttle.interval()
    }

    /// Number of files with a speed session.
    pub fn tracked_files(&self) -> usize {
        self.state.lock().estimators.len()
    }

    /// `(current, average)` rates for a file, in bytes per second.
    pub fn speeds_of(&self, id: FileId) -> Option<(f64, f64)> {
        self.state
            .lock()
            .estimators
            .get(&id)
            .map(|s| (s.current_speed(), s.average_speed()))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock()
    }
}
