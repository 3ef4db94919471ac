//! Lifecycle states reported by the download engine.

use std::fmt;

/// Coarse phase of a resource or file download.
///
/// Transitions are driven entirely by the engine. Consumers only react to
/// whatever state they are handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Created but not yet touched by the engine.
    #[default]
    Queued,
    /// Resolving metadata and file locations.
    Extracting,
    /// Metadata resolved; the file list is final.
    ExtractingDone,
    /// Bytes are flowing.
    Downloading,
    /// A transient failure occurred and the engine is waiting to retry.
    Retrying,
    /// The transfer was cancelled.
    Stop,
    /// The transfer failed permanently.
    Error,
    /// All bytes have been written.
    Done,
}

impl LifecycleState {
    /// Upper-case name used in rendered status lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Queued => "QUEUED",
            LifecycleState::Extracting => "EXTRACTING",
            LifecycleState::ExtractingDone => "EXTRACTING_DONE",
            LifecycleState::Downloading => "DOWNLOADING",
            LifecycleState::Retrying => "RETRYING",
            LifecycleState::Stop => "STOP",
            LifecycleState::Error => "ERROR",
            LifecycleState::Done => "DONE",
        }
    }

    /// Check if no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Stop | LifecycleState::Error | LifecycleState::Done
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one byte-range part of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PartState {
    /// Waiting for a worker.
    #[default]
    Queued,
    Downloading,
    Retrying,
    Stop,
    Error,
    Done,
}

impl PartState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartState::Queued => "QUEUED",
            PartState::Downloading => "DOWNLOADING",
            PartState::Retrying => "RETRYING",
            PartState::Stop => "STOP",
            PartState::Error => "ERROR",
            PartState::Done => "DONE",
        }
    }
}

impl fmt::Display for PartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
