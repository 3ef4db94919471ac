//! Error types for the download engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the engine during extraction or download.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The caller's stop flag was observed mid-transfer.
    #[error("download interrupted")]
    Interrupted,

    /// No parser accepts the locator.
    #[error("unsupported locator: {0}")]
    UnsupportedLocator(String),

    /// The locator points at nothing.
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// A destination path resolves to the file it would be copied from.
    #[error("target {} is the source file", .0.display())]
    TargetIsSource(PathBuf),

    /// The progress listener could not write its output.
    #[error("progress listener failed: {0}")]
    Listener(#[source] io::Error),

    /// A transfer worker thread panicked.
    #[error("download worker panicked")]
    WorkerPanicked,
}

impl EngineError {
    /// Check if this is the cancellation signal rather than a failure.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, EngineError::Interrupted)
    }
}
