//! Data model shared between the download engine and the monitor.
//!
//! A [`Resource`] is one logical download target (for example one video)
//! made of one or more [`FileDescriptor`]s. Split transfers additionally
//! carry [`PartDescriptor`]s per file. The engine owns and mutates the
//! resource through a [`SharedResource`]; the monitor only reads it from
//! inside its progress callback.

mod file;
mod kind;
mod state;

pub use file::{fraction, FileDescriptor, FileId, PartDescriptor};
pub use kind::{HasQualityInfo, MediaSource, PlainSource, SourceKind, VideoQuality};
pub use state::{LifecycleState, PartState};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

/// Live resource handle shared by the engine's worker threads.
pub type SharedResource = Arc<RwLock<Resource>>;

/// One logical multi-file download.
#[derive(Debug)]
pub struct Resource {
    /// Locator the resource was created from.
    pub locator: String,
    /// Title, once extraction has resolved it.
    pub title: Option<String>,
    pub state: LifecycleState,
    /// Current retry delay.
    pub delay: Duration,
    /// Output files in engine order.
    pub files: Vec<FileDescriptor>,
    /// Subtype and capabilities.
    pub kind: Box<dyn SourceKind>,
    next_file_id: u64,
}

impl Resource {
    /// Create a queued resource with no files.
    pub fn new(locator: impl Into<String>, kind: Box<dyn SourceKind>) -> Self {
        Self {
            locator: locator.into(),
            title: None,
            state: LifecycleState::Queued,
            delay: Duration::ZERO,
            files: Vec::new(),
            kind,
            next_file_id: 0,
        }
    }

    /// Wrap into a [`SharedResource`].
    pub fn into_shared(self) -> SharedResource {
        Arc::new(RwLock::new(self))
    }

    /// Append a file and return its identity.
    pub fn add_file(&mut self, source: impl Into<String>, target: PathBuf) -> FileId {
        let id = FileId::new(self.next_file_id);
        self.next_file_id += 1;
        self.files.push(FileDescriptor::new(id, source, target));
        id
    }

    /// Look up a file by identity.
    pub fn file(&self, id: FileId) -> Option<&FileDescriptor> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn file_mut(&mut self, id: FileId) -> Option<&mut FileDescriptor> {
        self.files.iter_mut().find(|f| f.id == id)
    }

    /// Quality capability of the resource subtype, if any.
    pub fn quality_info(&self) -> Option<&dyn HasQualityInfo> {
        self.kind.quality_info()
    }

    /// Total bytes transferred across all files.
    pub fn total_count(&self) -> u64 {
        self.files.iter().map(|f| f.count).sum()
    }
}
