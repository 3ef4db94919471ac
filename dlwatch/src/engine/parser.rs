//! Source adapter contract.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use super::error::EngineResult;
use crate::resource::{Resource, SharedResource};

/// Adapter that knows how to describe and read one kind of locator.
///
/// [`Transfer`](super::Transfer) drives the lifecycle; the parser only
/// answers "what files make up this resource?" and "give me bytes from this
/// offset".
pub trait Parser: fmt::Debug + Send + Sync {
    /// Short adapter name for logging.
    fn name(&self) -> &str;

    /// Create the resource for a locator, picking its subtype.
    fn info(&self, locator: &str) -> EngineResult<Resource>;

    /// Resolve title and file list.
    ///
    /// Called while the resource is EXTRACTING. Target paths are placed
    /// under `target_dir`. Calling it again on an extracted resource must
    /// not duplicate files.
    fn extract(
        &self,
        resource: &SharedResource,
        target_dir: &Path,
        stop: &AtomicBool,
    ) -> EngineResult<()>;

    /// Open the file `source` positioned at byte `offset`.
    fn open(&self, source: &str, offset: u64) -> EngineResult<Box<dyn Read + Send>>;
}
