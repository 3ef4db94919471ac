//! File and part descriptors.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::state::{LifecycleState, PartState};

/// Stable identity of a [`FileDescriptor`] within its resource.
///
/// Allocated by [`Resource::add_file`](super::Resource::add_file) and never
/// reused, so it is safe to key per-file state on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u64);

impl FileId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ratio of `count` to `length`.
///
/// Returns 0.0 when the length is unknown or zero so callers never divide
/// by zero.
pub fn fraction(count: u64, length: Option<u64>) -> f64 {
    match length {
        Some(len) if len > 0 => count as f64 / len as f64,
        _ => 0.0,
    }
}

/// One byte-range sub-transfer of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct PartDescriptor {
    /// Stable ordinal of the part within its file (starting at 0).
    pub number: u64,
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
    /// Bytes transferred so far.
    pub count: u64,
    /// Total bytes in this range.
    pub length: u64,
    pub state: PartState,
    /// Last error captured for this part.
    pub error: Option<String>,
}

impl PartDescriptor {
    /// Create a queued part covering `start..=end`.
    pub fn new(number: u64, start: u64, end: u64) -> Self {
        Self {
            number,
            start,
            end,
            count: 0,
            length: end.saturating_sub(start) + 1,
            state: PartState::Queued,
            error: None,
        }
    }

    /// Fraction of this part already transferred.
    pub fn fraction(&self) -> f64 {
        fraction(self.count, Some(self.length))
    }

    /// Split `length` bytes into consecutive parts of at most `part_size`.
    pub fn split(length: u64, part_size: u64) -> Vec<PartDescriptor> {
        let part_size = part_size.max(1);
        let mut parts = Vec::new();
        let mut start = 0;
        let mut number = 0;

        while start < length {
            let end = (start + part_size).min(length) - 1;
            parts.push(PartDescriptor::new(number, start, end));
            start = end + 1;
            number += 1;
        }

        parts
    }
}

/// One physical output file of a resource.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub id: FileId,
    /// Where the bytes come from (URL or path), as reported by the parser.
    pub source: String,
    /// Destination path on disk.
    pub target: PathBuf,
    /// Bytes transferred so far.
    pub count: u64,
    /// Total size, if known.
    pub length: Option<u64>,
    pub state: LifecycleState,
    /// Last error captured for this file.
    pub error: Option<String>,
    /// Current retry delay.
    pub delay: Duration,
    /// Range parts, present only for split transfers.
    pub parts: Option<Vec<PartDescriptor>>,
}

impl FileDescriptor {
    pub(crate) fn new(id: FileId, source: impl Into<String>, target: PathBuf) -> Self {
        Self {
            id,
            source: source.into(),
            target,
            count: 0,
            length: None,
            state: LifecycleState::Queued,
            error: None,
            delay: Duration::ZERO,
            parts: None,
        }
    }

    /// Fraction of the file already transferred (0.0 when length is unknown).
    pub fn fraction(&self) -> f64 {
        fraction(self.count, self.length)
    }

    /// Look up a part by its number.
    pub fn part_mut(&mut self, number: u64) -> Option<&mut PartDescriptor> {
        self.parts
            .as_mut()
            .and_then(|parts| parts.iter_mut().find(|p| p.number == number))
    }
}
