//! Local filesystem source adapter.
//!
//! Accepts `file://` locators and plain paths. A file locator yields a
//! single-file resource; a directory yields one file per regular file inside
//! it, in name order. A `<height>p` tag in the title (e.g. `talk_1080p`)
//! marks the resource as media of that quality.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use regex::Regex;

use super::error::{EngineError, EngineResult};
use super::parser::Parser;
use crate::resource::{
    MediaSource, PlainSource, Resource, SharedResource, SourceKind, VideoQuality,
};

const FILE_SCHEME: &str = "file://";

fn quality_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|[^0-9A-Za-z])([0-9]{3,4})[pP](?:$|[^0-9A-Za-z])")
            .expect("quality pattern is valid")
    })
}

/// Extract a quality tag such as `720p` from a title.
pub fn quality_from_title(title: &str) -> Option<VideoQuality> {
    quality_pattern()
        .captures(title)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(VideoQuality::from_height)
}

/// Adapter for files reachable through the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalParser;

impl LocalParser {
    /// Check if the locator is a `file://` URL or a scheme-less path.
    pub fn accepts(locator: &str) -> bool {
        locator.starts_with(FILE_SCHEME) || !locator.contains("://")
    }

    fn path_of(locator: &str) -> PathBuf {
        PathBuf::from(locator.strip_prefix(FILE_SCHEME).unwrap_or(locator))
    }

    fn title_of(path: &Path) -> String {
        let name = if path.is_dir() {
            path.file_name()
        } else {
            path.file_stem()
        };
        name.map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string())
    }

    /// Regular files making up the resource, in name order.
    fn list_files(path: &Path) -> EngineResult<Vec<PathBuf>> {
        if !path.is_dir() {
            return Ok(vec![path.to_path_buf()]);
        }

        let read_failed = |source: io::Error| EngineError::ReadFailed {
            path: path.to_path_buf(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(path).map_err(read_failed)? {
            let entry = entry.map_err(read_failed)?;
            let entry_path = entry.path();
            if entry_path.is_file() {
                files.push(entry_path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Parser for LocalParser {
    fn name(&self) -> &str {
        "local"
    }

    fn info(&self, locator: &str) -> EngineResult<Resource> {
        let path = Self::path_of(locator);
        if !path.exists() {
            return Err(EngineError::SourceNotFound(path));
        }

        let kind: Box<dyn SourceKind> = match quality_from_title(&Self::title_of(&path)) {
            Some(quality) => Box::new(MediaSource::new(quality)),
            None => Box::new(PlainSource),
        };
        Ok(Resource::new(locator, kind))
    }

    fn extract(
        &self,
        resource: &SharedResource,
        target_dir: &Path,
        stop: &AtomicBool,
    ) -> EngineResult<()> {
        let path = Self::path_of(&resource.read().locator);
        if !path.exists() {
            return Err(EngineError::SourceNotFound(path));
        }

        let title = Self::title_of(&path);
        let mut sizes = Vec::new();
        for file in Self::list_files(&path)? {
            if stop.load(Ordering::SeqCst) {
                return Err(EngineError::Interrupted);
            }
            let metadata = fs::metadata(&file).map_err(|source| EngineError::ReadFailed {
                path: file.clone(),
                source,
            })?;
            sizes.push((file, metadata.len()));
        }

        let mut resource = resource.write();
        resource.title = Some(title);
        if resource.files.is_empty() {
            for (file, length) in sizes {
                let name = file.file_name().map(PathBuf::from).unwrap_or_default();
                let id = resource.add_file(file.to_string_lossy(), target_dir.join(name));
                if let Some(descriptor) = resource.file_mut(id) {
                    descriptor.length = Some(length);
                }
            }
        }
        tracing::debug!(files = resource.files.len(), "Local resource extracted");
        Ok(())
    }

    fn open(&self, source: &str, offset: u64) -> EngineResult<Box<dyn Read + Send>> {
        let path = PathBuf::from(source);
        let read_failed = |source: io::Error| EngineError::ReadFailed {
            path: path.clone(),
            source,
        };
        let mut file = File::open(&path).map_err(read_failed)?;
        file.seek(SeekFrom::Start(offset)).map_err(read_failed)?;
        Ok(Box::new(BufReader::new(file)))
    }
}
