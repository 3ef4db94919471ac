//! Transfer driver: lifecycle transitions and parallel range copies.
//!
//! [`Transfer`] owns the [`SharedResource`] for one download session. It
//! moves the resource through its lifecycle, splits large files into range
//! parts, and fans the resulting tasks out over a fixed number of scoped
//! worker threads. Every chunk written updates the byte counters and invokes
//! the progress listener.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;

use super::error::{EngineError, EngineResult};
use super::listener::ProgressListener;
use super::parser::Parser;
use crate::resource::{
    FileDescriptor, FileId, LifecycleState, PartDescriptor, PartState, SharedResource,
};

/// Buffer size for each read/write step (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Default number of concurrent transfer workers.
pub const DEFAULT_PARALLEL: usize = 4;

/// Default size of one range part (4 MiB).
pub const DEFAULT_PART_SIZE: u64 = 4 * 1024 * 1024;

/// Tuning for a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSettings {
    /// Maximum number of concurrent workers (minimum 1).
    pub parallel: usize,
    /// Files larger than this are split into parts of this size when
    /// `parallel > 1` (minimum 1).
    pub part_size: u64,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL, DEFAULT_PART_SIZE)
    }
}

impl TransferSettings {
    pub fn new(parallel: usize, part_size: u64) -> Self {
        Self {
            parallel: parallel.max(1),
            part_size: part_size.max(1),
        }
    }
}

/// One unit of worker output: a whole file or one of its parts.
#[derive(Debug, Clone)]
struct Task {
    file: FileId,
    part: Option<u64>,
    source: String,
    target: PathBuf,
    offset: u64,
    length: Option<u64>,
}

/// Drives extraction and download of one resource.
#[derive(Debug)]
pub struct Transfer {
    resource: SharedResource,
    target_dir: PathBuf,
    settings: TransferSettings,
}

impl Transfer {
    /// Create a transfer writing into `target_dir` with default settings.
    pub fn new(resource: SharedResource, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource,
            target_dir: target_dir.into(),
            settings: TransferSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: TransferSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn resource(&self) -> &SharedResource {
        &self.resource
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn settings(&self) -> TransferSettings {
        self.settings
    }

    /// Resolve metadata and the file list.
    ///
    /// Reports EXTRACTING once the file list is known, then EXTRACTING_DONE.
    pub fn extract(
        &self,
        parser: &dyn Parser,
        stop: &AtomicBool,
        listener: &dyn ProgressListener,
    ) -> EngineResult<()> {
        self.check_stop(stop)?;
        {
            let resource = self.resource.read();
            tracing::info!(
                parser = parser.name(),
                kind = resource.kind.name(),
                locator = %resource.locator,
                "Extracting resource"
            );
        }

        self.set_state(LifecycleState::Extracting);
        if let Err(e) = parser.extract(&self.resource, &self.target_dir, stop) {
            if e.is_interrupted() {
                self.set_state(LifecycleState::Stop);
            } else {
                tracing::error!(error = %e, "Extraction failed");
                self.set_state(LifecycleState::Error);
                self.report_failure(listener);
            }
            return Err(e);
        }
        self.notify(listener)?;

        self.set_state(LifecycleState::ExtractingDone);
        self.notify(listener)
    }

    /// Download every file of the resource.
    ///
    /// Extracts first if that has not happened yet. Returns
    /// [`EngineError::Interrupted`] if `stop` is raised mid-transfer.
    pub fn download(
        &self,
        parser: &dyn Parser,
        stop: &AtomicBool,
        listener: &dyn ProgressListener,
    ) -> EngineResult<()> {
        if self.resource.read().state == LifecycleState::Queued {
            self.extract(parser, stop, listener)?;
        }
        self.check_stop(stop)?;

        let tasks = match self.prepare() {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!(error = %e, "Failed to prepare download");
                self.set_state(LifecycleState::Error);
                self.report_failure(listener);
                return Err(e);
            }
        };
        tracing::info!(
            tasks = tasks.len(),
            parallel = self.settings.parallel,
            target = %self.target_dir.display(),
            "Starting download"
        );

        self.set_state(LifecycleState::Downloading);
        self.notify(listener)?;

        self.run_tasks(parser, &tasks, stop, listener)?;

        self.set_state(LifecycleState::Done);
        tracing::info!(
            bytes = self.resource.read().total_count(),
            "Download complete"
        );
        self.notify(listener)
    }

    fn notify(&self, listener: &dyn ProgressListener) -> EngineResult<()> {
        let resource = self.resource.read();
        listener
            .on_progress(&resource)
            .map_err(EngineError::Listener)
    }

    /// Per-chunk notification, suppressed once the resource is terminal.
    fn notify_progress(&self, listener: &dyn ProgressListener) -> EngineResult<()> {
        let resource = self.resource.read();
        if resource.state.is_terminal() {
            return Ok(());
        }
        listener
            .on_progress(&resource)
            .map_err(EngineError::Listener)
    }

    /// Best-effort notification after a failure has already been recorded.
    fn report_failure(&self, listener: &dyn ProgressListener) {
        if let Err(e) = self.notify(listener) {
            tracing::warn!(error = %e, "Failed to report transfer failure");
        }
    }

    fn set_state(&self, state: LifecycleState) {
        self.resource.write().state = state;
    }

    fn check_stop(&self, stop: &AtomicBool) -> EngineResult<()> {
        if stop.load(Ordering::SeqCst) {
            self.set_state(LifecycleState::Stop);
            return Err(EngineError::Interrupted);
        }
        Ok(())
    }

    fn with_file<R>(&self, id: FileId, f: impl FnOnce(&mut FileDescriptor) -> R) -> Option<R> {
        let mut resource = self.resource.write();
        resource.file_mut(id).map(f)
    }

    /// Create destination files, reset counters, and plan the tasks.
    ///
    /// Nothing is created if any target resolves to its own source.
    fn prepare(&self) -> EngineResult<Vec<Task>> {
        fs::create_dir_all(&self.target_dir).map_err(|source| EngineError::CreateDirFailed {
            path: self.target_dir.clone(),
            source,
        })?;

        let settings = self.settings;
        let mut resource = self.resource.write();

        for file in resource.files.iter_mut() {
            if same_file(Path::new(&file.source), &file.target) {
                let err = EngineError::TargetIsSource(file.target.clone());
                file.state = LifecycleState::Error;
                file.error = Some(err.to_string());
                return Err(err);
            }
        }

        let mut tasks = Vec::new();

        for file in resource.files.iter_mut() {
            let write_failed = |source: io::Error| EngineError::WriteFailed {
                path: file.target.clone(),
                source,
            };
            let dest = File::create(&file.target).map_err(write_failed)?;
            if let Some(length) = file.length {
                dest.set_len(length).map_err(write_failed)?;
            }

            file.count = 0;
            file.error = None;
            file.state = LifecycleState::Queued;

            let split_length = file
                .length
                .filter(|&len| settings.parallel > 1 && len > settings.part_size);

            match split_length {
                Some(length) => {
                    let parts = PartDescriptor::split(length, settings.part_size);
                    tasks.extend(parts.iter().map(|part| Task {
                        file: file.id,
                        part: Some(part.number),
                        source: file.source.clone(),
                        target: file.target.clone(),
                        offset: part.start,
                        length: Some(part.length),
                    }));
                    file.parts = Some(parts);
                }
                None => {
                    file.parts = None;
                    tasks.push(Task {
                        file: file.id,
                        part: None,
                        source: file.source.clone(),
                        target: file.target.clone(),
                        offset: 0,
                        length: file.length,
                    });
                }
            }
        }

        Ok(tasks)
    }

    fn run_tasks(
        &self,
        parser: &dyn Parser,
        tasks: &[Task],
        stop: &AtomicBool,
        listener: &dyn ProgressListener,
    ) -> EngineResult<()> {
        let next = AtomicUsize::new(0);
        let halt = AtomicBool::new(false);
        let first_error: Mutex<Option<EngineError>> = Mutex::new(None);
        let workers = self.settings.parallel.min(tasks.len()).max(1);

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(|| loop {
                        if halt.load(Ordering::SeqCst) {
                            break;
                        }
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(task) = tasks.get(index) else {
                            break;
                        };
                        if let Err(e) = self.run_task(parser, task, stop, &halt, listener) {
                            halt.store(true, Ordering::SeqCst);
                            first_error.lock().get_or_insert(e);
                            break;
                        }
                    })
                })
                .collect();

            for handle in handles {
                if handle.join().is_err() {
                    halt.store(true, Ordering::SeqCst);
                    first_error.lock().get_or_insert(EngineError::WorkerPanicked);
                }
            }
        });

        match first_error.into_inner() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn run_task(
        &self,
        parser: &dyn Parser,
        task: &Task,
        stop: &AtomicBool,
        halt: &AtomicBool,
        listener: &dyn ProgressListener,
    ) -> EngineResult<()> {
        self.with_file(task.file, |file| {
            file.state = LifecycleState::Downloading;
            if let Some(part) = task.part.and_then(|n| file.part_mut(n)) {
                part.state = PartState::Downloading;
            }
        });
        tracing::debug!(
            file = %task.file,
            part = ?task.part,
            offset = task.offset,
            length = ?task.length,
            "Transfer task started"
        );

        let result = self.copy(parser, task, stop, halt, listener);
        if let Err(ref e) = result {
            // only the first failing worker reports
            let first = !halt.swap(true, Ordering::SeqCst);
            self.record_failure(task, e);
            if !e.is_interrupted() {
                tracing::error!(file = %task.file, part = ?task.part, error = %e, "Transfer task failed");
                if first {
                    self.report_failure(listener);
                }
            }
        }
        result
    }

    fn copy(
        &self,
        parser: &dyn Parser,
        task: &Task,
        stop: &AtomicBool,
        halt: &AtomicBool,
        listener: &dyn ProgressListener,
    ) -> EngineResult<()> {
        let source = parser.open(&task.source, task.offset)?;
        let mut reader: Box<dyn Read + Send> = match task.length {
            Some(length) => Box::new(source.take(length)),
            None => source,
        };

        let write_failed = |source: io::Error| EngineError::WriteFailed {
            path: task.target.clone(),
            source,
        };
        let mut dest = OpenOptions::new()
            .write(true)
            .open(&task.target)
            .map_err(write_failed)?;
        dest.seek(SeekFrom::Start(task.offset))
            .map_err(write_failed)?;

        let mut buffer = vec![0u8; BUFFER_SIZE];
        loop {
            if stop.load(Ordering::SeqCst) {
                return Err(EngineError::Interrupted);
            }
            if halt.load(Ordering::SeqCst) {
                // another worker failed; leave this task unfinished
                return Ok(());
            }

            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(EngineError::ReadFailed {
                        path: PathBuf::from(&task.source),
                        source,
                    })
                }
            };
            dest.write_all(&buffer[..n]).map_err(write_failed)?;

            self.with_file(task.file, |file| {
                file.count += n as u64;
                if let Some(part) = task.part.and_then(|num| file.part_mut(num)) {
                    part.count += n as u64;
                }
            });
            self.notify_progress(listener)?;
        }
        dest.flush().map_err(write_failed)?;

        self.with_file(task.file, |file| {
            if let Some(part) = task.part.and_then(|num| file.part_mut(num)) {
                part.state = PartState::Done;
            }
            if task.part.is_none() && file.length.is_none() {
                file.length = Some(file.count);
            }
            let complete = file
                .parts
                .as_ref()
                .map_or(true, |parts| parts.iter().all(|p| p.state == PartState::Done));
            if complete {
                file.state = LifecycleState::Done;
            }
        });
        Ok(())
    }

    fn record_failure(&self, task: &Task, error: &EngineError) {
        let interrupted = error.is_interrupted();
        let (file_state, part_state) = if interrupted {
            (LifecycleState::Stop, PartState::Stop)
        } else {
            (LifecycleState::Error, PartState::Error)
        };
        let message = (!interrupted).then(|| error.to_string());

        let mut resource = self.resource.write();
        if let Some(file) = resource.file_mut(task.file) {
            file.state = file_state;
            if message.is_some() {
                file.error = message.clone();
            }
            if let Some(part) = task.part.and_then(|n| file.part_mut(n)) {
                part.state = part_state;
                part.error = message;
            }
        }
        resource.state = file_state;
    }
}

/// Check if `target` already exists and is the same file as `source`.
fn same_file(source: &Path, target: &Path) -> bool {
    if !target.exists() {
        return false;
    }
    match (fs::canonicalize(source), fs::canonicalize(target)) {
        (Ok(source), Ok(target)) => source == target,
        _ => false,
    }
}
