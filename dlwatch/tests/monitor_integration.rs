//! Integration tests for the progress monitor driven by a real transfer.
//!
//! These tests verify the complete flow:
//! - Local parser → Transfer → ProgressMonitor → status lines
//! - One speed estimator per file across the whole session
//! - Failure reporting through the ERROR layout
//!
//! Run with: `cargo test --test monitor_integration`

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tempfile::TempDir;

use dlwatch::engine::{EngineError, LocalParser, Parser, Transfer, TransferSettings};
use dlwatch::monitor::{ManualClock, MemoryOutput, ProgressMonitor, SessionContext};
use dlwatch::resource::LifecycleState;

// ============================================================================
// Helper Functions
// ============================================================================

/// Monitor wired to an in-memory sink and a clock that never moves.
fn frozen_monitor() -> (ProgressMonitor, Arc<MemoryOutput>) {
    let output = Arc::new(MemoryOutput::new());
    let monitor = ProgressMonitor::with_clock(
        Arc::new(SessionContext::new()),
        output.clone(),
        Arc::new(ManualClock::new()),
    );
    (monitor, output)
}

/// Create a source directory holding `files` of the given sizes.
fn source_dir(root: &Path, name: &str, files: &[(&str, usize)]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir(&dir).unwrap();
    for (file, size) in files {
        fs::write(dir.join(file), vec![7u8; *size]).unwrap();
    }
    dir
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A two-file media download renders every lifecycle layout in order.
#[test]
fn test_full_transfer_renders_lifecycle() {
    let temp = TempDir::new().unwrap();
    let dir = source_dir(temp.path(), "season_720p", &[("a.bin", 5000), ("b.bin", 3000)]);
    let out = temp.path().join("out");

    let resource = LocalParser.info(&dir.to_string_lossy()).unwrap().into_shared();
    let transfer = Transfer::new(resource, &out).with_settings(TransferSettings::new(2, 1000));
    let (monitor, output) = frozen_monitor();

    transfer
        .download(&LocalParser, &AtomicBool::new(false), &monitor)
        .unwrap();

    let a = out.join("a.bin").display().to_string();
    let b = out.join("b.bin").display().to_string();
    let lines = output.lines();

    assert_eq!(lines[0], "EXTRACTING 720p");
    assert_eq!(lines[1], format!("file:0 - {a} (0.0 kb/s)"));
    assert_eq!(lines[2], format!("file:1 - {b} (0.0 kb/s)"));
    assert_eq!(lines[3], "EXTRACTING_DONE 720p");

    // the clock never advances, so only the first DOWNLOADING event renders
    assert_eq!(lines[6], "file:0 - DOWNLOADING 0.00 (0.0 kb/s / 0.0 kb/s)");
    assert_eq!(lines[7], "file:1 - DOWNLOADING 0.00 (0.0 kb/s / 0.0 kb/s)");

    let tail = &lines[lines.len() - 3..];
    assert_eq!(tail[0], "DONE 720p");
    assert_eq!(tail[1], format!("file:0 - {a} (0.0 kb/s)"));
    assert_eq!(tail[2], format!("file:1 - {b} (0.0 kb/s)"));
    assert_eq!(lines.len(), 11);

    assert_eq!(monitor.context().tracked_files(), 2);
    assert_eq!(fs::read(out.join("a.bin")).unwrap().len(), 5000);
}

/// A plain resource falls back to the unknown-quality header.
#[test]
fn test_plain_resource_summary() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("notes.txt");
    fs::write(&source, b"hello world").unwrap();
    let out = temp.path().join("out");

    let resource = LocalParser.info(&source.to_string_lossy()).unwrap().into_shared();
    let transfer = Transfer::new(resource, &out);
    let (monitor, output) = frozen_monitor();

    transfer
        .download(&LocalParser, &AtomicBool::new(false), &monitor)
        .unwrap();

    let lines = output.lines();
    assert_eq!(lines[0], "downloading unknown quality");
    assert_eq!(
        lines.last().map(String::as_str),
        Some(format!("file:0 - {} (0.0 kb/s)", out.join("notes.txt").display()).as_str())
    );
}

/// A source that vanishes between extraction and download is reported in
/// the ERROR layout.
#[test]
fn test_failure_renders_error_layout() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("clip_1080p.bin");
    fs::write(&source, vec![1u8; 100]).unwrap();
    let out = temp.path().join("out");

    let resource = LocalParser.info(&source.to_string_lossy()).unwrap().into_shared();
    let transfer = Transfer::new(resource, &out);
    let (monitor, output) = frozen_monitor();
    let stop = AtomicBool::new(false);

    transfer.extract(&LocalParser, &stop, &monitor).unwrap();
    fs::remove_file(&source).unwrap();
    let err = transfer.download(&LocalParser, &stop, &monitor).unwrap_err();

    assert!(matches!(err, EngineError::ReadFailed { .. }));
    assert_eq!(transfer.resource().read().state, LifecycleState::Error);

    let lines = output.lines();
    let header = lines.iter().position(|l| l == "ERROR 0").unwrap();
    let detail = &lines[header + 1];
    assert!(detail.starts_with("file:0 - failed to read"));
    assert!(detail.ends_with("delay:0"));
}

/// Progress reported on the real clock eventually shows a non-zero average.
#[test]
fn test_system_clock_reports_average() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("big.bin");
    fs::write(&source, vec![3u8; 2_000_000]).unwrap();
    let out = temp.path().join("out");

    let resource = LocalParser.info(&source.to_string_lossy()).unwrap().into_shared();
    let transfer = Transfer::new(resource, &out);
    let output = Arc::new(MemoryOutput::new());
    let monitor = ProgressMonitor::new(Arc::new(SessionContext::new()), output.clone());

    transfer
        .download(&LocalParser, &AtomicBool::new(false), &monitor)
        .unwrap();

    let id = transfer.resource().read().files[0].id;
    let (_, average) = monitor.context().speeds_of(id).unwrap();
    assert!(average > 0.0);
    assert!(!output.is_empty());
}
