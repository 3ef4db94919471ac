//! Download command: extract, list, download, monitor.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use dlwatch::config::ConfigFile;
use dlwatch::engine::{parser_for, Parser, Transfer, TransferSettings};
use dlwatch::monitor::{Output, ProgressMonitor, SessionContext};

use crate::error::CliError;

/// Arguments for the download command.
#[derive(Debug, Clone)]
pub struct DownloadArgs {
    pub locator: String,
    pub target_dir: PathBuf,
    pub interval_ms: Option<u64>,
    pub parallel: Option<usize>,
    pub part_size: Option<u64>,
    pub no_extract: bool,
}

/// Effective settings after applying CLI overrides to the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub render_interval: Duration,
    pub transfer: TransferSettings,
}

impl ResolvedSettings {
    /// CLI > config file > defaults.
    pub fn resolve(args: &DownloadArgs, config: &ConfigFile) -> Self {
        let render_interval = args
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or(config.monitor.render_interval);
        let transfer = TransferSettings::new(
            args.parallel.unwrap_or(config.download.parallel),
            args.part_size.unwrap_or(config.download.part_size),
        );
        Self {
            render_interval,
            transfer,
        }
    }
}

/// Run the download command.
///
/// A user interruption is not a failure: the last known state is printed and
/// the command returns `Ok`.
pub fn run(
    args: &DownloadArgs,
    config: &ConfigFile,
    output: Arc<dyn Output>,
    stop: &AtomicBool,
) -> Result<(), CliError> {
    let settings = ResolvedSettings::resolve(args, config);
    let parser = parser_for(&args.locator)?;
    let resource = parser.info(&args.locator)?.into_shared();

    let transfer = Transfer::new(resource, &args.target_dir).with_settings(settings.transfer);
    let context = Arc::new(SessionContext::with_render_interval(settings.render_interval));
    let monitor = ProgressMonitor::new(context, Arc::clone(&output));

    tracing::info!(
        locator = %args.locator,
        target = %args.target_dir.display(),
        parallel = settings.transfer.parallel,
        interval_ms = settings.render_interval.as_millis() as u64,
        "Download requested"
    );

    match execute(args, parser.as_ref(), &transfer, &monitor, output.as_ref(), stop) {
        Err(e) if e.is_interrupted() => {
            let state = transfer.resource().read().state;
            tracing::info!(%state, "Download interrupted");
            output.write_line(&state.to_string())?;
            Ok(())
        }
        other => other,
    }
}

fn execute(
    args: &DownloadArgs,
    parser: &dyn Parser,
    transfer: &Transfer,
    monitor: &ProgressMonitor,
    output: &dyn Output,
    stop: &AtomicBool,
) -> Result<(), CliError> {
    if !args.no_extract {
        transfer.extract(parser, stop, monitor)?;
        print_listing(transfer, output)?;
    }
    transfer.download(parser, stop, monitor)?;
    Ok(())
}

/// `Title: <title>` followed by one `Download URL: <source>` per file.
fn print_listing(transfer: &Transfer, output: &dyn Output) -> Result<(), CliError> {
    let resource = transfer.resource().read();
    output.write_line(&format!(
        "Title: {}",
        resource.title.as_deref().unwrap_or_default()
    ))?;
    for file in &resource.files {
        output.write_line(&format!("Download URL: {}", file.source))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlwatch::monitor::MemoryOutput;
    use std::fs;
    use tempfile::TempDir;

    fn args(locator: &str, target_dir: PathBuf) -> DownloadArgs {
        DownloadArgs {
            locator: locator.to_string(),
            target_dir,
            interval_ms: None,
            parallel: None,
            part_size: None,
            no_extract: false,
        }
    }

    #[test]
    fn test_resolve_prefers_cli_over_config() {
        let mut config = ConfigFile::default();
        config.download.parallel = 8;
        config.monitor.render_interval = Duration::from_millis(500);

        let mut a = args("x", PathBuf::from("/out"));
        let resolved = ResolvedSettings::resolve(&a, &config);
        assert_eq!(resolved.transfer.parallel, 8);
        assert_eq!(resolved.render_interval, Duration::from_millis(500));

        a.parallel = Some(2);
        a.interval_ms = Some(100);
        a.part_size = Some(0);
        let resolved = ResolvedSettings::resolve(&a, &config);
        assert_eq!(resolved.transfer.parallel, 2);
        assert_eq!(resolved.transfer.part_size, 1);
        assert_eq!(resolved.render_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_run_prints_listing_and_downloads() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("talk_720p.bin");
        fs::write(&source, vec![9u8; 4096]).unwrap();
        let out = temp.path().join("out");
        let output = Arc::new(MemoryOutput::new());

        let a = args(&source.to_string_lossy(), out.clone());
        run(&a, &ConfigFile::default(), output.clone(), &AtomicBool::new(false)).unwrap();

        let lines = output.lines();
        assert!(lines.contains(&"Title: talk_720p".to_string()));
        assert!(lines.contains(&format!("Download URL: {}", source.display())));
        assert_eq!(lines.iter().filter(|l| *l == "DONE 720p").count(), 1);
        assert_eq!(fs::read(out.join("talk_720p.bin")).unwrap().len(), 4096);
    }

    #[test]
    fn test_run_no_extract_skips_listing() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("notes.txt");
        fs::write(&source, b"abc").unwrap();
        let output = Arc::new(MemoryOutput::new());

        let mut a = args(&source.to_string_lossy(), temp.path().join("out"));
        a.no_extract = true;
        run(&a, &ConfigFile::default(), output.clone(), &AtomicBool::new(false)).unwrap();

        assert!(!output.lines().iter().any(|l| l.starts_with("Title:")));
    }

    #[test]
    fn test_interruption_prints_state_and_succeeds() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.bin");
        fs::write(&source, b"abc").unwrap();
        let output = Arc::new(MemoryOutput::new());

        let a = args(&source.to_string_lossy(), temp.path().join("out"));
        run(&a, &ConfigFile::default(), output.clone(), &AtomicBool::new(true)).unwrap();

        assert_eq!(output.lines(), vec!["STOP".to_string()]);
    }

    #[test]
    fn test_unsupported_locator_fails() {
        let temp = TempDir::new().unwrap();
        let output = Arc::new(MemoryOutput::new());
        let a = args("https://example.com/v", temp.path().to_path_buf());

        let err = run(&a, &ConfigFile::default(), output, &AtomicBool::new(false)).unwrap_err();
        assert!(!err.is_interrupted());
        assert!(err.to_string().contains("unsupported locator"));
    }
}
