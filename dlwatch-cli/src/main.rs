//! dlwatch CLI - download a resource and watch its progress.
//!
//! Status lines are written to stdout; diagnostics go to the log file
//! configured in `~/.dlwatch/config.ini`.

mod download;
mod error;
mod logging;

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use dlwatch::config::ConfigFile;
use dlwatch::monitor::StdoutOutput;

use download::DownloadArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "dlwatch")]
#[command(version = dlwatch::VERSION)]
#[command(about = "Download a multi-file resource and report its progress", long_about = None)]
struct Cli {
    /// Resource locator (file:// URL or local path)
    locator: String,

    /// Directory the files are written to
    target_dir: PathBuf,

    /// Minimum milliseconds between two progress renders
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Number of concurrent transfer workers
    #[arg(long)]
    parallel: Option<usize>,

    /// Split files larger than this many bytes into range parts
    #[arg(long)]
    part_size: Option<u64>,

    /// Configuration file to use instead of ~/.dlwatch/config.ini
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip printing the title and file list before downloading
    #[arg(long)]
    no_extract: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn download_args(&self) -> DownloadArgs {
        DownloadArgs {
            locator: self.locator.clone(),
            target_dir: self.target_dir.clone(),
            interval_ms: self.interval_ms,
            parallel: self.parallel,
            part_size: self.part_size,
            no_extract: self.no_extract,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    let _log_guard = logging::init(&config.logging, cli.verbose)?;
    tracing::info!(version = dlwatch::VERSION, "dlwatch starting");

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    download::run(
        &cli.download_args(),
        &config,
        Arc::new(StdoutOutput::new()),
        &stop,
    )
}
