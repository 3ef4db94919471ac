//! dlwatch - download progress and throughput monitoring
//!
//! This library observes a multi-file, multi-part transfer driven by an
//! external engine and renders one coherent status line per file on every
//! progress callback.
//!
//! # Architecture
//!
//! ```text
//! Engine (Transfer + Parser) ──► ProgressMonitor ──► SpeedInfo ──► Output
//!        mutates Resource         (dispatcher)       (estimator)    (lines)
//! ```
//!
//! - [`resource`]: the data model the engine mutates and the monitor reads
//! - [`speed`]: per-file instantaneous and average rate estimation
//! - [`monitor`]: lifecycle dispatcher, throttling, and line rendering
//! - [`engine`]: the callback contract plus a bundled local-file adapter
//! - [`config`]: INI configuration file loading

pub mod config;
pub mod engine;
pub mod monitor;
pub mod resource;
pub mod speed;

/// Crate version, as reported by the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
