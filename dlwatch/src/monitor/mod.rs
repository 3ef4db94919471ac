//! Progress monitoring for multi-file downloads.
//!
//! The monitor is the callback the download engine invokes on every progress
//! event. It keeps one [`SpeedInfo`](crate::speed::SpeedInfo) per file,
//! throttles the high-frequency DOWNLOADING state, and writes human-readable
//! status lines to an [`Output`].
//!
//! # Architecture
//!
//! ```text
//! Engine ──on_progress──► ProgressMonitor ──► render ──► Output
//!                              │
//!                              └── SessionContext (lock)
//!                                    ├── estimators: FileId → SpeedInfo
//!                                    └── RenderThrottle
//! ```
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use dlwatch::engine::ProgressListener;
//! use dlwatch::monitor::{MemoryOutput, ProgressMonitor, SessionContext};
//! use dlwatch::resource::{LifecycleState, PlainSource, Resource};
//!
//! let output = Arc::new(MemoryOutput::new());
//! let monitor = ProgressMonitor::new(Arc::new(SessionContext::new()), output.clone());
//!
//! let mut resource = Resource::new("file:///tmp/in", Box::new(PlainSource));
//! resource.add_file("/tmp/in", PathBuf::from("/tmp/out"));
//! resource.state = LifecycleState::Done;
//!
//! monitor.on_progress(&resource).unwrap();
//! assert_eq!(output.lines()[1], "file:0 - /tmp/out (0.0 kb/s)");
//! ```

mod clock;
mod context;
mod dispatcher;
mod output;
pub mod render;
mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::SessionContext;
pub use dispatcher::ProgressMonitor;
pub use output::{MemoryOutput, Output, StdoutOutput};
pub use throttle::{RenderThrottle, DEFAULT_RENDER_INTERVAL};
