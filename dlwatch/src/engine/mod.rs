//! Download engine.
//!
//! The engine resolves a locator into a [`Resource`](crate::resource::Resource)
//! through a [`Parser`], then drives it with a [`Transfer`]: extraction first,
//! then the parallel download. Every state change and every written chunk is
//! reported to a [`ProgressListener`].
//!
//! # Example
//!
//! ```no_run
//! use std::io;
//! use std::sync::atomic::AtomicBool;
//! use dlwatch::engine::{parser_for, Parser, Transfer};
//! use dlwatch::resource::Resource;
//!
//! let parser = parser_for("file:///data/talk_720p.mp4")?;
//! let resource = parser.info("file:///data/talk_720p.mp4")?.into_shared();
//! let transfer = Transfer::new(resource, "/tmp/out");
//! let listener = |r: &Resource| -> io::Result<()> {
//!     println!("{} {}", r.state, r.total_count());
//!     Ok(())
//! };
//! transfer.download(parser.as_ref(), &AtomicBool::new(false), &listener)?;
//! # Ok::<(), dlwatch::engine::EngineError>(())
//! ```

mod error;
mod listener;
mod local;
mod parser;
mod transfer;

pub use error::{EngineError, EngineResult};
pub use listener::ProgressListener;
pub use local::{quality_from_title, LocalParser};
pub use parser::Parser;
pub use transfer::{Transfer, TransferSettings, DEFAULT_PARALLEL, DEFAULT_PART_SIZE};

/// Pick the parser for a locator.
pub fn parser_for(locator: &str) -> EngineResult<Box<dyn Parser>> {
    if LocalParser::accepts(locator) {
        return Ok(Box::new(LocalParser));
    }
    Err(EngineError::UnsupportedLocator(locator.to_string()))
}
