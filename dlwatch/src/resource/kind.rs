//! Resource subtypes and their optional capabilities.
//!
//! Source adapters describe what kind of resource they produced through
//! [`SourceKind`]. Extra metadata is exposed as capabilities rather than
//! concrete types, so the monitor asks "does this resource know its quality?"
//! instead of matching on every adapter.

use std::fmt;

/// Capability: the resource knows which quality variant is being fetched.
pub trait HasQualityInfo {
    /// Human-readable quality label (e.g. `720p`).
    fn quality(&self) -> String;
}

/// Describes the subtype of a resource.
pub trait SourceKind: fmt::Debug + Send + Sync {
    /// Short adapter name for logging.
    fn name(&self) -> &str;

    /// Quality capability, if this subtype carries one.
    fn quality_info(&self) -> Option<&dyn HasQualityInfo> {
        None
    }
}

/// Resource without any quality metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSource;

impl SourceKind for PlainSource {
    fn name(&self) -> &str {
        "plain"
    }
}

/// Vertical resolution of a video variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VideoQuality {
    P144,
    P240,
    P360,
    P480,
    P720,
    P1080,
    P1440,
    P2160,
    /// Any other height.
    Other(u32),
}

impl VideoQuality {
    /// Map a pixel height onto a quality variant.
    pub fn from_height(height: u32) -> Self {
        match height {
            144 => VideoQuality::P144,
            240 => VideoQuality::P240,
            360 => VideoQuality::P360,
            480 => VideoQuality::P480,
            720 => VideoQuality::P720,
            1080 => VideoQuality::P1080,
            1440 => VideoQuality::P1440,
            2160 => VideoQuality::P2160,
            other => VideoQuality::Other(other),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            VideoQuality::P144 => 144,
            VideoQuality::P240 => 240,
            VideoQuality::P360 => 360,
            VideoQuality::P480 => 480,
            VideoQuality::P720 => 720,
            VideoQuality::P1080 => 1080,
            VideoQuality::P1440 => 1440,
            VideoQuality::P2160 => 2160,
            VideoQuality::Other(h) => *h,
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

/// Media resource with a known quality variant.
#[derive(Debug, Clone, Copy)]
pub struct MediaSource {
    pub quality: VideoQuality,
}

impl MediaSource {
    pub fn new(quality: VideoQuality) -> Self {
        Self { quality }
    }
}

impl HasQualityInfo for MediaSource {
    fn quality(&self) -> String {
        self.quality.to_string()
    }
}

impl SourceKind for MediaSource {
    fn name(&self) -> &str {
        "media"
    }

    fn quality_info(&self) -> Option<&dyn HasQualityInfo> {
        Some(self)
    }
}
