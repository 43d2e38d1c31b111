//! Media file probing.
//!
//! [`Prober::probe`] is the one required operation; the narrower queries
//! are post-processing of a full probe unless an implementation has a
//! cheaper way to answer them (ffprobe does for duration).

mod ffprobe;
mod types;

pub use ffprobe::{parse_duration_output, parse_report, FfprobeProber};
pub use types::*;

use crate::Result;
use std::path::Path;
use std::time::Duration;

/// A media file prober.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe a media file and reduce the report to a [`ProbeResult`].
    fn probe(&self, path: &Path) -> Result<ProbeResult>;

    /// Duration of the media file.
    fn duration(&self, path: &Path) -> Result<Duration> {
        Ok(self.probe(path)?.duration)
    }

    /// Video geometry as `(width, height)`, `(0, 0)` without video.
    fn resolution(&self, path: &Path) -> Result<(u32, u32)> {
        Ok(self.probe(path)?.resolution())
    }

    /// Whether the file has an audio stream.
    fn has_audio(&self, path: &Path) -> Result<bool> {
        Ok(self.probe(path)?.has_audio)
    }

    /// Whether the file has a video stream.
    fn has_video(&self, path: &Path) -> Result<bool> {
        Ok(self.probe(path)?.has_video)
    }
}
