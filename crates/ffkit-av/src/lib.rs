//! # ffkit-av
//!
//! Typed wrappers around the `ffmpeg` and `ffprobe` command-line tools.
//!
//! This crate provides:
//! - A fluent [`FfmpegCommand`] builder that renders deterministic argument
//!   lists and runs them with cancellation and timeouts
//! - Media probing through the [`Prober`] trait, backed by [`FfprobeProber`]
//! - Video encoder discovery and hardware encoder selection ([`encoder`])
//! - Version and availability queries for both tools ([`tools`])
//!
//! Nothing here links against libav*; every operation spawns a process and
//! waits for it.
//!
//! ## Example
//!
//! ```no_run
//! use ffkit_av::FfmpegCommand;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> ffkit_av::Result<()> {
//! let info = ffkit_av::probe("/path/to/input.mov")?;
//! println!("{}x{} {:?}", info.width, info.height, info.duration);
//!
//! FfmpegCommand::new()
//!     .input("/path/to/input.mov")
//!     .video_codec("libx264")
//!     .crf(23)
//!     .output("/path/to/output.mp4")
//!     .run(&CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod encoder;
mod error;
pub mod ffmpeg;
pub mod probe;
pub mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use encoder::{
    CodecFamily, Encoder, EncoderKind, EncoderProbe, Platform, select_best_encoder,
};
pub use error::{Error, Result};
pub use ffmpeg::{FfmpegCommand, InputSpec};
pub use probe::{FfprobeProber, ProbeResult, Prober};
pub use tools::{ToolInfo, Tools};

use std::path::Path;
use std::time::Duration;

/// Probe a media file with `ffprobe` from `PATH`.
///
/// # Errors
///
/// [`Error::ToolNotFound`] or [`Error::ToolFailed`] when ffprobe cannot run
/// or rejects the file; [`Error::Parse`] when its report is not valid JSON.
pub fn probe(path: impl AsRef<Path>) -> Result<ProbeResult> {
    FfprobeProber::default().probe(path.as_ref())
}

/// Duration of a media file, using the narrow ffprobe query.
///
/// # Errors
///
/// As [`probe`], plus [`Error::Unavailable`] when ffprobe reports no
/// duration.
pub fn duration(path: impl AsRef<Path>) -> Result<Duration> {
    FfprobeProber::default().duration(path.as_ref())
}

/// Video geometry as `(width, height)`, `(0, 0)` without video.
pub fn resolution(path: impl AsRef<Path>) -> Result<(u32, u32)> {
    FfprobeProber::default().resolution(path.as_ref())
}

/// Whether the file has an audio stream.
pub fn has_audio(path: impl AsRef<Path>) -> Result<bool> {
    FfprobeProber::default().has_audio(path.as_ref())
}

/// Whether the file has a video stream.
pub fn has_video(path: impl AsRef<Path>) -> Result<bool> {
    FfprobeProber::default().has_video(path.as_ref())
}
