//! Probe result types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Summary of one media file as reported by ffprobe.
///
/// Only the first video stream and the first audio stream are described;
/// later streams of either type are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Path that was probed.
    pub path: PathBuf,
    /// Total duration, zero when ffprobe did not report one.
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    /// Container format name (e.g. "mov,mp4,m4a,3gp,3g2").
    pub format: String,
    /// Video width in pixels, 0 without video.
    pub width: u32,
    /// Video height in pixels, 0 without video.
    pub height: u32,
    /// Video codec name, `None` without video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    /// Audio codec name, `None` without audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    /// Audio sample rate in Hz, 0 without audio.
    pub sample_rate: u32,
    /// Audio channel count, 0 without audio.
    pub channels: u32,
    /// Overall bitrate in bits per second, 0 when unknown.
    pub bitrate: u64,
    /// Whether a video stream is present.
    pub has_video: bool,
    /// Whether an audio stream is present.
    pub has_audio: bool,
}

impl ProbeResult {
    /// Video geometry as `(width, height)`, `(0, 0)` without video.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Serde helpers to (de)serialize `Duration` as fractional seconds.
mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
