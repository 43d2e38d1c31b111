//! FFprobe-based media probing.
//!
//! The full probe runs `ffprobe -v quiet -print_format json -show_format
//! -show_streams <path>` and reduces the report to a [`ProbeResult`]. The
//! duration query uses the narrower `-show_entries format=duration` form.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::types::ProbeResult;
use super::Prober;
use crate::command::{tool_name, ToolCommand};
use crate::tools::Tools;
use crate::{Error, Result};

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    /// Path to the ffprobe binary.
    ffprobe_path: PathBuf,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new(Tools::default().ffprobe)
    }
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Create a prober for the ffprobe named in `tools`.
    pub fn from_tools(tools: &Tools) -> Self {
        Self::new(tools.ffprobe.clone())
    }

    fn tool(&self) -> String {
        tool_name(&self.ffprobe_path)
    }
}

impl Prober for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe(&self, path: &Path) -> Result<ProbeResult> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path);

        let output = cmd.run()?;
        parse_report(path, &output.stdout).map_err(|e| match e {
            Error::Parse { message, .. } => Error::parse(self.tool(), message),
            other => other,
        })
    }

    fn duration(&self, path: &Path) -> Result<Duration> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ]);
        cmd.arg(path);

        let output = cmd.run()?;
        parse_duration_output(path, &output.stdout)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    #[allow(dead_code)]
    filename: Option<String>,
    format_name: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Reduce an ffprobe JSON report to a [`ProbeResult`].
///
/// Unparsable or missing duration and bitrate values fall back to zero.
///
/// # Errors
///
/// [`Error::Parse`] when `json` is not a valid report.
pub fn parse_report(path: &Path, json: &str) -> Result<ProbeResult> {
    let report: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::parse("ffprobe", format!("invalid JSON report: {e}")))?;
    Ok(reduce(path, report))
}

fn reduce(path: &Path, report: FfprobeOutput) -> ProbeResult {
    let mut info = ProbeResult {
        path: path.to_path_buf(),
        duration: report
            .format
            .duration
            .as_deref()
            .and_then(parse_seconds)
            .unwrap_or_default(),
        format: report.format.format_name.unwrap_or_default(),
        bitrate: report
            .format
            .bit_rate
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0),
        ..ProbeResult::default()
    };

    for stream in report.streams {
        match stream.codec_type.as_deref() {
            Some("video") if !info.has_video => {
                info.has_video = true;
                info.video_codec = Some(stream.codec_name.unwrap_or_default());
                info.width = stream.width.unwrap_or(0);
                info.height = stream.height.unwrap_or(0);
            }
            Some("audio") if !info.has_audio => {
                info.has_audio = true;
                info.audio_codec = Some(stream.codec_name.unwrap_or_default());
                info.channels = stream.channels.unwrap_or(0);
                info.sample_rate = stream
                    .sample_rate
                    .as_deref()
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(0);
            }
            _ => {}
        }
    }

    info
}

/// Parse the output of the duration-only query.
///
/// # Errors
///
/// [`Error::Unavailable`] for empty or `N/A` output, [`Error::Parse`] for
/// anything that is not a non-negative number of seconds.
pub fn parse_duration_output(path: &Path, output: &str) -> Result<Duration> {
    let text = output.trim();
    if text.is_empty() || text == "N/A" {
        return Err(Error::unavailable("ffprobe", "duration", path));
    }

    parse_seconds(text).ok_or_else(|| {
        Error::parse("ffprobe", format!("invalid duration {text:?} for {}", path.display()))
    })
}

fn parse_seconds(s: &str) -> Option<Duration> {
    let secs = s.trim().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}
