//! Fluent builder for ffmpeg argument lists.
//!
//! [`FfmpegCommand`] accumulates options and renders them in a fixed order:
//! global flags, inputs, filters, video options, audio options, output trims,
//! metadata, passthrough arguments and finally the output path. Rendering is
//! pure, so [`FfmpegCommand::build`] can be called any number of times.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::command::{ToolCommand, ToolOutput};
use crate::tools::Tools;
use crate::Result;

/// One input file plus the options that must precede its `-i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSpec {
    path: PathBuf,
    format: Option<String>,
    frame_rate: u32,
    looped: bool,
    duration: f64,
    start_time: f64,
}

impl InputSpec {
    /// An input with no per-input options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Force the demuxer (`-f`).
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Input frame rate (`-framerate`), used with image sequences.
    pub fn frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = fps;
        self
    }

    /// Loop the input (`-loop 1`), used for still images.
    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    /// Read at most this many seconds from the input (`-t`).
    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    /// Seek into the input before reading (`-ss`).
    pub fn start_time(mut self, seconds: f64) -> Self {
        self.start_time = seconds;
        self
    }

    fn push_args(&self, args: &mut Vec<OsString>) {
        if self.looped {
            push(args, "-loop", "1");
        }
        if self.frame_rate > 0 {
            push(args, "-framerate", self.frame_rate.to_string());
        }
        if let Some(format) = &self.format {
            push(args, "-f", format);
        }
        if self.duration > 0.0 {
            push(args, "-t", format_seconds(self.duration));
        }
        if self.start_time > 0.0 {
            push(args, "-ss", format_seconds(self.start_time));
        }
        push(args, "-i", &self.path);
    }
}

/// What to do with one stream type in the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum StreamCodec {
    #[default]
    Unset,
    Copy,
    Encode(String),
}

/// An ffmpeg invocation under construction.
///
/// # Example
///
/// ```
/// use ffkit_av::FfmpegCommand;
///
/// let mut cmd = FfmpegCommand::new();
/// cmd.input("in.mov").video_codec("libx264").crf(23).output("out.mp4");
/// assert_eq!(
///     cmd.build(),
///     ["-y", "-i", "in.mov", "-c:v", "libx264", "-crf", "23", "out.mp4"]
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegCommand {
    program: PathBuf,
    inputs: Vec<InputSpec>,
    output: Option<PathBuf>,
    video: StreamCodec,
    audio: StreamCodec,
    no_video: bool,
    no_audio: bool,
    size: Option<(u32, u32)>,
    fps: u32,
    crf: Option<u32>,
    preset: Option<String>,
    pixel_format: Option<String>,
    video_bitrate: Option<String>,
    audio_bitrate: Option<String>,
    audio_rate: u32,
    channels: u32,
    duration: f64,
    start_time: f64,
    video_filter: Option<String>,
    audio_filter: Option<String>,
    filter_complex: Option<String>,
    metadata: BTreeMap<String, String>,
    extra_args: Vec<OsString>,
    overwrite: bool,
}

impl Default for FfmpegCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            inputs: Vec::new(),
            output: None,
            video: StreamCodec::Unset,
            audio: StreamCodec::Unset,
            no_video: false,
            no_audio: false,
            size: None,
            fps: 0,
            crf: None,
            preset: None,
            pixel_format: None,
            video_bitrate: None,
            audio_bitrate: None,
            audio_rate: 0,
            channels: 0,
            duration: 0.0,
            start_time: 0.0,
            video_filter: None,
            audio_filter: None,
            filter_complex: None,
            metadata: BTreeMap::new(),
            extra_args: Vec::new(),
            overwrite: true,
        }
    }
}

impl FfmpegCommand {
    /// A new command that overwrites its output and runs `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new command that runs the transcoder named in `tools`.
    pub fn with_tools(tools: &Tools) -> Self {
        Self {
            program: tools.ffmpeg.clone(),
            ..Self::default()
        }
    }

    /// Use a specific ffmpeg binary.
    pub fn program(&mut self, program: impl Into<PathBuf>) -> &mut Self {
        self.program = program.into();
        self
    }

    /// Add an input file.
    pub fn input(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.input_spec(InputSpec::new(path))
    }

    /// Add an input file with a forced format.
    pub fn input_with_format(
        &mut self,
        path: impl Into<PathBuf>,
        format: impl Into<String>,
    ) -> &mut Self {
        self.input_spec(InputSpec::new(path).format(format))
    }

    /// Add a still image that loops at the given frame rate.
    pub fn input_image(&mut self, path: impl Into<PathBuf>, frame_rate: u32) -> &mut Self {
        self.input_spec(InputSpec::new(path).looped(true).frame_rate(frame_rate))
    }

    /// Add an input limited to `seconds`.
    pub fn input_with_duration(&mut self, path: impl Into<PathBuf>, seconds: f64) -> &mut Self {
        self.input_spec(InputSpec::new(path).duration(seconds))
    }

    /// Add a fully specified input.
    pub fn input_spec(&mut self, spec: InputSpec) -> &mut Self {
        self.inputs.push(spec);
        self
    }

    /// Set the output path.
    pub fn output(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.output = Some(path.into());
        self
    }

    /// Encode video with the named encoder. Clears [`FfmpegCommand::copy_video`].
    pub fn video_codec(&mut self, codec: impl Into<String>) -> &mut Self {
        self.video = StreamCodec::Encode(codec.into());
        self
    }

    /// Encode audio with the named encoder. Clears [`FfmpegCommand::copy_audio`].
    pub fn audio_codec(&mut self, codec: impl Into<String>) -> &mut Self {
        self.audio = StreamCodec::Encode(codec.into());
        self
    }

    /// Copy the video stream without re-encoding. Clears any video codec.
    pub fn copy_video(&mut self) -> &mut Self {
        self.video = StreamCodec::Copy;
        self
    }

    /// Copy the audio stream without re-encoding. Clears any audio codec.
    pub fn copy_audio(&mut self) -> &mut Self {
        self.audio = StreamCodec::Copy;
        self
    }

    /// Drop the video stream (`-vn`).
    pub fn no_video(&mut self) -> &mut Self {
        self.no_video = true;
        self
    }

    /// Drop the audio stream (`-an`).
    pub fn no_audio(&mut self) -> &mut Self {
        self.no_audio = true;
        self
    }

    /// Output frame size; ignored unless both sides are non-zero.
    pub fn size(&mut self, width: u32, height: u32) -> &mut Self {
        self.size = Some((width, height));
        self
    }

    /// Output frame rate.
    pub fn fps(&mut self, fps: u32) -> &mut Self {
        self.fps = fps;
        self
    }

    /// Constant rate factor (lower is better quality).
    ///
    /// Once set, the value is always rendered, including `0` (lossless for
    /// x264/x265). Leave it unset to let the encoder pick its default.
    pub fn crf(&mut self, crf: u32) -> &mut Self {
        self.crf = Some(crf);
        self
    }

    /// Encoder preset, e.g. `medium`.
    pub fn preset(&mut self, preset: impl Into<String>) -> &mut Self {
        self.preset = Some(preset.into());
        self
    }

    /// Output pixel format, e.g. `yuv420p`.
    pub fn pixel_format(&mut self, format: impl Into<String>) -> &mut Self {
        self.pixel_format = Some(format.into());
        self
    }

    /// Video bitrate, e.g. `5M`.
    pub fn video_bitrate(&mut self, bitrate: impl Into<String>) -> &mut Self {
        self.video_bitrate = Some(bitrate.into());
        self
    }

    /// Audio bitrate, e.g. `128k`.
    pub fn audio_bitrate(&mut self, bitrate: impl Into<String>) -> &mut Self {
        self.audio_bitrate = Some(bitrate.into());
        self
    }

    /// Audio sample rate in Hz.
    pub fn audio_rate(&mut self, rate: u32) -> &mut Self {
        self.audio_rate = rate;
        self
    }

    /// Audio channel count.
    pub fn channels(&mut self, channels: u32) -> &mut Self {
        self.channels = channels;
        self
    }

    /// Limit the output to `seconds`.
    pub fn duration(&mut self, seconds: f64) -> &mut Self {
        self.duration = seconds;
        self
    }

    /// Start output at `seconds` into the input.
    pub fn start_time(&mut self, seconds: f64) -> &mut Self {
        self.start_time = seconds;
        self
    }

    /// Enable or disable `-y`. Enabled by default.
    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    /// Video filter graph (`-vf`).
    pub fn video_filter(&mut self, filter: impl Into<String>) -> &mut Self {
        self.video_filter = Some(filter.into());
        self
    }

    /// Audio filter graph (`-af`).
    pub fn audio_filter(&mut self, filter: impl Into<String>) -> &mut Self {
        self.audio_filter = Some(filter.into());
        self
    }

    /// Complex filter graph (`-filter_complex`).
    pub fn filter_complex(&mut self, filter: impl Into<String>) -> &mut Self {
        self.filter_complex = Some(filter.into());
        self
    }

    /// Set a metadata tag. Setting the same key again replaces the value.
    pub fn metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Append raw arguments just before the output path.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl AsRef<OsStr>>) -> &mut Self {
        self.extra_args
            .extend(iter.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// True when the video stream will be copied.
    pub fn is_copy_video(&self) -> bool {
        self.video == StreamCodec::Copy
    }

    /// True when the audio stream will be copied.
    pub fn is_copy_audio(&self) -> bool {
        self.audio == StreamCodec::Copy
    }

    /// Render the argument list (without the program name).
    ///
    /// Paths are passed through as raw OS strings, so file names that are
    /// not valid UTF-8 reach ffmpeg unchanged.
    pub fn build(&self) -> Vec<OsString> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".into());
        }

        for input in &self.inputs {
            input.push_args(&mut args);
        }

        if let Some(filter) = &self.filter_complex {
            push(&mut args, "-filter_complex", filter);
        }
        if let Some(filter) = &self.video_filter {
            push(&mut args, "-vf", filter);
        }
        if let Some(filter) = &self.audio_filter {
            push(&mut args, "-af", filter);
        }

        // Video
        if self.no_video {
            args.push("-vn".into());
        } else {
            push_codec(&mut args, "-c:v", &self.video);
        }
        if let Some((width, height)) = self.size {
            if width > 0 && height > 0 {
                push(&mut args, "-s", format!("{width}x{height}"));
            }
        }
        if self.fps > 0 {
            push(&mut args, "-r", self.fps.to_string());
        }
        if let Some(crf) = self.crf {
            push(&mut args, "-crf", crf.to_string());
        }
        if let Some(preset) = &self.preset {
            push(&mut args, "-preset", preset);
        }
        if let Some(format) = &self.pixel_format {
            push(&mut args, "-pix_fmt", format);
        }
        if let Some(bitrate) = &self.video_bitrate {
            push(&mut args, "-b:v", bitrate);
        }

        // Audio
        if self.no_audio {
            args.push("-an".into());
        } else {
            push_codec(&mut args, "-c:a", &self.audio);
        }
        if let Some(bitrate) = &self.audio_bitrate {
            push(&mut args, "-b:a", bitrate);
        }
        if self.audio_rate > 0 {
            push(&mut args, "-ar", self.audio_rate.to_string());
        }
        if self.channels > 0 {
            push(&mut args, "-ac", self.channels.to_string());
        }

        // Output trims
        if self.duration > 0.0 {
            push(&mut args, "-t", format_seconds(self.duration));
        }
        if self.start_time > 0.0 {
            push(&mut args, "-ss", format_seconds(self.start_time));
        }

        for (key, value) in &self.metadata {
            push(&mut args, "-metadata", format!("{key}={value}"));
        }

        args.extend(self.extra_args.iter().cloned());

        if let Some(output) = &self.output {
            args.push(output.into());
        }

        args
    }

    /// A [`ToolCommand`] ready to execute this invocation.
    pub fn to_tool_command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.args(self.build());
        cmd
    }

    /// Run ffmpeg to completion.
    ///
    /// # Errors
    ///
    /// [`crate::Error::ToolNotFound`] or [`crate::Error::ToolFailed`] (with
    /// captured stderr) when ffmpeg cannot start or exits non-zero;
    /// [`crate::Error::Cancelled`] when `cancel` fires first.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        self.run_with_output(cancel).await.map(|_| ())
    }

    /// Like [`FfmpegCommand::run`] but returns the captured output.
    pub async fn run_with_output(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        tracing::info!("running {}", self);
        self.to_tool_command().execute(cancel).await
    }

    /// Like [`FfmpegCommand::run`] but kills ffmpeg after `timeout`.
    pub async fn run_with_timeout(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput> {
        tracing::info!("running {} (timeout {:?})", self, timeout);
        let mut cmd = self.to_tool_command();
        cmd.timeout(timeout);
        cmd.execute(cancel).await
    }
}

/// Shell-like rendering for logs: program path, then arguments, quoting any
/// word that contains whitespace or quote characters. Non-UTF-8 bytes are
/// shown lossily here only.
impl fmt::Display for FfmpegCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_word(f, self.program.as_os_str())?;
        for arg in self.build() {
            f.write_str(" ")?;
            write_word(f, &arg)?;
        }
        Ok(())
    }
}

fn write_word(f: &mut fmt::Formatter<'_>, word: &OsStr) -> fmt::Result {
    let word = word.to_string_lossy();
    if needs_quoting(&word) {
        write!(f, "{word:?}")
    } else {
        f.write_str(&word)
    }
}

fn needs_quoting(arg: &str) -> bool {
    arg.contains([' ', '\t', '\n', '"', '\''])
}

fn push(args: &mut Vec<OsString>, flag: &str, value: impl Into<OsString>) {
    args.push(flag.into());
    args.push(value.into());
}

fn push_codec(args: &mut Vec<OsString>, flag: &str, codec: &StreamCodec) {
    match codec {
        StreamCodec::Unset => {}
        StreamCodec::Copy => push(args, flag, "copy"),
        StreamCodec::Encode(name) => push(args, flag, name),
    }
}

/// Seconds as fixed-point text with millisecond precision.
pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.3}")
}
