use clap::{Args, Parser, Subcommand, ValueEnum};
use ffkit_av::CodecFamily;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffkit")]
#[command(author, version, about = "Probe, inspect and transcode media with ffmpeg")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the duration of a media file in seconds
    Duration {
        /// File to query
        #[arg(required = true)]
        file: PathBuf,
    },

    /// List the video encoders ffmpeg provides
    Encoders {
        /// Only show hardware encoders
        #[arg(long)]
        hardware: bool,
    },

    /// Show the encoder that would be chosen on this machine
    BestEncoder {
        /// Codec family
        #[arg(long, value_enum, default_value = "h264")]
        codec: Codec,
    },

    /// Check that ffmpeg and ffprobe are available
    CheckTools,

    /// Transcode one or more inputs into an output file
    Transcode(TranscodeArgs),

    /// Display version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Codec {
    H264,
    Hevc,
}

impl From<Codec> for CodecFamily {
    fn from(codec: Codec) -> Self {
        match codec {
            Codec::H264 => CodecFamily::H264,
            Codec::Hevc => CodecFamily::Hevc,
        }
    }
}

#[derive(Args)]
pub struct TranscodeArgs {
    /// Input file (repeatable)
    #[arg(short, long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Video codec, or "auto" for the best available H.264 encoder
    #[arg(long)]
    pub video_codec: Option<String>,

    /// Audio codec
    #[arg(long)]
    pub audio_codec: Option<String>,

    /// Copy the video stream without re-encoding
    #[arg(long, conflicts_with = "video_codec")]
    pub copy_video: bool,

    /// Copy the audio stream without re-encoding
    #[arg(long, conflicts_with = "audio_codec")]
    pub copy_audio: bool,

    /// Drop video
    #[arg(long)]
    pub no_video: bool,

    /// Drop audio
    #[arg(long)]
    pub no_audio: bool,

    /// Output size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Constant rate factor
    #[arg(long)]
    pub crf: Option<u32>,

    /// Encoder preset
    #[arg(long)]
    pub preset: Option<String>,

    /// Pixel format
    #[arg(long)]
    pub pix_fmt: Option<String>,

    /// Video bitrate (e.g. 4M)
    #[arg(long)]
    pub video_bitrate: Option<String>,

    /// Audio bitrate (e.g. 128k)
    #[arg(long)]
    pub audio_bitrate: Option<String>,

    /// Audio sample rate in Hz
    #[arg(long)]
    pub audio_rate: Option<u32>,

    /// Audio channel count
    #[arg(long)]
    pub channels: Option<u32>,

    /// Limit output duration in seconds
    #[arg(short = 't', long)]
    pub duration: Option<f64>,

    /// Start offset in seconds
    #[arg(long)]
    pub start_time: Option<f64>,

    /// Video filter graph
    #[arg(long)]
    pub vf: Option<String>,

    /// Audio filter graph
    #[arg(long)]
    pub af: Option<String>,

    /// Complex filter graph
    #[arg(long)]
    pub filter_complex: Option<String>,

    /// Metadata entry as KEY=VALUE (repeatable)
    #[arg(long = "metadata", value_parser = parse_metadata)]
    pub metadata: Vec<(String, String)>,

    /// Do not overwrite an existing output file
    #[arg(long)]
    pub no_overwrite: bool,

    /// Print the ffmpeg command instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Extra arguments passed to ffmpeg before the output path
    #[arg(last = true)]
    pub extra: Vec<OsString>,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h = h.parse().map_err(|_| format!("invalid height '{h}'"))?;
    Ok((w, h))
}

fn parse_metadata(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parsing() {
        assert_eq!(parse_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_size("640X480"), Ok((640, 480)));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("wide x720").is_err());
    }

    #[test]
    fn metadata_parsing() {
        assert_eq!(
            parse_metadata("title=A = B"),
            Ok(("title".to_string(), "A = B".to_string()))
        );
        assert!(parse_metadata("title").is_err());
    }

    #[test]
    fn transcode_args_parse() {
        let cli = Cli::try_parse_from([
            "ffkit",
            "transcode",
            "-i",
            "a.mov",
            "-i",
            "b.wav",
            "-o",
            "out.mp4",
            "--crf",
            "0",
            "--metadata",
            "title=Demo",
            "--",
            "-shortest",
        ])
        .unwrap();
        let Commands::Transcode(args) = cli.command else {
            panic!("expected transcode");
        };
        assert_eq!(args.inputs, [PathBuf::from("a.mov"), PathBuf::from("b.wav")]);
        assert_eq!(args.output, PathBuf::from("out.mp4"));
        assert_eq!(args.crf, Some(0));
        assert_eq!(args.metadata, [("title".to_string(), "Demo".to_string())]);
        assert_eq!(args.extra, ["-shortest"]);
    }

    #[test]
    fn copy_conflicts_with_codec() {
        assert!(Cli::try_parse_from([
            "ffkit",
            "transcode",
            "-i",
            "a.mov",
            "-o",
            "b.mp4",
            "--copy-video",
            "--video-codec",
            "libx264",
        ])
        .is_err());
    }
}
