//! Video encoder discovery and hardware encoder selection.
//!
//! Encoder names are classified as hardware or software purely by suffix.
//! Selection walks a fixed per-platform preference list and takes the first
//! backend whose encoder ffmpeg advertises, falling back to the software
//! encoder of the codec family. Nothing is cached: every query re-runs
//! `ffmpeg -hide_banner -encoders`.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::command::ToolCommand;
use crate::tools::Tools;
use crate::Result;

/// Name suffixes that mark an encoder as hardware accelerated.
pub const HARDWARE_SUFFIXES: &[&str] = &[
    "_videotoolbox",
    "_nvenc",
    "_qsv",
    "_amf",
    "_vaapi",
    "_v4l2m2m",
    "_omx",
    "_cuvid",
    "_mf",
];

/// Whether an encoder runs on dedicated hardware or in software.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    Hardware,
    Software,
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Hardware => "hardware",
            Self::Software => "software",
        })
    }
}

/// A video encoder as named by ffmpeg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoder {
    /// ffmpeg codec identifier, e.g. `h264_nvenc`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Hardware or software.
    pub kind: EncoderKind,
}

impl Encoder {
    /// Build an encoder, classifying it from its name.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: classify(&name),
            name,
            description: description.into(),
        }
    }

    /// Check if this is a hardware encoder.
    pub fn is_hardware(&self) -> bool {
        self.kind == EncoderKind::Hardware
    }
}

/// Check if an encoder name indicates hardware acceleration.
pub fn is_hardware_encoder(name: &str) -> bool {
    HARDWARE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Classify an encoder name by suffix.
pub fn classify(name: &str) -> EncoderKind {
    if is_hardware_encoder(name) {
        EncoderKind::Hardware
    } else {
        EncoderKind::Software
    }
}

// ============================================================================
// Reference table
// ============================================================================

/// Codec families with a known encoder table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecFamily {
    H264,
    Hevc,
}

impl CodecFamily {
    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Hevc => "hevc",
        }
    }

    /// The known encoder of this family for `backend`.
    pub fn encoder(&self, backend: Backend) -> &'static KnownEncoder {
        match (self, backend) {
            (Self::H264, Backend::VideoToolbox) => &H264_VIDEOTOOLBOX,
            (Self::H264, Backend::Nvenc) => &H264_NVENC,
            (Self::H264, Backend::Qsv) => &H264_QSV,
            (Self::H264, Backend::Amf) => &H264_AMF,
            (Self::H264, Backend::Vaapi) => &H264_VAAPI,
            (Self::H264, Backend::Software) => &LIBX264,
            (Self::Hevc, Backend::VideoToolbox) => &HEVC_VIDEOTOOLBOX,
            (Self::Hevc, Backend::Nvenc) => &HEVC_NVENC,
            (Self::Hevc, Backend::Qsv) => &HEVC_QSV,
            (Self::Hevc, Backend::Amf) => &HEVC_AMF,
            (Self::Hevc, Backend::Vaapi) => &HEVC_VAAPI,
            (Self::Hevc, Backend::Software) => &LIBX265,
        }
    }

    /// The software encoder used when no hardware backend is present.
    pub fn software_fallback(&self) -> &'static KnownEncoder {
        self.encoder(Backend::Software)
    }
}

impl fmt::Display for CodecFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h264" | "avc" | "h.264" => Ok(Self::H264),
            "hevc" | "h265" | "h.265" => Ok(Self::Hevc),
            other => Err(format!("unknown codec family '{other}' (expected h264 or hevc)")),
        }
    }
}

/// Acceleration backends with known encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    VideoToolbox, // macOS
    Nvenc,        // NVIDIA
    Qsv,          // Intel Quick Sync
    Amf,          // AMD
    Vaapi,        // generic Linux
    Software,
}

/// One row of the known encoder table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownEncoder {
    pub family: CodecFamily,
    pub backend: Backend,
    pub name: &'static str,
    pub description: &'static str,
}

impl KnownEncoder {
    /// Hardware unless this is the software backend.
    pub fn kind(&self) -> EncoderKind {
        match self.backend {
            Backend::Software => EncoderKind::Software,
            _ => EncoderKind::Hardware,
        }
    }

    /// Owned [`Encoder`] for this row.
    pub fn to_encoder(&self) -> Encoder {
        Encoder {
            name: self.name.to_string(),
            description: self.description.to_string(),
            kind: self.kind(),
        }
    }
}

const fn known(
    family: CodecFamily,
    backend: Backend,
    name: &'static str,
    description: &'static str,
) -> KnownEncoder {
    KnownEncoder {
        family,
        backend,
        name,
        description,
    }
}

pub const H264_VIDEOTOOLBOX: KnownEncoder = known(
    CodecFamily::H264,
    Backend::VideoToolbox,
    "h264_videotoolbox",
    "Apple VideoToolbox H.264",
);
pub const H264_NVENC: KnownEncoder =
    known(CodecFamily::H264, Backend::Nvenc, "h264_nvenc", "NVIDIA NVENC H.264");
pub const H264_QSV: KnownEncoder =
    known(CodecFamily::H264, Backend::Qsv, "h264_qsv", "Intel QuickSync H.264");
pub const H264_AMF: KnownEncoder =
    known(CodecFamily::H264, Backend::Amf, "h264_amf", "AMD AMF H.264");
pub const H264_VAAPI: KnownEncoder =
    known(CodecFamily::H264, Backend::Vaapi, "h264_vaapi", "VA-API H.264");
pub const LIBX264: KnownEncoder =
    known(CodecFamily::H264, Backend::Software, "libx264", "x264 H.264 (software)");

pub const HEVC_VIDEOTOOLBOX: KnownEncoder = known(
    CodecFamily::Hevc,
    Backend::VideoToolbox,
    "hevc_videotoolbox",
    "Apple VideoToolbox HEVC",
);
pub const HEVC_NVENC: KnownEncoder =
    known(CodecFamily::Hevc, Backend::Nvenc, "hevc_nvenc", "NVIDIA NVENC HEVC");
pub const HEVC_QSV: KnownEncoder =
    known(CodecFamily::Hevc, Backend::Qsv, "hevc_qsv", "Intel QuickSync HEVC");
pub const HEVC_AMF: KnownEncoder =
    known(CodecFamily::Hevc, Backend::Amf, "hevc_amf", "AMD AMF HEVC");
pub const HEVC_VAAPI: KnownEncoder =
    known(CodecFamily::Hevc, Backend::Vaapi, "hevc_vaapi", "VA-API HEVC");
pub const LIBX265: KnownEncoder =
    known(CodecFamily::Hevc, Backend::Software, "libx265", "x265 HEVC (software)");

/// Every known encoder, grouped by family.
pub const KNOWN_ENCODERS: &[KnownEncoder] = &[
    H264_VIDEOTOOLBOX,
    H264_NVENC,
    H264_QSV,
    H264_AMF,
    H264_VAAPI,
    LIBX264,
    HEVC_VIDEOTOOLBOX,
    HEVC_NVENC,
    HEVC_QSV,
    HEVC_AMF,
    HEVC_VAAPI,
    LIBX265,
];

// ============================================================================
// Platform preference
// ============================================================================

/// Host platform families with distinct hardware preference orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Other,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// Hardware backends to try, most preferred first.
    pub fn preference(&self) -> &'static [Backend] {
        match self {
            Self::MacOs => &[Backend::VideoToolbox],
            // NVIDIA first (most common discrete GPU), then Intel, generic, AMD.
            Self::Linux => &[Backend::Nvenc, Backend::Qsv, Backend::Vaapi, Backend::Amf],
            Self::Windows => &[Backend::Nvenc, Backend::Qsv, Backend::Amf],
            Self::Other => &[],
        }
    }
}

/// Pick the best encoder of `family` on `platform`.
///
/// Returns the first preferred backend for which `is_available` confirms the
/// encoder name, otherwise the family's software fallback.
pub fn select_best_encoder(
    family: CodecFamily,
    platform: Platform,
    mut is_available: impl FnMut(&str) -> bool,
) -> Encoder {
    for &backend in platform.preference() {
        let candidate = family.encoder(backend);
        if is_available(candidate.name) {
            tracing::debug!("selected {} encoder {}", family, candidate.name);
            return candidate.to_encoder();
        }
    }

    let fallback = family.software_fallback();
    tracing::debug!(
        "no hardware {} encoder available, using {}",
        family,
        fallback.name
    );
    fallback.to_encoder()
}

// ============================================================================
// ffmpeg -encoders
// ============================================================================

/// Parse `ffmpeg -hide_banner -encoders` output into video encoders.
///
/// Encoder lines look like ` V....D libx264   libx264 H.264 / AVC ...`: a
/// six-character capability column, the name, then a description. Only
/// video rows (capability starting with `V`) are kept; the legend rows
/// (` V..... = Video`) are skipped.
pub fn parse_encoder_list(output: &str) -> Vec<Encoder> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let flags = fields.next()?;
            if flags.len() != 6 || !flags.starts_with('V') {
                return None;
            }
            let name = fields.next()?;
            if name == "=" {
                return None;
            }
            let description = fields.collect::<Vec<_>>().join(" ");
            if description.is_empty() {
                return None;
            }
            Some(Encoder::new(name, description))
        })
        .collect()
}

/// Encoder queries against an ffmpeg binary.
#[derive(Debug, Clone)]
pub struct EncoderProbe {
    ffmpeg_path: PathBuf,
}

impl Default for EncoderProbe {
    fn default() -> Self {
        Self::new(Tools::default().ffmpeg)
    }
}

impl EncoderProbe {
    /// Query the given ffmpeg binary.
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Query the ffmpeg named in `tools`.
    pub fn from_tools(tools: &Tools) -> Self {
        Self::new(tools.ffmpeg.clone())
    }

    /// All video encoders ffmpeg advertises.
    ///
    /// # Errors
    ///
    /// Tool errors when ffmpeg cannot be run.
    pub fn list_encoders(&self) -> Result<Vec<Encoder>> {
        let output = ToolCommand::new(self.ffmpeg_path.clone())
            .args(["-hide_banner", "-encoders"])
            .run()?;
        Ok(parse_encoder_list(&output.stdout))
    }

    /// Whether ffmpeg advertises a video encoder with exactly this name.
    /// A failed listing counts as not available.
    pub fn is_encoder_available(&self, name: &str) -> bool {
        self.available_names().contains(name)
    }

    /// Best encoder of `family` for the current platform.
    pub fn best_encoder(&self, family: CodecFamily) -> Encoder {
        self.best_encoder_on(family, Platform::current())
    }

    /// Best encoder of `family` for an explicit platform.
    pub fn best_encoder_on(&self, family: CodecFamily, platform: Platform) -> Encoder {
        let mut names: Option<HashSet<String>> = None;
        select_best_encoder(family, platform, |name| {
            names
                .get_or_insert_with(|| self.available_names())
                .contains(name)
        })
    }

    /// Best H.264 encoder, falling back to libx264.
    pub fn best_h264_encoder(&self) -> Encoder {
        self.best_encoder(CodecFamily::H264)
    }

    /// Best HEVC encoder, falling back to libx265.
    pub fn best_hevc_encoder(&self) -> Encoder {
        self.best_encoder(CodecFamily::Hevc)
    }

    /// True when the best H.264 encoder is a hardware one.
    pub fn hardware_encoder_available(&self) -> bool {
        self.best_h264_encoder().is_hardware()
    }

    fn available_names(&self) -> HashSet<String> {
        match self.list_encoders() {
            Ok(encoders) => encoders.into_iter().map(|e| e.name).collect(),
            Err(e) => {
                tracing::warn!("could not list encoders: {}", e);
                HashSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODERS_OUTPUT: &str = "\
Encoders:
 V..... = Video
 A..... = Audio
 S..... = Subtitle
 .F.... = Frame-level multithreading
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10 (codec h264)
 V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)
 V....D h264_vaapi           H.264/AVC (VAAPI) (codec h264)
 V....D hevc_qsv             HEVC (Intel Quick Sync Video acceleration) (codec hevc)
 V.S... mpeg4                MPEG-4 part 2
 A....D aac                  AAC (Advanced Audio Coding)
 S..... srt                  SubRip subtitle
";

    #[test]
    fn classifies_by_suffix() {
        for name in [
            "h264_videotoolbox",
            "hevc_nvenc",
            "h264_qsv",
            "hevc_amf",
            "h264_vaapi",
            "h264_v4l2m2m",
            "h264_omx",
            "h264_mf",
        ] {
            assert_eq!(classify(name), EncoderKind::Hardware, "{name}");
        }
        for name in ["libx264", "libx265", "mpeg4", "libsvtav1", "nvenc_h264x"] {
            assert_eq!(classify(name), EncoderKind::Software, "{name}");
        }
    }

    #[test]
    fn parses_video_rows_only() {
        let encoders = parse_encoder_list(ENCODERS_OUTPUT);
        let names: Vec<&str> = encoders.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["libx264", "h264_nvenc", "h264_vaapi", "hevc_qsv", "mpeg4"]
        );
        assert_eq!(encoders[1].description, "NVIDIA NVENC H.264 encoder (codec h264)");
        assert_eq!(encoders[1].kind, EncoderKind::Hardware);
        assert_eq!(encoders[4].description, "MPEG-4 part 2");
        assert!(!encoders[0].is_hardware());
    }

    #[test]
    fn parse_empty_output() {
        assert!(parse_encoder_list("").is_empty());
        assert!(parse_encoder_list(" V....D lonelyname\n").is_empty());
    }

    #[test]
    fn known_table_is_consistent() {
        assert_eq!(KNOWN_ENCODERS.len(), 12);
        for known in KNOWN_ENCODERS {
            assert_eq!(known.kind(), classify(known.name), "{}", known.name);
            assert_eq!(known.family.encoder(known.backend), known);
        }
        assert_eq!(CodecFamily::H264.software_fallback().name, "libx264");
        assert_eq!(CodecFamily::Hevc.software_fallback().name, "libx265");
    }

    #[test]
    fn linux_prefers_nvenc_then_qsv() {
        let best = select_best_encoder(CodecFamily::H264, Platform::Linux, |_| true);
        assert_eq!(best.name, "h264_nvenc");

        let best = select_best_encoder(CodecFamily::Hevc, Platform::Linux, |n| {
            n == "hevc_qsv" || n == "hevc_amf"
        });
        assert_eq!(best.name, "hevc_qsv");
        assert_eq!(best.kind, EncoderKind::Hardware);
    }

    #[test]
    fn linux_vaapi_before_amf() {
        let best = select_best_encoder(CodecFamily::H264, Platform::Linux, |n| {
            n == "h264_amf" || n == "h264_vaapi"
        });
        assert_eq!(best.name, "h264_vaapi");
    }

    #[test]
    fn windows_skips_vaapi() {
        let best = select_best_encoder(CodecFamily::H264, Platform::Windows, |n| {
            n == "h264_vaapi"
        });
        assert_eq!(best.name, "libx264");
        let best = select_best_encoder(CodecFamily::H264, Platform::Windows, |n| {
            n == "h264_amf"
        });
        assert_eq!(best.name, "h264_amf");
    }

    #[test]
    fn macos_uses_videotoolbox() {
        let best = select_best_encoder(CodecFamily::Hevc, Platform::MacOs, |_| true);
        assert_eq!(best.name, "hevc_videotoolbox");
        let best = select_best_encoder(CodecFamily::Hevc, Platform::MacOs, |n| {
            n == "hevc_nvenc"
        });
        assert_eq!(best.name, "libx265");
    }

    #[test]
    fn falls_back_to_software() {
        for platform in [
            Platform::MacOs,
            Platform::Linux,
            Platform::Windows,
            Platform::Other,
        ] {
            let best = select_best_encoder(CodecFamily::H264, platform, |_| false);
            assert_eq!(best, LIBX264.to_encoder());
            assert_eq!(best.kind, EncoderKind::Software);
        }
    }

    #[test]
    fn other_platform_never_queries() {
        let mut calls = 0;
        let best = select_best_encoder(CodecFamily::H264, Platform::Other, |_| {
            calls += 1;
            true
        });
        assert_eq!(best.name, "libx264");
        assert_eq!(calls, 0);
    }

    #[test]
    fn missing_ffmpeg_falls_back() {
        let probe = EncoderProbe::new("nonexistent_ffmpeg_12345");
        assert!(probe.list_encoders().is_err());
        assert!(!probe.is_encoder_available("libx264"));
        assert_eq!(
            probe.best_encoder_on(CodecFamily::Hevc, Platform::Linux).name,
            "libx265"
        );
        assert!(!probe.hardware_encoder_available());
    }

    #[test]
    fn codec_family_from_str() {
        assert_eq!("H264".parse::<CodecFamily>(), Ok(CodecFamily::H264));
        assert_eq!("h265".parse::<CodecFamily>(), Ok(CodecFamily::Hevc));
        assert!("vp9".parse::<CodecFamily>().is_err());
    }
}
