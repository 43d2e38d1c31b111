use ffkit_av::Tools;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub transcode: TranscodeConfig,
}

impl Config {
    /// Resolved tool locations for this configuration.
    pub fn tools(&self) -> Tools {
        Tools::from_paths(self.tools.ffmpeg.as_deref(), self.tools.ffprobe.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Path to the ffmpeg binary (looked up on PATH when unset)
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe binary (looked up on PATH when unset)
    #[serde(default)]
    pub ffprobe: Option<PathBuf>,

    /// Kill a transcode that runs longer than this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ToolsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    /// Overwrite existing output files (`-y`)
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            overwrite: default_overwrite(),
        }
    }
}

fn default_overwrite() -> bool {
    true
}
