//! External tool locations, version queries and availability checks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::{tool_name, ToolCommand};
use crate::{Error, Result};

/// Locations of the transcoder and prober executables.
///
/// Bare names are looked up on `PATH` when the process is spawned. The
/// struct deserializes with defaults so it can be embedded in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    /// The transcoder (`ffmpeg`).
    pub ffmpeg: PathBuf,
    /// The prober (`ffprobe`).
    pub ffprobe: PathBuf,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl Tools {
    /// Build a tool set from optional configured paths.
    ///
    /// See [`Tools::resolve`] for how each path is chosen.
    pub fn from_paths(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Self {
        Self {
            ffmpeg: Self::resolve("ffmpeg", ffmpeg),
            ffprobe: Self::resolve("ffprobe", ffprobe),
        }
    }

    /// Prefer a configured path that exists, then a `PATH` lookup, then the
    /// bare name (spawning it later reports [`Error::ToolNotFound`]).
    pub fn resolve(name: &str, configured: Option<&Path>) -> PathBuf {
        if let Some(path) = configured {
            if path.exists() {
                return path.to_path_buf();
            }
            tracing::warn!(
                "configured {} path {} does not exist; falling back to PATH",
                name,
                path.display()
            );
        }

        which::which(name).unwrap_or_else(|_| PathBuf::from(name))
    }
}

/// Availability information for a tool, returned by [`check_tools`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool launched and exited successfully.
    pub available: bool,
    /// First line of the version output, if any.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Run `<program> -version` and return the first line, trimmed.
///
/// # Errors
///
/// Launch failures and non-zero exits surface as tool errors; an empty first
/// line is [`Error::Unavailable`].
pub fn version(program: &Path) -> Result<String> {
    let output = ToolCommand::new(program).arg("-version").run()?;
    first_line(&output.stdout)
        .ok_or_else(|| Error::unavailable(tool_name(program), "version", program))
}

/// Version banner of the configured ffmpeg.
pub fn ffmpeg_version(tools: &Tools) -> Result<String> {
    version(&tools.ffmpeg)
}

/// Version banner of the configured ffprobe.
pub fn ffprobe_version(tools: &Tools) -> Result<String> {
    version(&tools.ffprobe)
}

/// True when `<program> -version` launches and exits successfully,
/// regardless of what it prints.
pub fn is_available(program: &Path) -> bool {
    ToolCommand::new(program).arg("-version").run().is_ok()
}

/// True when ffmpeg can be launched.
pub fn ffmpeg_available(tools: &Tools) -> bool {
    is_available(&tools.ffmpeg)
}

/// True when ffprobe can be launched.
pub fn ffprobe_available(tools: &Tools) -> bool {
    is_available(&tools.ffprobe)
}

/// Check that both tools answer a version query.
///
/// # Errors
///
/// Returns the first failure, ffmpeg before ffprobe.
pub fn ensure_available(tools: &Tools) -> Result<()> {
    ffmpeg_version(tools)?;
    ffprobe_version(tools)?;
    Ok(())
}

/// Availability, version and resolved path for both tools.
pub fn check_tools(tools: &Tools) -> Vec<ToolInfo> {
    [&tools.ffmpeg, &tools.ffprobe]
        .into_iter()
        .map(|program| {
            let name = tool_name(program);
            match version(program) {
                Ok(version) => ToolInfo {
                    path: which::which(program).ok(),
                    name,
                    available: true,
                    version: Some(version),
                },
                Err(Error::Unavailable { .. }) => ToolInfo {
                    path: which::which(program).ok(),
                    name,
                    available: true,
                    version: None,
                },
                Err(_) => ToolInfo {
                    name,
                    available: false,
                    version: None,
                    path: None,
                },
            }
        })
        .collect()
}

fn first_line(output: &str) -> Option<String> {
    output
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_trims() {
        let banner = "ffmpeg version 6.1.1 Copyright (c) 2000-2023  \nbuilt with gcc\n";
        assert_eq!(
            first_line(banner).as_deref(),
            Some("ffmpeg version 6.1.1 Copyright (c) 2000-2023")
        );
    }

    #[test]
    fn first_line_empty_is_none() {
        assert_eq!(first_line(""), None);
        assert_eq!(first_line("   \nsecond"), None);
    }

    #[test]
    fn default_tools_use_bare_names() {
        let tools = Tools::default();
        assert_eq!(tools.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(tools.ffprobe, PathBuf::from("ffprobe"));
    }

    #[test]
    fn resolve_prefers_existing_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("ffmpeg-custom");
        std::fs::write(&fake, b"").unwrap();
        assert_eq!(Tools::resolve("ffmpeg", Some(&fake)), fake);
    }

    #[test]
    fn resolve_missing_configured_path_falls_back() {
        let resolved = Tools::resolve(
            "nonexistent_tool_12345",
            Some(Path::new("/nonexistent/dir/tool")),
        );
        assert_eq!(resolved, PathBuf::from("nonexistent_tool_12345"));
    }

    #[test]
    fn tools_deserialize_with_defaults() {
        let tools: Tools = serde_json::from_str(r#"{"ffprobe": "/opt/ff/ffprobe"}"#).unwrap();
        assert_eq!(tools.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(tools.ffprobe, PathBuf::from("/opt/ff/ffprobe"));
    }

    #[test]
    fn missing_tool_is_unavailable() {
        let program = Path::new("nonexistent_tool_12345");
        assert!(!is_available(program));
        assert!(matches!(version(program), Err(Error::ToolNotFound { .. })));
    }

    #[test]
    fn check_tools_reports_both() {
        let tools = Tools {
            ffmpeg: PathBuf::from("nonexistent_ffmpeg_12345"),
            ffprobe: PathBuf::from("nonexistent_ffprobe_12345"),
        };
        let infos = check_tools(&tools);
        assert_eq!(infos.len(), 2);
        assert!(infos.iter().all(|i| !i.available && i.path.is_none()));
        assert!(ensure_available(&tools).is_err());
    }
}
