//! Error types for ffkit-av.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving ffmpeg or ffprobe.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The external binary could not be started because it was not found.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// The tool could not be launched, exited non-zero, or timed out.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// The tool ran but its output could not be parsed.
    #[error("failed to parse {tool} output: {message}")]
    Parse { tool: String, message: String },

    /// The tool answered with an empty or placeholder value.
    #[error("{what} not available for {}", path.display())]
    Unavailable {
        tool: String,
        what: String,
        path: PathBuf,
    },

    /// The running process was cancelled by the caller.
    #[error("{tool} was cancelled")]
    Cancelled { tool: String },

    /// Local I/O failure while supervising a running process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a value-unavailable error.
    pub fn unavailable(
        tool: impl Into<String>,
        what: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::Unavailable {
            tool: tool.into(),
            what: what.into(),
            path: path.into(),
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(tool: impl Into<String>) -> Self {
        Self::Cancelled { tool: tool.into() }
    }

    /// True for the "external process failed" family: the binary was
    /// missing, could not be launched, or exited non-zero.
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. } | Self::ToolFailed { .. })
    }

    /// Name of the tool this error originated from, if any.
    pub fn tool(&self) -> Option<&str> {
        match self {
            Self::ToolNotFound { tool }
            | Self::ToolFailed { tool, .. }
            | Self::Parse { tool, .. }
            | Self::Unavailable { tool, .. }
            | Self::Cancelled { tool } => Some(tool),
            Self::Io(_) => None,
        }
    }
}
