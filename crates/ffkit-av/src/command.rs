//! Builder for executing external tool commands.
//!
//! [`ToolCommand::run`] is the blocking path used by probing, encoder
//! listing and version queries. [`ToolCommand::execute`] is the async path
//! used for transcodes: it races the child against a [`CancellationToken`]
//! and an optional timeout, killing the process when either fires.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use ffkit_av::ToolCommand;
///
/// let output = ToolCommand::new("ffprobe")
///     .args(["-v", "quiet", "-print_format", "json"])
///     .arg("-show_format")
///     .arg("/path/to/video.mkv")
///     .run()?;
/// println!("{}", output.stdout);
/// # Ok::<(), ffkit_av::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Option<Duration>,
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut(Duration),
}

impl ToolCommand {
    /// Create a new command for the given program name or path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(s.as_ref().to_os_string());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl AsRef<OsStr>>) -> &mut Self {
        self.args
            .extend(iter.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set the maximum execution time for [`ToolCommand::execute`].
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = Some(d);
        self
    }

    /// Program this command will launch.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Short tool name used in errors and logs (file name of the program).
    pub fn tool_name(&self) -> String {
        tool_name(&self.program)
    }

    /// Run the command to completion, blocking the current thread.
    ///
    /// The timeout is not applied on this path.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program does not exist.
    /// - [`Error::ToolFailed`] if spawning fails for another reason or the
    ///   process exits with a non-zero status (message includes stderr).
    pub fn run(&self) -> Result<ToolOutput> {
        let tool = self.tool_name();
        tracing::debug!(tool = %tool, args = ?self.args, "running tool");

        let output = std::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(&tool, e))?;

        finish(&tool, output.status, &output.stdout, &output.stderr)
    }

    /// Execute the command asynchronously, capturing stdout and stderr.
    ///
    /// Cancelling `cancel` kills the child and yields [`Error::Cancelled`].
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program does not exist.
    /// - [`Error::ToolFailed`] on spawn failure, non-zero exit (message
    ///   includes stderr), or when the timeout expires.
    /// - [`Error::Cancelled`] if the token fires before the process exits.
    /// - [`Error::Io`] if waiting on the running child fails.
    pub async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        let tool = self.tool_name();
        tracing::debug!(tool = %tool, args = ?self.args, "executing tool");

        if cancel.is_cancelled() {
            return Err(Error::cancelled(tool));
        }

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&tool, e))?;

        let stdout_task = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr_task = tokio::spawn(read_pipe(child.stderr.take()));

        let timeout = self.timeout;
        let deadline = async move {
            match timeout {
                Some(d) => {
                    tokio::time::sleep(d).await;
                    d
                }
                None => std::future::pending().await,
            }
        };

        let outcome = tokio::select! {
            waited = child.wait() => Outcome::Exited(waited),
            _ = cancel.cancelled() => Outcome::Cancelled,
            d = deadline => Outcome::TimedOut(d),
        };

        match outcome {
            Outcome::Exited(Ok(status)) => {
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                finish(&tool, status, &stdout, &stderr)
            }
            Outcome::Exited(Err(e)) => {
                stdout_task.abort();
                stderr_task.abort();
                tracing::warn!(tool = %tool, "failed to wait for process: {}", e);
                Err(Error::Io(e))
            }
            Outcome::Cancelled => {
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                tracing::info!(tool = %tool, "process cancelled");
                Err(Error::cancelled(tool))
            }
            Outcome::TimedOut(d) => {
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                tracing::warn!(tool = %tool, "process timed out after {:?}", d);
                Err(Error::tool_failed(tool, format!("timed out after {d:?}")))
            }
        }
    }
}

/// File name of `program`, falling back to the whole path.
pub(crate) fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.to_string_lossy().to_string())
}

fn spawn_error(tool: &str, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        tracing::warn!(tool = %tool, "tool not found");
        Error::tool_not_found(tool)
    } else {
        Error::tool_failed(tool, format!("failed to spawn: {err}"))
    }
}

fn finish(tool: &str, status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Result<ToolOutput> {
    let output = ToolOutput {
        status,
        stdout: String::from_utf8_lossy(stdout).to_string(),
        stderr: String::from_utf8_lossy(stderr).to_string(),
    };

    if !status.success() {
        tracing::warn!(tool = %tool, %status, "tool exited unsuccessfully");
        return Err(Error::tool_failed(
            tool,
            format!("exited with {}: {}", status, output.stderr.trim_end()),
        ));
    }

    Ok(output)
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}
