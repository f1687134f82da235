//! ProcessRunner - bounded subprocess execution

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use super::{ToolError, ToolResult, ToolStatus};

/// What to launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCommand {
    /// A command line interpreted by `sh -c`
    Shell(String),
    /// A program with an argument vector, no shell involved
    Program { program: String, args: Vec<String> },
}

impl ProcessCommand {
    pub fn program(program: impl Into<String>, args: &[&str]) -> Self {
        Self::Program {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn to_command(&self) -> tokio::process::Command {
        match self {
            Self::Shell(line) => {
                let mut cmd = tokio::process::Command::new("sh");
                cmd.arg("-c").arg(line);
                cmd
            }
            Self::Program { program, args } => {
                let mut cmd = tokio::process::Command::new(program);
                cmd.args(args);
                cmd
            }
        }
    }
}

/// How the captured streams are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `stdout` and `stderr` fields
    Separate,
    /// One `output` field with stderr appended
    Combined,
}

/// Captured result of one completed subprocess
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout with stderr appended under a marker when both are present
    pub fn combined(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n\nSTDERR:\n{}", self.stdout, self.stderr)
        }
    }

    /// Convert to a tool result
    ///
    /// Exit code zero is `success`, anything else gets `failure_status`.
    pub fn into_tool_result(self, mode: OutputMode, failure_status: ToolStatus) -> ToolResult {
        let payload = match mode {
            OutputMode::Separate => json!({
                "stdout": self.stdout,
                "stderr": self.stderr,
                "exit_code": self.exit_code,
            }),
            OutputMode::Combined => json!({
                "output": self.combined(),
                "exit_code": self.exit_code,
            }),
        };

        let mut result = ToolResult::success(payload);
        if !self.success() {
            result.status = failure_status;
        }
        result
    }
}

/// Runs subprocesses with a working directory, a timeout and output caps
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    max_output_chars: usize,
}

impl ProcessRunner {
    pub fn new(max_output_chars: usize) -> Self {
        Self { max_output_chars }
    }

    /// Run a command to completion or until the timeout fires
    ///
    /// The child leads its own process group. Once the call returns, every
    /// process left in that group has been sent SIGKILL and the child has been
    /// reaped. On timeout the call returns `ToolError::Timeout`. A missing
    /// program or working directory is an error.
    pub async fn run(
        &self,
        command: &ProcessCommand,
        working_dir: &Path,
        timeout: Duration,
    ) -> Result<ProcessOutput, ToolError> {
        debug!(?command, ?working_dir, ?timeout, "ProcessRunner::run: called");

        if !working_dir.is_dir() {
            debug!("ProcessRunner::run: working directory missing");
            return Err(ToolError::dir_not_found(working_dir.to_string_lossy()));
        }

        let mut cmd = command.to_command();
        cmd.current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn()?;
        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let waited = tokio::time::timeout(timeout, async {
            let (status, out, err) = tokio::join!(child.wait(), read_stream(stdout), read_stream(stderr));
            Ok::<_, std::io::Error>((status?, out?, err?))
        })
        .await;

        // Descendants share the child's group; none may outlive the call
        kill_group(pid);

        let (status, stdout, stderr) = match waited {
            Ok(Ok(collected)) => {
                debug!(status = ?collected.0, "ProcessRunner::run: completed");
                collected
            }
            Ok(Err(e)) => {
                debug!(%e, "ProcessRunner::run: wait failed");
                let _ = child.wait().await;
                return Err(ToolError::Io(e));
            }
            Err(_) => {
                debug!("ProcessRunner::run: timed out");
                let _ = child.wait().await;
                return Err(ToolError::Timeout {
                    seconds: timeout.as_secs(),
                });
            }
        };

        Ok(ProcessOutput {
            stdout: truncate(&String::from_utf8_lossy(&stdout), self.max_output_chars),
            stderr: truncate(&String::from_utf8_lossy(&stderr), self.max_output_chars),
            exit_code: status.code(),
        })
    }
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// SIGKILL every process in the group led by `pid`
#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    // ESRCH just means the group is already empty
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!(pid, %e, "kill_group: nothing signalled");
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

/// Keep at most `max` characters, noting how much was dropped
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => {
            debug!(max, "truncate: output truncated");
            format!("{}...\n[truncated, {} chars total]", &text[..cut], text.chars().count())
        }
    }
}
