//! code_execution tool - run Python, shell commands, tests and installs

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::process::{OutputMode, ProcessCommand};
use crate::tools::traits::{optional_str, optional_u64, required_str};
use crate::tools::{Tool, ToolContext, ToolError, ToolResult, ToolStatus};

/// Subprocess execution with the session workspace as working directory
pub struct CodeExecutionTool;

impl CodeExecutionTool {
    async fn run(&self, input: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let action = required_str(input, "action")?;
        let working_dir = ctx.resolve(optional_str(input, "working_dir", ""))?;
        let timeout = ctx.timeout_or(optional_u64(input, "timeout"));
        debug!(%action, ?working_dir, ?timeout, "CodeExecutionTool::run: called");

        let (command, mode, failure, timeout) = match action {
            "run_python" => {
                let code = required_str(input, "code")?;
                let cmd = ProcessCommand::program(&ctx.python, &["-c", code]);
                (cmd, OutputMode::Separate, ToolStatus::Error, timeout)
            }
            "run_shell" => {
                let line = required_str(input, "command")?;
                (ProcessCommand::Shell(line.to_string()), OutputMode::Separate, ToolStatus::Error, timeout)
            }
            "run_tests" => {
                let target = ctx.resolve(optional_str(input, "file_path", "tests"))?;
                let target = target.to_string_lossy().into_owned();
                let cmd = ProcessCommand::program(&ctx.python, &["-m", "pytest", target.as_str(), "-v"]);
                (cmd, OutputMode::Combined, ToolStatus::Failed, timeout)
            }
            "install_deps" => {
                let cmd = ProcessCommand::program(&ctx.python, &["-m", "pip", "install", "-r", "requirements.txt"]);
                (cmd, OutputMode::Combined, ToolStatus::Error, timeout.saturating_mul(2))
            }
            other => {
                return Err(ToolError::UnknownAction {
                    action: other.to_string(),
                });
            }
        };

        let output = ctx.runner().run(&command, &working_dir, timeout).await?;
        debug!(exit_code = ?output.exit_code, "CodeExecutionTool::run: finished");
        Ok(output.into_tool_result(mode, failure))
    }
}

#[async_trait]
impl Tool for CodeExecutionTool {
    fn name(&self) -> &'static str {
        "code_execution"
    }

    fn description(&self) -> &'static str {
        "Execute code in the session workspace. Actions: run_python (code), run_shell (command), \
         run_tests (file_path, default 'tests'), install_deps (requirements.txt)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "description": "One of: run_python, run_shell, run_tests, install_deps"
                },
                "code": {
                    "type": "string",
                    "description": "Python source (run_python)"
                },
                "command": {
                    "type": "string",
                    "description": "Shell command line (run_shell)"
                },
                "file_path": {
                    "type": "string",
                    "description": "Test file or directory relative to the workspace (run_tests)"
                },
                "working_dir": {
                    "type": "string",
                    "description": "Working directory relative to the workspace"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "CodeExecutionTool::execute: called");
        self.run(&input, ctx).await.unwrap_or_else(ToolResult::from)
    }
}
