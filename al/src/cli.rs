//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// agentloop - tool-using agent runner
#[derive(Parser)]
#[command(
    name = "agentloop",
    about = "Run a task through a model that can read, write and execute inside a sandboxed workspace",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a task to completion in a fresh session workspace
    Run {
        /// Task description
        task: String,

        /// Task parameter as key=value (value parsed as JSON when it can be)
        #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, Value)>,

        /// Provider override (anthropic, gemini)
        #[arg(long)]
        provider: Option<String>,

        /// Maximum tool turns
        #[arg(short, long)]
        max_loops: Option<u32>,

        /// Do not write a session summary
        #[arg(long)]
        no_summary: bool,
    },

    /// List the tools offered to the model
    Tools {
        /// Print full descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,
}

/// Parse a `key=value` task parameter
///
/// The value is read as JSON when it parses (numbers, booleans, arrays,
/// objects), otherwise kept as a plain string.
pub fn parse_param(raw: &str) -> Result<(String, Value), String> {
    debug!(%raw, "parse_param: called");
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Result of checking a required tool
pub struct ToolCheck {
    pub name: &'static str,
    pub available: bool,
    pub version: Option<String>,
}

impl ToolCheck {
    /// Check if a tool is available and get its version
    pub fn check(name: &'static str, version_args: &[&str]) -> Self {
        debug!(name, ?version_args, "ToolCheck::check: called");
        let result = std::process::Command::new(name).args(version_args).output();

        match result {
            Ok(output) if output.status.success() => {
                // Some interpreters print their version on stderr
                let text = if output.stdout.is_empty() {
                    String::from_utf8_lossy(&output.stderr).into_owned()
                } else {
                    String::from_utf8_lossy(&output.stdout).into_owned()
                };
                Self {
                    name,
                    available: true,
                    version: Some(parse_version(&text)),
                }
            }
            _ => {
                debug!(name, "ToolCheck::check: tool not available");
                Self {
                    name,
                    available: false,
                    version: None,
                }
            }
        }
    }
}

/// Parse version from command output (extracts first version-like string)
fn parse_version(output: &str) -> String {
    for word in output.split_whitespace() {
        let word = word.trim_start_matches('v');
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            let version: String = word.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
            if !version.is_empty() {
                return version;
            }
        }
    }
    "unknown".to_string()
}

/// Interpreters the code_execution tool shells out to
pub fn check_required_tools() -> Vec<ToolCheck> {
    debug!("check_required_tools: called");
    vec![
        ToolCheck::check("python3", &["--version"]),
        ToolCheck::check("node", &["--version"]),
    ]
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agentloop")
        .join("logs")
        .join("agentloop.log")
}

/// Generate the after_help text with tool checks and the log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::from("Required Tools:\n");
    for tool in check_required_tools() {
        let icon = if tool.available { "\u{2705}" } else { "\u{274C}" };
        let version = tool.version.as_deref().unwrap_or("not found");
        help.push_str(&format!("  {} {:<10} {}\n", icon, tool.name, version));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}
