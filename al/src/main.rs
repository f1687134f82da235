//! agentloop - bounded tool-calling agent loop
//!
//! CLI entry point for running tasks and inspecting the tool catalogue.

use std::fs;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use serde_json::Map;
use tracing::{debug, info};

use agentloop::cli::{Cli, Command, generate_after_help, get_log_path};
use agentloop::config::Config;
use agentloop::llm::create_provider;
use agentloop::r#loop::{TaskRequest, build_registry, run_task};
use agentloop::tools::ToolStatus;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Build command with dynamic after_help that shows interpreter checks
    let mut cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.clone().get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("agentloop loaded config: provider={}", config.llm.provider);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Run {
            task,
            params,
            provider,
            max_loops,
            no_summary,
        }) => {
            debug!(%task, ?provider, ?max_loops, no_summary, "main: matched Run command");
            let request = TaskRequest {
                task,
                params: params.into_iter().collect::<Map<_, _>>(),
            };
            cmd_run(&config, request, provider, max_loops, !no_summary).await
        }
        Some(Command::Tools { json }) => {
            debug!(json, "main: matched Tools command");
            cmd_tools(&config, json)
        }
        Some(Command::Config) => {
            debug!("main: matched Config command");
            cmd_config(&config)
        }
        None => {
            debug!("main: no command specified, printing help");
            cmd.print_help()?;
            Ok(())
        }
    }
}

/// Run one task and report the outcome
async fn cmd_run(
    config: &Config,
    request: TaskRequest,
    provider: Option<String>,
    max_loops: Option<u32>,
    write_summary: bool,
) -> Result<()> {
    debug!(task = %request.task, "cmd_run: called");
    let mut config = config.clone();
    if let Some(provider) = provider {
        config.llm.provider = provider;
    }
    if let Some(max_loops) = max_loops {
        config.orchestration.max_loops = max_loops;
    }
    config.validate()?;

    let adapter = create_provider(&config.llm)?;
    println!("{} {}", "Provider:".bold(), adapter.name());

    let report = run_task(&config, adapter, &request, write_summary).await?;
    println!("{} {}", "Workspace:".bold(), report.workspace.root().display());

    for call in &report.tool_calls {
        let status = match call.status {
            ToolStatus::Success => call.status.as_str().green(),
            ToolStatus::Simulated => call.status.as_str().yellow(),
            ToolStatus::Error | ToolStatus::Failed => call.status.as_str().red(),
        };
        println!("  {} {} ({} ms)", status, call.name, call.duration_ms);
    }

    let exhausted = !report.outcome.is_done();
    let turns = report.outcome.turns();
    let text = report.outcome.into_text();

    println!();
    if exhausted {
        println!("{}", text.red().bold());
        eprintln!("Stopped after {} tool turns without a final answer", turns);
        std::process::exit(1);
    }

    println!("{}", text);
    if let Some(path) = &report.summary_path {
        println!();
        println!("{} {}", "Summary:".bold(), path.display());
    }
    Ok(())
}

/// List the tools the model is offered
fn cmd_tools(config: &Config, json: bool) -> Result<()> {
    debug!(json, "cmd_tools: called");
    let registry = build_registry(config)?;
    let definitions = registry.definitions();

    if json {
        let schemas: Vec<_> = definitions.iter().map(|d| d.to_anthropic_schema()).collect();
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    for def in &definitions {
        let kind = if registry.has_handler(&def.name) {
            "local".green()
        } else {
            "simulated".yellow()
        };
        println!("{:<24} {:<10} {}", def.name.bold(), kind, first_line(&def.description));
    }
    Ok(())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// Print the effective configuration as YAML
fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}
