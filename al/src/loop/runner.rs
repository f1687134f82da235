//! Session runner - wires configuration, workspace, tools and engine together

use std::path::PathBuf;
use std::sync::Arc;

use eyre::Result;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::config::Config;
use crate::llm::ProviderAdapter;
use crate::prompts::PromptLoader;
use crate::session::{SessionSummary, SessionWorkspace};
use crate::tools::{ToolContext, ToolRegistry, load_tool_definitions};

use super::{LoopConfig, LoopEngine, LoopOutcome, ToolCallSummary};

/// A task and the parameters that go with it
#[derive(Debug, Clone, Default)]
pub struct TaskRequest {
    pub task: String,
    pub params: Map<String, Value>,
}

impl TaskRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Form stored in the session summary
    pub fn to_value(&self) -> Value {
        json!({ "task": self.task, "params": self.params })
    }
}

/// Everything a caller needs after a run
#[derive(Debug)]
pub struct RunReport {
    pub outcome: LoopOutcome,
    pub workspace: SessionWorkspace,
    pub tool_calls: Vec<ToolCallSummary>,
    /// Set when a summary was written
    pub summary_path: Option<PathBuf>,
}

/// Build the tool registry, adding descriptors from the configured schema dir
pub fn build_registry(config: &Config) -> Result<ToolRegistry> {
    let registry = ToolRegistry::standard();
    match &config.workspace.tool_schema_dir {
        Some(dir) => {
            let definitions = load_tool_definitions(dir)?;
            info!("Loaded {} tool descriptors from {}", definitions.len(), dir.display());
            Ok(registry.with_definitions(definitions))
        }
        None => Ok(registry),
    }
}

/// Run one task in a fresh session workspace
///
/// Descriptor and persona loading happen before the workspace is created, so
/// a bad configuration leaves nothing behind. A summary is written only when
/// the model produced an answer and `write_summary` is set.
pub async fn run_task(
    config: &Config,
    provider: Arc<dyn ProviderAdapter>,
    request: &TaskRequest,
    write_summary: bool,
) -> Result<RunReport> {
    debug!(task = %request.task, write_summary, "run_task: called");
    let registry = build_registry(config)?;
    let prompts = PromptLoader::new(config.workspace.persona_file.as_deref())?;
    let max_tokens = config.llm.resolve()?.max_tokens;

    let workspace = SessionWorkspace::create(&config.workspace.workspace_dir)?;
    let ctx = ToolContext::with_execution(workspace.root().to_path_buf(), workspace.session_id(), &config.execution);

    let mut engine = LoopEngine::new(
        LoopConfig::from_config(config, max_tokens),
        provider,
        registry,
        ctx,
        prompts,
    );
    let outcome = engine.run(&request.task, &request.params).await?;
    let tool_calls = engine.tool_calls().to_vec();

    let summary_path = match &outcome {
        LoopOutcome::Done { text, turns } if write_summary => {
            let summary = SessionSummary::new(&workspace, request.to_value(), *turns, text);
            Some(summary.write(&config.workspace.output_dir)?)
        }
        _ => None,
    };

    Ok(RunReport {
        outcome,
        workspace,
        tool_calls,
        summary_path,
    })
}
