//! Prompt Loader
//!
//! Loads the persona from a file or falls back to the embedded default.

use std::path::Path;

use eyre::{Context, Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::embedded;

/// Values available to the system template
#[derive(Debug, Clone, Serialize)]
pub struct SystemContext {
    pub persona: String,
    pub workspace: String,
    pub max_loops: u32,
    pub timeout_seconds: u64,
}

/// Values available to the task template
#[derive(Debug, Clone, Serialize)]
pub struct TaskContext {
    pub task: String,
    /// Pretty JSON of the request parameters, empty when there are none
    pub params: String,
    pub workspace: String,
}

impl TaskContext {
    pub fn new(task: &str, params: &Map<String, Value>, workspace: &Path) -> Self {
        let params = if params.is_empty() {
            String::new()
        } else {
            serde_json::to_string_pretty(params).unwrap_or_default()
        };
        Self {
            task: task.to_string(),
            params,
            workspace: workspace.display().to_string(),
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    persona: String,
}

impl PromptLoader {
    /// Create a loader, reading the persona from `persona_file` when given
    pub fn new(persona_file: Option<&Path>) -> Result<Self> {
        debug!(?persona_file, "PromptLoader::new: called");
        let persona = match persona_file {
            Some(path) => {
                info!("Loading persona from {}", path.display());
                std::fs::read_to_string(path).context(format!("Failed to read persona file {}", path.display()))?
            }
            None => embedded::PERSONA.to_string(),
        };
        Ok(Self::with_persona(persona))
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self::with_persona(embedded::PERSONA.to_string())
    }

    fn with_persona(persona: String) -> Self {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs, persona }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        let template = embedded::get_embedded(name).ok_or_else(|| eyre!("Prompt template not found: {}", name))?;
        self.hbs
            .render_template(template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", name, e))
    }

    /// Render the system prompt for a session
    pub fn system_prompt(&self, workspace: &Path, max_loops: u32, timeout_seconds: u64) -> Result<String> {
        debug!(?workspace, "PromptLoader::system_prompt: called");
        let context = SystemContext {
            persona: self.persona.trim_end().to_string(),
            workspace: workspace.display().to_string(),
            max_loops,
            timeout_seconds,
        };
        self.render("system", &context)
    }

    /// Render the opening user turn from the task and its parameters
    pub fn task_prompt(&self, task: &str, params: &Map<String, Value>, workspace: &Path) -> Result<String> {
        debug!(%task, param_count = params.len(), "PromptLoader::task_prompt: called");
        self.render("task", &TaskContext::new(task, params, workspace))
    }
}
