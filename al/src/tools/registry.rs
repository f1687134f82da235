//! ToolRegistry - tool descriptors and dispatch for one session

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use super::builtin::{
    CodeAnalysisTool, CodeExecutionTool, DependencyManagementTool, FileManagementTool, ProjectScaffoldTool,
};
use super::schema::validate_input;
use super::{Tool, ToolContext, ToolError, ToolResult};
use crate::llm::ToolDefinition;

/// Maps tool names to handlers and advertised descriptors
///
/// A name may have a handler, a loaded descriptor, or both. A loaded
/// descriptor overrides the built-in one in what the model sees; a descriptor
/// with no handler behind it answers every call with a `simulated` result.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
    external: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Create a registry with the five built-in tools
    pub fn standard() -> Self {
        debug!("ToolRegistry::standard: called");
        let mut registry = Self::empty();
        registry.add_tool(Box::new(FileManagementTool));
        registry.add_tool(Box::new(CodeExecutionTool));
        registry.add_tool(Box::new(ProjectScaffoldTool));
        registry.add_tool(Box::new(CodeAnalysisTool));
        registry.add_tool(Box::new(DependencyManagementTool));
        registry
    }

    /// Create an empty registry (for testing)
    pub fn empty() -> Self {
        debug!("ToolRegistry::empty: called");
        Self {
            tools: BTreeMap::new(),
            external: BTreeMap::new(),
        }
    }

    /// Add a tool handler
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        debug!(tool_name = %tool.name(), "ToolRegistry::add_tool: called");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Add loaded descriptors, replacing any earlier descriptor of the same name
    pub fn with_definitions(mut self, definitions: Vec<ToolDefinition>) -> Self {
        debug!(count = definitions.len(), "ToolRegistry::with_definitions: called");
        for definition in definitions {
            if !self.tools.contains_key(&definition.name) {
                debug!(name = %definition.name, "ToolRegistry::with_definitions: no handler, calls will be simulated");
            }
            self.external.insert(definition.name.clone(), definition);
        }
        self
    }

    /// Descriptors advertised to the model, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        debug!("ToolRegistry::definitions: called");
        let mut defs: BTreeMap<&str, ToolDefinition> = self
            .tools
            .values()
            .map(|t| {
                (
                    t.name(),
                    ToolDefinition::new(t.name(), t.description(), t.input_schema()),
                )
            })
            .collect();

        for (name, def) in &self.external {
            defs.insert(name.as_str(), def.clone());
        }

        defs.into_values().collect()
    }

    /// Run one tool call
    ///
    /// Never fails: an unknown name, bad input or handler failure all come
    /// back as a result with status `error`.
    pub async fn dispatch(&self, name: &str, input: &Value, ctx: &ToolContext) -> ToolResult {
        debug!(%name, "ToolRegistry::dispatch: called");
        let handler = self.tools.get(name);
        let schema = match (self.external.get(name), handler) {
            (Some(def), _) => def.input_schema.clone(),
            (None, Some(tool)) => tool.input_schema(),
            (None, None) => {
                warn!(%name, "ToolRegistry::dispatch: unknown tool");
                return ToolError::UnknownTool { name: name.to_string() }.into();
            }
        };

        if let Err(e) = validate_input(&schema, input) {
            debug!(%name, error = %e, "ToolRegistry::dispatch: input rejected");
            return e.into();
        }

        match handler {
            Some(tool) => tool.execute(input.clone(), ctx).await,
            None => {
                debug!(%name, "ToolRegistry::dispatch: descriptor only, simulating");
                ToolResult::simulated(format!("Tool '{}' has no local implementation; call simulated", name))
                    .with("tool", name)
                    .with("input", input.clone())
            }
        }
    }

    /// Check if a tool name is callable
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name) || self.external.contains_key(name)
    }

    /// Check if a tool has a local handler rather than only a descriptor
    pub fn has_handler(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Sorted names of every callable tool
    pub fn tool_names(&self) -> Vec<String> {
        self.definitions().into_iter().map(|d| d.name).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
