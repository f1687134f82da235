//! dependency_management tool - simulated package bookkeeping

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::traits::required_str;
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

/// Acknowledges dependency changes without installing anything
pub struct DependencyManagementTool;

/// Package names from either `["a", "b"]` or `[{"name": "a"}, ...]`
fn package_names(input: &Value) -> Vec<String> {
    input
        .get("packages")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|p| match p {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(o) => o.get("name").and_then(Value::as_str).map(str::to_string),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

impl DependencyManagementTool {
    async fn run(&self, input: &Value, _ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let action = required_str(input, "action")?;
        let packages = package_names(input);
        debug!(%action, ?packages, "DependencyManagementTool::run: called");

        let message = match action {
            "add" if packages.is_empty() => "No packages given; nothing added".to_string(),
            "add" => format!("Added packages: {}", packages.join(", ")),
            "remove" => format!("Removed packages: {}", packages.join(", ")),
            "list" => "No packages installed yet".to_string(),
            other => format!("Action '{}' simulated", other),
        };

        Ok(ToolResult::simulated(message)
            .with("action", action)
            .with("packages", json!(packages)))
    }
}

#[async_trait]
impl Tool for DependencyManagementTool {
    fn name(&self) -> &'static str {
        "dependency_management"
    }

    fn description(&self) -> &'static str {
        "Record project dependencies (add, remove, list). Changes are simulated; use \
         code_execution install_deps to actually install requirements.txt."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "description": "One of: add, remove, list"
                },
                "packages": {
                    "type": "array",
                    "description": "Package names or objects with a name field"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "DependencyManagementTool::execute: called");
        self.run(&input, ctx).await.unwrap_or_else(ToolResult::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolStatus;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_add_accepts_both_shapes() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        let result = DependencyManagementTool
            .execute(
                json!({"action": "add", "packages": ["requests", {"name": "pytest", "version": "8"}]}),
                &ctx,
            )
            .await;
        assert_eq!(result.status, ToolStatus::Simulated);
        assert_eq!(result.message(), Some("Added packages: requests, pytest"));
        assert_eq!(result.get("packages"), Some(&json!(["requests", "pytest"])));
    }

    #[tokio::test]
    async fn test_other_actions_are_simulated() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        let list = DependencyManagementTool.execute(json!({"action": "list"}), &ctx).await;
        assert_eq!(list.message(), Some("No packages installed yet"));

        let upgrade = DependencyManagementTool.execute(json!({"action": "upgrade"}), &ctx).await;
        assert_eq!(upgrade.status, ToolStatus::Simulated);
        assert_eq!(upgrade.message(), Some("Action 'upgrade' simulated"));
    }
}
