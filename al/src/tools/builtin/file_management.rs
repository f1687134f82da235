//! file_management tool - read, write, list and remove workspace files

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;
use walkdir::WalkDir;

use crate::tools::traits::{optional_bool, optional_str, required_str};
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

/// File operations confined to the session workspace
pub struct FileManagementTool;

impl FileManagementTool {
    async fn run(&self, input: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let action = required_str(input, "action")?;
        debug!(%action, "FileManagementTool::run: called");

        match action {
            "read" => {
                let path = required_str(input, "path")?;
                let full = ctx.resolve(path)?;
                if !full.is_file() {
                    debug!(?full, "FileManagementTool::run: not a regular file");
                    return Err(ToolError::file_not_found(path));
                }
                let content = tokio::fs::read_to_string(&full).await?;
                Ok(ToolResult::success(json!({
                    "size": content.len(),
                    "content": content,
                })))
            }
            "write" => {
                let path = required_str(input, "path")?;
                let content = required_str(input, "content")?;
                let full = ctx.resolve(path)?;
                if full == ctx.root {
                    return Err(ToolError::InvalidArgument("cannot write to the workspace root".to_string()));
                }
                if let Some(parent) = full.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&full, content).await?;
                debug!(?full, bytes = content.len(), "FileManagementTool::run: written");
                Ok(ToolResult::success(json!({
                    "path": ctx.display(&full),
                    "bytes_written": content.len(),
                })))
            }
            "list" => {
                let path = optional_str(input, "path", "");
                let full = ctx.resolve(path)?;
                if !full.is_dir() {
                    return Err(ToolError::dir_not_found(path));
                }

                let mut items: Vec<String> = if optional_bool(input, "recursive", false) {
                    WalkDir::new(&full)
                        .min_depth(1)
                        .into_iter()
                        .filter_map(|e| e.ok())
                        .map(|e| ctx.display(e.path()))
                        .collect()
                } else {
                    let mut names = Vec::new();
                    let mut dir = tokio::fs::read_dir(&full).await?;
                    while let Some(entry) = dir.next_entry().await? {
                        names.push(entry.file_name().to_string_lossy().into_owned());
                    }
                    names
                };
                items.sort();
                debug!(count = items.len(), "FileManagementTool::run: listed");
                Ok(ToolResult::success(json!({ "items": items })))
            }
            "delete" => {
                let path = required_str(input, "path")?;
                let full = ctx.resolve(path)?;
                if full == ctx.root {
                    return Err(ToolError::InvalidArgument(
                        "refusing to delete the session workspace root".to_string(),
                    ));
                }
                let meta = match tokio::fs::symlink_metadata(&full).await {
                    Ok(m) => m,
                    Err(_) => {
                        return Err(ToolError::NotFound {
                            kind: "Path",
                            path: path.to_string(),
                        });
                    }
                };
                if meta.is_dir() {
                    tokio::fs::remove_dir_all(&full).await?;
                } else {
                    tokio::fs::remove_file(&full).await?;
                }
                Ok(ToolResult::success(json!({ "deleted": path })))
            }
            "exists" => {
                let path = optional_str(input, "path", "");
                let full = ctx.resolve(path)?;
                let exists = full.exists();
                let is_file = if exists { Value::Bool(full.is_file()) } else { Value::Null };
                Ok(ToolResult::success(json!({ "exists": exists, "is_file": is_file })))
            }
            "mkdir" => {
                let path = required_str(input, "path")?;
                let full = ctx.resolve(path)?;
                if optional_bool(input, "recursive", true) {
                    tokio::fs::create_dir_all(&full).await?;
                } else if !full.is_dir() {
                    tokio::fs::create_dir(&full).await?;
                }
                Ok(ToolResult::success(json!({ "created": path })))
            }
            other => Err(ToolError::UnknownAction {
                action: other.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Tool for FileManagementTool {
    fn name(&self) -> &'static str {
        "file_management"
    }

    fn description(&self) -> &'static str {
        "Manage files in the session workspace. Actions: read, write, list, delete, exists, mkdir. \
         Paths are relative to the workspace and may not contain '..'."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "description": "One of: read, write, list, delete, exists, mkdir"
                },
                "path": {
                    "type": "string",
                    "description": "Path relative to the session workspace"
                },
                "content": {
                    "type": "string",
                    "description": "File content (write)"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Recurse into subdirectories (list) or create parents (mkdir)"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "FileManagementTool::execute: called");
        self.run(&input, ctx).await.unwrap_or_else(ToolResult::from)
    }
}
