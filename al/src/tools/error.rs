//! Tool error types

use thiserror::Error;

/// Errors raised inside tool handlers
///
/// These never reach the orchestration loop as errors: the registry turns
/// every one of them into a `ToolResult` with status `error`.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Path traversal not allowed: {path}")]
    PathEscape { path: String },

    #[error("{kind} not found: {path}")]
    NotFound { kind: &'static str, path: String },

    #[error("Execution timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("Invalid parameter '{name}': expected {expected}")]
    InvalidType { name: String, expected: String },

    #[error("Unknown action: {action}")]
    UnknownAction { action: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ToolError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "File",
            path: path.into(),
        }
    }

    pub fn dir_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Directory",
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_escape_message_mentions_traversal() {
        let err = ToolError::PathEscape {
            path: "../../etc/passwd".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("traversal"));
        assert!(msg.contains("../../etc/passwd"));
    }

    #[test]
    fn test_timeout_message() {
        let err = ToolError::Timeout { seconds: 30 };
        assert_eq!(err.to_string(), "Execution timed out after 30 seconds");
    }

    #[test]
    fn test_not_found_messages() {
        assert_eq!(ToolError::file_not_found("a.txt").to_string(), "File not found: a.txt");
        assert_eq!(ToolError::dir_not_found("src").to_string(), "Directory not found: src");
    }
}
