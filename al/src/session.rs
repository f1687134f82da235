//! Session workspace and summary
//!
//! Every run gets a fresh directory under the configured workspace dir. When
//! a run finishes with an answer, a small JSON summary is written to the
//! output dir.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Characters of the final answer kept in the summary
pub const PREVIEW_CHARS: usize = 500;

/// Directory that bounds all tool file access for one run
#[derive(Debug, Clone)]
pub struct SessionWorkspace {
    session_id: String,
    root: PathBuf,
}

impl SessionWorkspace {
    /// Create `<base>/session_<id>`, where the id is the local start time
    ///
    /// A numeric suffix keeps two sessions started in the same second apart.
    pub fn create(base: &Path) -> Result<Self> {
        debug!(?base, "SessionWorkspace::create: called");
        std::fs::create_dir_all(base).context(format!("Failed to create workspace dir {}", base.display()))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut session_id = stamp.clone();
        let mut attempt = 1;

        loop {
            let root = base.join(format!("session_{}", session_id));
            match std::fs::create_dir(&root) {
                Ok(()) => {
                    info!("Session workspace: {}", root.display());
                    // Tool paths are joined onto the root; keep it absolute
                    let root = std::fs::canonicalize(&root).unwrap_or(root);
                    return Ok(Self { session_id, root });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(%session_id, "SessionWorkspace::create: id taken, retrying");
                    attempt += 1;
                    session_id = format!("{}_{}", stamp, attempt);
                }
                Err(e) => {
                    return Err(e).context(format!("Failed to create session workspace {}", root.display()));
                }
            }
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Record of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    /// The task and its parameters as submitted
    pub request: serde_json::Value,
    pub workspace: String,
    pub completed_at: DateTime<Utc>,
    /// Turns that executed a tool
    pub tool_calls: u32,
    pub result_preview: String,
}

impl SessionSummary {
    pub fn new(workspace: &SessionWorkspace, request: serde_json::Value, tool_calls: u32, result: &str) -> Self {
        Self {
            session_id: workspace.session_id().to_string(),
            request,
            workspace: workspace.root().display().to_string(),
            completed_at: Utc::now(),
            tool_calls,
            result_preview: result.chars().take(PREVIEW_CHARS).collect(),
        }
    }

    /// Write as pretty JSON to `<output_dir>/session_<id>_summary.json`
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        debug!(?output_dir, session_id = %self.session_id, "SessionSummary::write: called");
        std::fs::create_dir_all(output_dir).context(format!("Failed to create output dir {}", output_dir.display()))?;

        let path = output_dir.join(format!("session_{}_summary.json", self.session_id));
        let json = serde_json::to_string_pretty(self).context("Failed to serialize session summary")?;
        std::fs::write(&path, json).context(format!("Failed to write session summary {}", path.display()))?;

        info!("Session summary written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_workspace() {
        let temp = tempdir().unwrap();
        let ws = SessionWorkspace::create(&temp.path().join("workspace")).unwrap();

        assert!(ws.root().is_dir());
        assert!(ws.root().is_absolute());
        assert_eq!(
            ws.root().file_name().unwrap().to_string_lossy(),
            format!("session_{}", ws.session_id())
        );
    }

    #[test]
    fn test_same_second_sessions_are_distinct() {
        let temp = tempdir().unwrap();
        let a = SessionWorkspace::create(temp.path()).unwrap();
        let b = SessionWorkspace::create(temp.path()).unwrap();
        let c = SessionWorkspace::create(temp.path()).unwrap();

        assert_ne!(a.root(), b.root());
        assert_ne!(b.root(), c.root());
        assert_ne!(a.session_id(), c.session_id());
    }

    #[test]
    fn test_summary_preview_is_truncated() {
        let temp = tempdir().unwrap();
        let ws = SessionWorkspace::create(temp.path()).unwrap();
        let long = "x".repeat(800);

        let summary = SessionSummary::new(&ws, serde_json::json!({"task": "t"}), 2, &long);
        assert_eq!(summary.result_preview.len(), PREVIEW_CHARS);

        let short = SessionSummary::new(&ws, serde_json::json!({"task": "t"}), 0, "done");
        assert_eq!(short.result_preview, "done");
    }

    #[test]
    fn test_summary_write_and_read_back() {
        let temp = tempdir().unwrap();
        let ws = SessionWorkspace::create(&temp.path().join("workspace")).unwrap();
        let summary = SessionSummary::new(&ws, serde_json::json!({"task": "build"}), 3, "All done");

        let path = summary.write(&temp.path().join("output")).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("session_{}_summary.json", ws.session_id())
        );

        let loaded: SessionSummary = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.session_id, ws.session_id());
        assert_eq!(loaded.request["task"], "build");
        assert_eq!(loaded.tool_calls, 3);
        assert_eq!(loaded.result_preview, "All done");
    }
}
