//! ToolContext - execution context for tools

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::ToolError;
use super::process::ProcessRunner;
use crate::config::ExecutionConfig;

/// Map a model-supplied relative path onto the session root
///
/// The check is syntactic: any `..` segment is rejected, as is an absolute
/// path. The empty path and `.` name the root itself. Symlinks already inside
/// the root are not followed or inspected.
pub fn resolve_path(root: &Path, relative: &str) -> Result<PathBuf, ToolError> {
    debug!(?root, %relative, "resolve_path: called");
    let mut resolved = root.to_path_buf();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                debug!(%relative, "resolve_path: rejected");
                return Err(ToolError::PathEscape {
                    path: relative.to_string(),
                });
            }
        }
    }

    Ok(resolved)
}

/// Execution context handed to every tool call
///
/// All file and process work for one session is scoped to `root`.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Session workspace root
    pub root: PathBuf,

    /// Session identifier
    pub session_id: String,

    /// Default subprocess timeout
    pub timeout: Duration,

    /// Ceiling for per-call timeout overrides
    pub max_timeout: Duration,

    /// Per-stream cap on captured subprocess output
    pub max_output_chars: usize,

    /// Interpreter used for Python actions
    pub python: String,
}

impl ToolContext {
    /// Create a context with default execution settings
    pub fn new(root: PathBuf, session_id: impl Into<String>) -> Self {
        Self::with_execution(root, session_id, &ExecutionConfig::default())
    }

    /// Create a context using configured execution settings
    pub fn with_execution(root: PathBuf, session_id: impl Into<String>, execution: &ExecutionConfig) -> Self {
        let session_id = session_id.into();
        debug!(?root, %session_id, "ToolContext::with_execution: called");
        Self {
            root,
            session_id,
            timeout: Duration::from_secs(execution.timeout_seconds),
            max_timeout: Duration::from_secs(execution.max_timeout_seconds.max(execution.timeout_seconds)),
            max_output_chars: execution.max_output_chars,
            python: execution.python.clone(),
        }
    }

    /// Resolve a relative path inside the session root
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ToolError> {
        resolve_path(&self.root, relative)
    }

    /// Display form of an absolute path relative to the session root
    pub fn display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }

    /// Timeout for one call, honoring an optional per-call override in seconds
    ///
    /// Overrides are clamped to `max_timeout`.
    pub fn timeout_or(&self, seconds: Option<u64>) -> Duration {
        match seconds {
            Some(s) => Duration::from_secs(s).min(self.max_timeout),
            None => self.timeout,
        }
    }

    pub fn runner(&self) -> ProcessRunner {
        ProcessRunner::new(self.max_output_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_plain_relative_path() {
        let root = Path::new("/ws/session_1");
        assert_eq!(resolve_path(root, "src/main.py").unwrap(), root.join("src/main.py"));
    }

    #[test]
    fn test_resolve_root_aliases() {
        let root = Path::new("/ws/session_1");
        assert_eq!(resolve_path(root, "").unwrap(), root);
        assert_eq!(resolve_path(root, ".").unwrap(), root);
        assert_eq!(resolve_path(root, "./a/./b").unwrap(), root.join("a/b"));
    }

    #[test]
    fn test_resolve_rejects_parent_segments() {
        let root = Path::new("/ws/session_1");
        for bad in ["..", "../x", "../../etc/passwd", "a/../../b", "a/.."] {
            let err = resolve_path(root, bad).unwrap_err();
            assert!(err.to_string().contains("traversal"), "{} -> {}", bad, err);
        }
    }

    #[test]
    fn test_resolve_rejects_absolute_paths() {
        let root = Path::new("/ws/session_1");
        assert!(matches!(
            resolve_path(root, "/etc/passwd"),
            Err(ToolError::PathEscape { .. })
        ));
    }

    #[test]
    fn test_resolve_allows_dotted_names() {
        let root = Path::new("/ws/session_1");
        assert_eq!(resolve_path(root, "...").unwrap(), root.join("..."));
        assert_eq!(resolve_path(root, "a..b/c").unwrap(), root.join("a..b/c"));
    }

    #[test]
    fn test_context_display_and_timeout() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "s1");

        assert_eq!(ctx.display(temp.path()), ".");
        assert_eq!(ctx.display(&temp.path().join("a/b.txt")), "a/b.txt");
        assert_eq!(ctx.timeout_or(Some(2)), Duration::from_secs(2));
        assert_eq!(ctx.timeout_or(None), Duration::from_secs(30));
    }

    #[test]
    fn test_timeout_override_is_clamped() {
        let ctx = ToolContext::new(PathBuf::from("/ws/s1"), "s1");
        assert_eq!(ctx.timeout_or(Some(u64::MAX)), Duration::from_secs(600));
        assert_eq!(ctx.timeout_or(Some(u64::MAX)).saturating_mul(2), Duration::from_secs(1200));

        let execution = ExecutionConfig {
            timeout_seconds: 900,
            max_timeout_seconds: 60,
            ..ExecutionConfig::default()
        };
        let ctx = ToolContext::with_execution(PathBuf::from("/ws/s1"), "s1", &execution);
        assert_eq!(ctx.timeout_or(None), Duration::from_secs(900));
        assert_eq!(ctx.timeout_or(Some(5_000)), Duration::from_secs(900));
    }
}
