//! project_scaffold tool - lay down a starter project from a fixed template

use async_trait::async_trait;
use handlebars::Handlebars;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::tools::traits::required_str;
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

const PYTHON_MAIN: &str = include_str!("../../../templates/scaffold/python_main.py.hbs");
const PYTHON_TEST: &str = include_str!("../../../templates/scaffold/python_test.py.hbs");
const FASTAPI_MAIN: &str = include_str!("../../../templates/scaffold/fastapi_main.py.hbs");
const EXPRESS_INDEX: &str = include_str!("../../../templates/scaffold/express_index.js.hbs");
const PYPROJECT: &str = include_str!("../../../templates/scaffold/pyproject.toml.hbs");
const PACKAGE_JSON: &str = include_str!("../../../templates/scaffold/package.json.hbs");
const GITIGNORE_PYTHON: &str = include_str!("../../../templates/scaffold/gitignore_python");
const GITIGNORE_NODE: &str = include_str!("../../../templates/scaffold/gitignore_node");

/// Project layouts the tool knows how to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaffoldTemplate {
    PythonCli,
    PythonApi,
    PythonPackage,
    NodeApi,
}

impl ScaffoldTemplate {
    /// Look up a template by name; anything unrecognized is `python_cli`
    pub fn from_name(name: &str) -> Self {
        match name {
            "python_api" => Self::PythonApi,
            "python_package" => Self::PythonPackage,
            "node_api" => Self::NodeApi,
            "python_cli" => Self::PythonCli,
            other => {
                warn!(template = %other, "ScaffoldTemplate::from_name: unknown template, using python_cli");
                Self::PythonCli
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PythonCli => "python_cli",
            Self::PythonApi => "python_api",
            Self::PythonPackage => "python_package",
            Self::NodeApi => "node_api",
        }
    }

    /// Directories and (path, template source) pairs, relative to the project root
    fn layout(&self, name: &str) -> (Vec<String>, Vec<(String, String)>) {
        let readme = |kind: &str| format!("# {}\n\n{}\n", name, kind);
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        match self {
            Self::PythonCli => (
                owned(&["src", "tests"]),
                vec![
                    ("src/__init__.py".into(), String::new()),
                    ("src/main.py".into(), PYTHON_MAIN.into()),
                    ("tests/__init__.py".into(), String::new()),
                    ("tests/test_main.py".into(), PYTHON_TEST.into()),
                    ("requirements.txt".into(), "# Project dependencies\n".into()),
                    ("README.md".into(), readme("A Python CLI application.")),
                    (".gitignore".into(), GITIGNORE_PYTHON.into()),
                ],
            ),
            Self::PythonApi => (
                owned(&["src", "src/routes", "src/models", "tests"]),
                vec![
                    ("src/__init__.py".into(), String::new()),
                    ("src/main.py".into(), FASTAPI_MAIN.into()),
                    ("src/routes/__init__.py".into(), String::new()),
                    ("src/models/__init__.py".into(), String::new()),
                    ("tests/__init__.py".into(), String::new()),
                    ("requirements.txt".into(), "fastapi\nuvicorn\npydantic\n".into()),
                    ("README.md".into(), readme("A FastAPI REST API.")),
                    (".gitignore".into(), GITIGNORE_PYTHON.into()),
                ],
            ),
            Self::PythonPackage => (
                vec!["src".into(), format!("src/{}", name), "tests".into()],
                vec![
                    (
                        format!("src/{}/__init__.py", name),
                        format!("\"\"\"{} package.\"\"\"\n\n__version__ = \"0.1.0\"\n", name),
                    ),
                    ("tests/__init__.py".into(), String::new()),
                    ("pyproject.toml".into(), PYPROJECT.into()),
                    ("README.md".into(), readme("A Python package.")),
                    (".gitignore".into(), GITIGNORE_PYTHON.into()),
                ],
            ),
            Self::NodeApi => (
                owned(&["src", "src/routes", "src/controllers", "tests"]),
                vec![
                    ("src/index.js".into(), EXPRESS_INDEX.into()),
                    ("src/routes/index.js".into(), "// Routes\nmodule.exports = {};\n".into()),
                    ("src/controllers/index.js".into(), "// Controllers\nmodule.exports = {};\n".into()),
                    ("package.json".into(), PACKAGE_JSON.into()),
                    ("README.md".into(), readme("An Express.js API.")),
                    (".gitignore".into(), GITIGNORE_NODE.into()),
                ],
            ),
        }
    }
}

/// Creates starter projects inside the session workspace
pub struct ProjectScaffoldTool;

impl ProjectScaffoldTool {
    async fn run(&self, input: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let template = ScaffoldTemplate::from_name(required_str(input, "template")?);
        let name = required_str(input, "project_name")?;
        debug!(template = %template.as_str(), %name, "ProjectScaffoldTool::run: called");

        let project_root = ctx.resolve(name)?;
        if project_root == ctx.root {
            return Err(ToolError::InvalidArgument(
                "project_name must name a directory inside the workspace".to_string(),
            ));
        }

        let options = input.get("options").cloned().unwrap_or_else(|| json!({}));
        let data = json!({
            "name": name,
            "python_version": options.get("python_version").and_then(Value::as_str).unwrap_or("3.11"),
        });

        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);

        let (dirs, files) = template.layout(name);
        let mut created = Vec::with_capacity(dirs.len() + files.len());

        for dir in dirs {
            tokio::fs::create_dir_all(project_root.join(&dir)).await?;
            created.push(format!("dir: {}", dir));
        }

        for (rel, source) in files {
            let content = hbs
                .render_template(&source, &data)
                .map_err(|e| ToolError::InvalidArgument(format!("failed to render {}: {}", rel, e)))?;
            let path = project_root.join(&rel);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, content).await?;
            created.push(format!("file: {}", rel));
        }

        debug!(count = created.len(), "ProjectScaffoldTool::run: created");
        Ok(ToolResult::success(json!({
            "project_path": ctx.display(&project_root),
            "template": template.as_str(),
            "created": created,
        })))
    }
}

#[async_trait]
impl Tool for ProjectScaffoldTool {
    fn name(&self) -> &'static str {
        "project_scaffold"
    }

    fn description(&self) -> &'static str {
        "Create a starter project in the session workspace. Templates: python_cli, python_api, \
         python_package, node_api."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "template": {
                    "type": "string",
                    "description": "One of: python_cli, python_api, python_package, node_api"
                },
                "project_name": {
                    "type": "string",
                    "description": "Project directory name, relative to the workspace"
                },
                "options": {
                    "type": "object",
                    "description": "Template options, e.g. {\"python_version\": \"3.12\"}"
                }
            },
            "required": ["template", "project_name"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ProjectScaffoldTool::execute: called");
        self.run(&input, ctx).await.unwrap_or_else(ToolResult::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolStatus;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_python_cli_layout() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        let result = ProjectScaffoldTool
            .execute(json!({"template": "python_cli", "project_name": "json2csv"}), &ctx)
            .await;
        assert_eq!(result.status, ToolStatus::Success);
        assert_eq!(result.get("project_path"), Some(&json!("json2csv")));

        let main = std::fs::read_to_string(temp.path().join("json2csv/src/main.py")).unwrap();
        assert!(main.contains("Main entry point for json2csv."));
        assert!(temp.path().join("json2csv/tests/test_main.py").is_file());
        assert!(temp.path().join("json2csv/.gitignore").is_file());

        let created = result.get("created").unwrap().as_array().unwrap();
        assert!(created.contains(&json!("dir: src")));
        assert!(created.contains(&json!("file: README.md")));
    }

    #[tokio::test]
    async fn test_unknown_template_falls_back() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        let result = ProjectScaffoldTool
            .execute(json!({"template": "rust_cli", "project_name": "demo"}), &ctx)
            .await;
        assert_eq!(result.get("template"), Some(&json!("python_cli")));
        assert!(temp.path().join("demo/src/main.py").is_file());
    }

    #[tokio::test]
    async fn test_python_package_uses_options() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        ProjectScaffoldTool
            .execute(
                json!({"template": "python_package", "project_name": "mylib", "options": {"python_version": "3.12"}}),
                &ctx,
            )
            .await;

        let pyproject = std::fs::read_to_string(temp.path().join("mylib/pyproject.toml")).unwrap();
        assert!(pyproject.contains("name = \"mylib\""));
        assert!(pyproject.contains("requires-python = \">=3.12\""));
        assert!(temp.path().join("mylib/src/mylib/__init__.py").is_file());
    }

    #[tokio::test]
    async fn test_node_api_renders_without_escaping() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        ProjectScaffoldTool
            .execute(json!({"template": "node_api", "project_name": "svc"}), &ctx)
            .await;

        let index = std::fs::read_to_string(temp.path().join("svc/src/index.js")).unwrap();
        assert!(index.contains("res.json({ message: 'Welcome to svc' });"));
        assert!(index.contains("${port}"));
        let package: Value =
            serde_json::from_str(&std::fs::read_to_string(temp.path().join("svc/package.json")).unwrap()).unwrap();
        assert_eq!(package["name"], "svc");
    }

    #[tokio::test]
    async fn test_project_name_traversal_rejected() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        let result = ProjectScaffoldTool
            .execute(json!({"template": "python_cli", "project_name": "../outside"}), &ctx)
            .await;
        assert!(result.is_error());
        assert!(result.message().unwrap().contains("traversal"));
    }
}
