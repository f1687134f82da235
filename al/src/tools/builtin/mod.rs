//! Built-in tools available to every session

mod code_analysis;
mod code_execution;
mod dependency_management;
mod file_management;
mod project_scaffold;

pub use code_analysis::CodeAnalysisTool;
pub use code_execution::CodeExecutionTool;
pub use dependency_management::DependencyManagementTool;
pub use file_management::FileManagementTool;
pub use project_scaffold::{ProjectScaffoldTool, ScaffoldTemplate};
