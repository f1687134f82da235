//! Tool system for agent sessions
//!
//! Tools give the model file system access and command execution inside one
//! session workspace. Each session gets a `ToolContext` rooted at its
//! workspace directory; every path a tool receives goes through
//! [`resolve_path`] and every subprocess through [`ProcessRunner`].

mod context;
mod error;
mod process;
mod registry;
mod schema;
pub(crate) mod traits;

pub mod builtin;

pub use context::{ToolContext, resolve_path};
pub use error::ToolError;
pub use process::{OutputMode, ProcessCommand, ProcessOutput, ProcessRunner, truncate};
pub use registry::ToolRegistry;
pub use schema::{load_tool_definitions, validate_input};
pub use traits::{Tool, ToolResult, ToolStatus};
