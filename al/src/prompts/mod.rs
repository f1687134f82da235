//! Prompt Template System
//!
//! Renders the system prompt and the opening user turn of a session.
//!
//! The persona comes from the configured persona file when there is one,
//! otherwise from the embedded default. Templates use Handlebars syntax for
//! variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptLoader, SystemContext, TaskContext};
