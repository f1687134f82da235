//! agentloop - bounded tool-calling agent loop
//!
//! agentloop hands a natural-language task to a model, lets the model call a
//! small set of local tools inside a per-session sandbox directory, and stops
//! when the model gives a final answer or the turn limit runs out.
//!
//! # Core Concepts
//!
//! - **One workspace per session**: every file path a tool sees is resolved
//!   inside it and traversal is refused
//! - **Bounded turns**: at most `max_loops` tool executions per run
//! - **Provider adapters**: structured tool use (Anthropic) and text-emulated
//!   tool calls (Gemini) behind one trait
//! - **Failures are data**: tool errors go back to the model as results
//!
//! # Modules
//!
//! - [`llm`] - provider adapter trait and the two protocol implementations
//! - [`tools`] - path resolution, subprocess runner, registry and builtin tools
//! - [`r#loop`] - the loop engine and session runner
//! - [`prompts`] - system and task prompt rendering
//! - [`session`] - session workspace and summary
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod prompts;
pub mod session;
pub mod tools;

// Note: 'loop' is a reserved keyword, so we use r#loop
#[path = "loop/mod.rs"]
pub mod r#loop;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use llm::{
    AnthropicClient, CompletionRequest, GeminiClient, LlmError, Message, ModelReply, ProviderAdapter, ToolCall,
    ToolDefinition, create_provider,
};
pub use r#loop::{EXHAUSTED_SENTINEL, LoopConfig, LoopEngine, LoopOutcome, RunReport, TaskRequest, run_task};
pub use prompts::PromptLoader;
pub use session::{SessionSummary, SessionWorkspace};
pub use tools::{Tool, ToolContext, ToolError, ToolRegistry, ToolResult, ToolStatus};
