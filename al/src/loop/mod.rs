//! Orchestration loop
//!
//! A run is: seed the conversation with the task, then alternate model calls
//! and tool dispatch until the model answers or the turn limit is reached.
//! Turns are strictly sequential; nothing runs concurrently within a session.

mod config;
mod engine;
mod runner;

pub use config::LoopConfig;
pub use engine::{EXHAUSTED_SENTINEL, LoopEngine, LoopOutcome, ToolCallSummary};
pub use runner::{RunReport, TaskRequest, build_registry, run_task};
