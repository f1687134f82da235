//! LoopEngine - drives one task through model calls and tool dispatch

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::llm::{CompletionRequest, Message, ModelReply, ProviderAdapter};
use crate::prompts::PromptLoader;
use crate::tools::{ToolContext, ToolRegistry, ToolStatus};

use super::LoopConfig;

/// Answer text reported when a run uses up its turns
pub const EXHAUSTED_SENTINEL: &str = "ERROR: Maximum iteration limit reached.";

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model gave a final answer
    Done { text: String, turns: u32 },
    /// The turn limit was reached while the model still wanted tools
    Exhausted { turns: u32 },
}

impl LoopOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    /// Number of turns that executed a tool
    pub fn turns(&self) -> u32 {
        match self {
            Self::Done { turns, .. } | Self::Exhausted { turns } => *turns,
        }
    }

    /// The final answer, or the exhaustion sentinel
    pub fn into_text(self) -> String {
        match self {
            Self::Done { text, .. } => text,
            Self::Exhausted { .. } => EXHAUSTED_SENTINEL.to_string(),
        }
    }
}

/// One executed tool call, kept for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallSummary {
    pub name: String,
    pub status: ToolStatus,
    pub duration_ms: u64,
    /// First characters of the result message, when there is one
    pub message: Option<String>,
}

impl ToolCallSummary {
    /// Maximum length kept from a result message
    pub const MESSAGE_LEN: usize = 200;
}

/// Loop execution engine
///
/// Each turn is one provider call followed by at most one tool dispatch. The
/// engine never looks at which provider it is driving: the adapter hands back
/// the assistant turn to append and builds the tool-result turn.
pub struct LoopEngine {
    config: LoopConfig,
    provider: Arc<dyn ProviderAdapter>,
    registry: ToolRegistry,
    ctx: ToolContext,
    prompts: PromptLoader,
    messages: Vec<Message>,
    turns_taken: u32,
    tool_calls: Vec<ToolCallSummary>,
}

impl LoopEngine {
    /// Create a new loop engine
    pub fn new(
        config: LoopConfig,
        provider: Arc<dyn ProviderAdapter>,
        registry: ToolRegistry,
        ctx: ToolContext,
        prompts: PromptLoader,
    ) -> Self {
        debug!(provider = %provider.name(), max_loops = config.max_loops, root = ?ctx.root, "LoopEngine::new: called");
        Self {
            config,
            provider,
            registry,
            ctx,
            prompts,
            messages: Vec::new(),
            turns_taken: 0,
            tool_calls: Vec::new(),
        }
    }

    /// Run the task until the model answers or the turn limit is reached
    ///
    /// Tool failures are fed back to the model and never end the run. A
    /// provider error (transport, API, bad response) aborts it.
    pub async fn run(&mut self, task: &str, params: &Map<String, Value>) -> eyre::Result<LoopOutcome> {
        let max_loops = self.config.max_loops;
        info!("Starting run (provider: {}, max_loops: {})", self.provider.name(), max_loops);

        let system_prompt = self
            .prompts
            .system_prompt(&self.ctx.root, max_loops, self.config.timeout_seconds)?;
        let seed = self.prompts.task_prompt(task, params, &self.ctx.root)?;
        let tools = self.registry.definitions();

        self.messages = vec![Message::user(seed)];
        self.turns_taken = 0;
        self.tool_calls.clear();

        loop {
            if self.turns_taken >= max_loops {
                warn!("Loop limit reached ({})", max_loops);
                return Ok(LoopOutcome::Exhausted {
                    turns: self.turns_taken,
                });
            }

            let request = CompletionRequest {
                system_prompt: system_prompt.clone(),
                messages: self.messages.clone(),
                tools: tools.clone(),
                max_tokens: self.config.max_tokens,
            };

            debug!(turn = self.turns_taken + 1, "LoopEngine::run: calling provider");
            match self.provider.call(&request).await? {
                ModelReply::Final { text } => {
                    info!("Run complete (tool turns: {})", self.turns_taken);
                    self.messages.push(Message::assistant(text.clone()));
                    return Ok(LoopOutcome::Done {
                        text,
                        turns: self.turns_taken,
                    });
                }
                ModelReply::ToolCall { call, assistant } => {
                    info!("Tool activity [{}/{}]: {}", self.turns_taken + 1, max_loops, call.name);
                    let started = Instant::now();
                    let result = self.registry.dispatch(&call.name, &call.input, &self.ctx).await;
                    let duration_ms = started.elapsed().as_millis() as u64;
                    debug!(name = %call.name, status = ?result.status, duration_ms, "LoopEngine::run: tool finished");

                    self.tool_calls.push(ToolCallSummary {
                        name: call.name.clone(),
                        status: result.status,
                        duration_ms,
                        message: result
                            .message()
                            .map(|m| m.chars().take(ToolCallSummary::MESSAGE_LEN).collect()),
                    });

                    self.messages.push(assistant);
                    self.messages.push(self.provider.tool_result_message(&call, &result));
                    self.turns_taken += 1;
                }
            }
        }
    }

    /// Conversation so far, starting with the seed turn
    pub fn conversation(&self) -> &[Message] {
        &self.messages
    }

    pub fn tool_calls(&self) -> &[ToolCallSummary] {
        &self.tool_calls
    }
}
